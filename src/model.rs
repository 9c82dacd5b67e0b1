use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One scheduled class meeting. The backend calls these "schedules".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(deserialize_with = "calendar_day")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub parent_email: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default, deserialize_with = "linked_parent")]
    pub parent: Option<Parent>,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A record's session reference: populated object or bare id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionRef {
    Populated {
        #[serde(rename = "_id")]
        id: String,
    },
    Id(String),
}

impl SessionRef {
    pub fn id(&self) -> &str {
        match self {
            SessionRef::Populated { id } => id,
            SessionRef::Id(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub schedule: SessionRef,
    #[serde(default, deserialize_with = "null_as_absent")]
    pub present: bool,
}

/// Per-student aggregate over the queried range, as the backend reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub student: Student,
    #[serde(default)]
    pub records: Vec<AttendanceRecord>,
    #[serde(default)]
    pub attended: Option<u32>,
    #[serde(default)]
    pub total_lessons: Option<u32>,
}

/// Sessions and per-student summaries for one group and one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSnapshot {
    #[serde(default)]
    pub schedules: Vec<Session>,
    #[serde(default)]
    pub attendance_by_student: Vec<AttendanceSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotEnvelope {
    pub data: AttendanceSnapshot,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParentRef {
    Populated(Parent),
    Id(String),
}

/// An unpopulated parent arrives as a bare id and carries no contact details.
fn linked_parent<'de, D>(deserializer: D) -> Result<Option<Parent>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ParentRef>::deserialize(deserializer)? {
        Some(ParentRef::Populated(parent)) => Some(parent),
        Some(ParentRef::Id(id)) => Some(Parent {
            id: Some(id),
            ..Parent::default()
        }),
        None => None,
    })
}

fn null_as_absent<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Accepts `YYYY-MM-DD` or any ISO-8601 timestamp and keeps the calendar day.
fn calendar_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_day(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad date: {raw}")))
}

pub fn parse_calendar_day(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    let day = t.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
