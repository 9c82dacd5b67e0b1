use crate::model::{AttendanceSummary, Session};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Severity band for an attendance percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Good,
    Warning,
    Low,
}

/// `round(attended / total * 100)`, or 0 when there were no sessions.
pub fn percentage(attended: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(attended) / f64::from(total) * 100.0).round() as u32
}

/// Thresholds are lower-inclusive and checked from the top down.
pub fn band(percentage: u32) -> Band {
    if percentage >= 90 {
        Band::Good
    } else if percentage >= 70 {
        Band::Warning
    } else {
        Band::Low
    }
}

/// Presence lookup keyed by student, then session.
///
/// A missing student or a missing record both read as absent. This is the
/// source of truth for rendering and toggling, not an audit trail: it cannot
/// tell "never attended" from "not recorded yet".
#[derive(Debug, Clone, Default)]
pub struct AttendanceIndex {
    present: HashMap<String, HashMap<String, bool>>,
}

impl AttendanceIndex {
    pub fn build(summaries: &[AttendanceSummary]) -> Self {
        let mut present: HashMap<String, HashMap<String, bool>> = HashMap::new();
        for summary in summaries {
            let by_session = present.entry(summary.student.id.clone()).or_default();
            for record in &summary.records {
                // First record per (student, session) wins.
                by_session
                    .entry(record.schedule.id().to_string())
                    .or_insert(record.present);
            }
        }
        Self { present }
    }

    pub fn is_present(&self, student_id: &str, session_id: &str) -> bool {
        self.present
            .get(student_id)
            .and_then(|m| m.get(session_id))
            .copied()
            .unwrap_or(false)
    }

    pub fn count_present(&self, student_id: &str, sessions: &[Session]) -> u32 {
        let ids: HashSet<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        ids.into_iter()
            .filter(|id| self.is_present(student_id, id))
            .count() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentTotals {
    pub attended: u32,
    pub total_lessons: u32,
    pub percentage: u32,
    pub band: Band,
}

/// Totals for one student, preferring the backend's counts.
pub fn student_totals(
    summary: &AttendanceSummary,
    index: &AttendanceIndex,
    sessions: &[Session],
) -> StudentTotals {
    let attended = summary
        .attended
        .unwrap_or_else(|| index.count_present(&summary.student.id, sessions));
    let total_lessons = summary.total_lessons.unwrap_or(sessions.len() as u32);
    let pct = percentage(attended, total_lessons);
    StudentTotals {
        attended,
        total_lessons,
        percentage: pct,
        band: band(pct),
    }
}
