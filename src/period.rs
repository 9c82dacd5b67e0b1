use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Selectable reporting months for the school year, key and UI label.
pub const SCHOOL_YEAR_PERIODS: [(&str, &str); 9] = [
    ("2025-09", "September 2025"),
    ("2025-10", "Oktoober 2025"),
    ("2025-11", "November 2025"),
    ("2025-12", "Detsember 2025"),
    ("2026-01", "Jaanuar 2026"),
    ("2026-02", "Veebruar 2026"),
    ("2026-03", "Märts 2026"),
    ("2026-04", "Aprill 2026"),
    ("2026-05", "Mai 2026"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodOption {
    pub key: String,
    pub label: String,
}

/// Inclusive first..last calendar day of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl PeriodKey {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let t = raw.trim();
        let Some((y, m)) = t.split_once('-') else {
            return Err("period must be YYYY-MM".to_string());
        };
        if y.len() != 4 || m.len() != 2 {
            return Err("period must be YYYY-MM".to_string());
        }
        let year = y
            .parse::<i32>()
            .map_err(|_| "period year must be numeric".to_string())?;
        let month = m
            .parse::<u32>()
            .map_err(|_| "period month must be numeric".to_string())?;
        if !(1..=12).contains(&month) {
            return Err("period month must be between 01 and 12".to_string());
        }
        Ok(Self { year, month })
    }

    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (ny, nm) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(ny, nm, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.first_day(),
            end: self.last_day(),
        }
    }

    /// "September 2025" style label written into the CSV month column.
    pub fn month_label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }

    /// Catalogue label, if the key is one of the selectable months.
    pub fn catalogue_label(&self) -> Option<&'static str> {
        let key = self.key();
        SCHOOL_YEAR_PERIODS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| *label)
    }

    pub fn option(&self) -> PeriodOption {
        PeriodOption {
            key: self.key(),
            label: self
                .catalogue_label()
                .map(str::to_string)
                .unwrap_or_else(|| self.month_label()),
        }
    }
}

/// Parses a key and rejects anything outside the school-year catalogue.
pub fn lookup_period(raw: &str) -> Result<PeriodKey, String> {
    let key = PeriodKey::parse(raw)?;
    if key.catalogue_label().is_none() {
        return Err(format!("period {} is not selectable", key.key()));
    }
    Ok(key)
}

pub fn catalogue() -> Vec<PeriodOption> {
    SCHOOL_YEAR_PERIODS
        .iter()
        .map(|(key, label)| PeriodOption {
            key: key.to_string(),
            label: label.to_string(),
        })
        .collect()
}

/// Current month when it is selectable, otherwise the first catalogue month.
pub fn default_period(today: NaiveDate) -> PeriodKey {
    let current = PeriodKey {
        year: today.year(),
        month: today.month(),
    };
    if current.catalogue_label().is_some() {
        return current;
    }
    PeriodKey::parse(SCHOOL_YEAR_PERIODS[0].0).unwrap_or(current)
}
