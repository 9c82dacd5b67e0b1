use crate::error::StoreError;
use crate::model::{AttendanceSnapshot, SnapshotEnvelope};
use crate::period::DateRange;
use serde::Serialize;
use std::time::Duration;

/// The backend that owns sessions and attendance records.
pub trait AttendanceStore {
    /// Sessions plus per-student summaries for one group over `range`.
    fn fetch_period(&self, group_id: &str, range: &DateRange)
        -> Result<AttendanceSnapshot, StoreError>;

    /// Writes a single presence value for (session, student).
    fn set_presence(
        &self,
        session_id: &str,
        student_id: &str,
        present: bool,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_ms: u64,
}

/// REST backend reached with a blocking `reqwest` client.
pub struct HttpStore {
    base_url: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresenceBody<'a> {
    student_id: &'a str,
    present: bool,
}

fn build_http_client(timeout_ms: u64) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(timeout_ms));
    }
    builder.build().unwrap_or_else(|err| {
        tracing::warn!("failed to build HTTP client, using defaults: {err}");
        reqwest::blocking::Client::new()
    })
}

fn transport_error(e: &reqwest::Error) -> StoreError {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    };
    StoreError::Transport {
        kind,
        message: e.to_string(),
    }
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

impl HttpStore {
    pub fn new(config: HttpStoreConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.filter(|t| !t.trim().is_empty()),
            client: build_http_client(config.timeout_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl AttendanceStore for HttpStore {
    fn fetch_period(
        &self,
        group_id: &str,
        range: &DateRange,
    ) -> Result<AttendanceSnapshot, StoreError> {
        let url = format!("{}/schedules/group/{}/attendance", self.base_url, group_id);
        let request = self.authorize(self.client.get(&url).query(&[
            ("startDate", range.start_param()),
            ("endDate", range.end_param()),
        ]));
        let response = request.send().map_err(|e| transport_error(&e))?;
        let response = check_status(response)?;
        let envelope: SnapshotEnvelope = response
            .json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        tracing::debug!(
            group_id,
            start = %range.start,
            end = %range.end,
            sessions = envelope.data.schedules.len(),
            students = envelope.data.attendance_by_student.len(),
            "fetched attendance snapshot"
        );
        Ok(envelope.data)
    }

    fn set_presence(
        &self,
        session_id: &str,
        student_id: &str,
        present: bool,
    ) -> Result<(), StoreError> {
        let url = format!("{}/schedules/{}/attendance", self.base_url, session_id);
        let body = PresenceBody {
            student_id,
            present,
        };
        let response = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .map_err(|e| transport_error(&e))?;
        check_status(response)?;
        Ok(())
    }
}
