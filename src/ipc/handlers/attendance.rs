use crate::error::TrackerError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::period::{default_period, lookup_period};
use serde_json::json;
use std::path::PathBuf;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    /// Fetch and write failures carry the unchanged view so the UI can keep
    /// showing it under an error banner.
    fn from_tracker(error: TrackerError, state: &AppState) -> Self {
        let details = match error {
            TrackerError::FetchFailure(_) | TrackerError::MutationFailure(_) => {
                Some(json!({ "view": state.tracker.render() }))
            }
            _ => None,
        };
        HandlerErr {
            code: error.code(),
            message: error.to_string(),
            details,
        }
    }
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

fn get_required_bool(params: &serde_json::Value, key: &str) -> Result<bool, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

fn view_json(state: &AppState) -> serde_json::Value {
    json!(state.tracker.render())
}

fn attendance_open(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let group_id = get_required_str(params, "groupId")?;
    let period = match params.get("period") {
        None | Some(serde_json::Value::Null) => default_period(chrono::Local::now().date_naive()),
        Some(serde_json::Value::String(raw)) => lookup_period(raw).map_err(|message| HandlerErr {
            code: "unknown_period",
            message,
            details: None,
        })?,
        Some(_) => return Err(HandlerErr::bad_params("period must be a YYYY-MM string")),
    };
    state
        .tracker
        .open(&group_id, period)
        .map_err(|e| HandlerErr::from_tracker(e, state))?;
    Ok(view_json(state))
}

fn attendance_select_period(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let period = get_required_str(params, "period")?;
    state
        .tracker
        .select_period(&period)
        .map_err(|e| HandlerErr::from_tracker(e, state))?;
    Ok(view_json(state))
}

fn attendance_refresh(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    state
        .tracker
        .refresh()
        .map_err(|e| HandlerErr::from_tracker(e, state))?;
    Ok(view_json(state))
}

fn attendance_toggle(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session_id = get_required_str(params, "sessionId")?;
    let student_id = get_required_str(params, "studentId")?;
    let current = get_required_bool(params, "currentPresence")?;
    state
        .tracker
        .commit_toggle_and_resync(&session_id, &student_id, current)
        .map_err(|e| HandlerErr::from_tracker(e, state))?;
    Ok(view_json(state))
}

fn attendance_export_csv(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let out_dir = PathBuf::from(get_required_str(params, "outDir")?);
    let summary = state
        .tracker
        .export_csv(&out_dir)
        .map_err(|e| HandlerErr::from_tracker(e, state))?;
    Ok(match summary {
        Some(s) => json!({
            "exported": true,
            "path": s.path.to_string_lossy(),
            "fileName": s.file_name,
            "rowCount": s.row_count,
        }),
        None => json!({ "exported": false }),
    })
}

fn require_group(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    if state.tracker.view().selection().is_some() {
        return None;
    }
    Some(err(&req.id, "no_group", "open a group first", None))
}

fn handle_attendance_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    match attendance_open(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_select_period(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = require_group(state, req) {
        return resp;
    }
    match attendance_select_period(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_refresh(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = require_group(state, req) {
        return resp;
    }
    match attendance_refresh(state) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = require_group(state, req) {
        return resp;
    }
    ok(&req.id, view_json(state))
}

fn handle_attendance_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = require_group(state, req) {
        return resp;
    }
    match attendance_toggle(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = require_group(state, req) {
        return resp;
    }
    match attendance_export_csv(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.open" => Some(handle_attendance_open(state, req)),
        "attendance.selectPeriod" => Some(handle_attendance_select_period(state, req)),
        "attendance.refresh" => Some(handle_attendance_refresh(state, req)),
        "attendance.view" => Some(handle_attendance_view(state, req)),
        "attendance.toggle" => Some(handle_attendance_toggle(state, req)),
        "attendance.exportCsv" => Some(handle_attendance_export_csv(state, req)),
        _ => None,
    }
}
