use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::period::{catalogue, default_period};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "apiBaseUrl": state.api_base_url,
        }),
    )
}

fn handle_periods_list(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let today = chrono::Local::now().date_naive();
    ok(
        &req.id,
        json!({
            "periods": catalogue(),
            "defaultKey": default_period(today).key(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "periods.list" => Some(handle_periods_list(state, req)),
        _ => None,
    }
}
