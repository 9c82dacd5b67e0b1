use crate::store::HttpStore;
use crate::tracker::AttendanceTracker;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub api_base_url: String,
    pub tracker: AttendanceTracker<HttpStore>,
}

impl AppState {
    pub fn new(store: HttpStore) -> Self {
        Self {
            api_base_url: store.base_url().to_string(),
            tracker: AttendanceTracker::new(store),
        }
    }
}
