#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

/// Backend state: snapshots keyed by `group|startDate`, plus every write seen.
#[derive(Default)]
pub struct BackendState {
    pub snapshots: HashMap<String, Value>,
    pub fetches: Vec<String>,
    pub writes: Vec<(String, Value)>,
    pub fail_fetches: bool,
    pub fail_writes: bool,
}

type SharedBackend = Arc<Mutex<BackendState>>;

/// In-process schedules API served by axum on 127.0.0.1.
pub struct FakeBackend {
    pub base_url: String,
    pub state: SharedBackend,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    start_date: String,
    #[allow(dead_code)]
    end_date: String,
}

fn backend_router(state: SharedBackend) -> Router {
    Router::new()
        .route("/api/schedules/group/:group_id/attendance", get(fetch_attendance))
        .route("/api/schedules/:session_id/attendance", post(record_attendance))
        .with_state(state)
}

async fn fetch_attendance(
    State(state): State<SharedBackend>,
    Path(group_id): Path<String>,
    Query(range): Query<RangeQuery>,
    uri: Uri,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().expect("lock");
    st.fetches.push(uri.to_string());
    if st.fail_fetches {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "db down" })),
        );
    }
    let data = st
        .snapshots
        .get(&format!("{}|{}", group_id, range.start_date))
        .cloned()
        .unwrap_or_else(|| json!({ "schedules": [], "attendanceByStudent": [] }));
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

async fn record_attendance(
    State(state): State<SharedBackend>,
    Path(session_id): Path<String>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().expect("lock");
    st.writes.push((session_id.clone(), payload.clone()));
    if st.fail_writes {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "read only" })),
        );
    }
    apply_write(&mut st, &session_id, &payload);
    (StatusCode::OK, Json(json!({ "success": true })))
}

impl FakeBackend {
    pub fn start() -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind fake backend");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let addr = listener.local_addr().expect("local addr");
        let state: SharedBackend = Arc::new(Mutex::new(BackendState::default()));
        let app = backend_router(Arc::clone(&state));
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("backend runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app).await.expect("serve fake backend");
            });
        });
        FakeBackend {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn put_snapshot(&self, group_id: &str, start_date: &str, snapshot: Value) {
        self.state
            .lock()
            .expect("lock")
            .snapshots
            .insert(format!("{}|{}", group_id, start_date), snapshot);
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.state.lock().expect("lock").fail_fetches = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().expect("lock").fail_writes = fail;
    }

    pub fn writes(&self) -> Vec<(String, Value)> {
        self.state.lock().expect("lock").writes.clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.state.lock().expect("lock").fetches.clone()
    }
}

fn apply_write(st: &mut BackendState, session_id: &str, payload: &Value) {
    let student_id = payload.get("studentId").and_then(|v| v.as_str()).unwrap_or("");
    let present = payload.get("present").and_then(|v| v.as_bool()).unwrap_or(false);
    for snapshot in st.snapshots.values_mut() {
        let Some(rows) = snapshot
            .get_mut("attendanceByStudent")
            .and_then(|v| v.as_array_mut())
        else {
            continue;
        };
        for row in rows {
            if row["student"]["_id"].as_str() != Some(student_id) {
                continue;
            }
            if row.get("records").and_then(|v| v.as_array()).is_none() {
                row["records"] = json!([]);
            }
            let Some(records) = row["records"].as_array_mut() else {
                continue;
            };
            match records
                .iter()
                .position(|r| r["schedule"]["_id"].as_str() == Some(session_id))
            {
                Some(i) => records[i]["present"] = json!(present),
                None => records.push(json!({ "schedule": { "_id": session_id }, "present": present })),
            }
            let attended = records
                .iter()
                .filter(|r| r["present"].as_bool() == Some(true))
                .count();
            row["attended"] = json!(attended);
        }
    }
}

pub fn spawn_sidecar(base_url: &str) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_attendanced");
    let mut child = Command::new(exe)
        .arg("--api-base-url")
        .arg(base_url)
        .env_remove("ATTENDANCE_API_TOKEN")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendanced");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: Value,
) -> Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: Value,
) -> Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

pub fn error_code(value: &Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

/// Two sessions in September 2025, two students.
pub fn september_snapshot() -> Value {
    json!({
        "schedules": [
            { "_id": "s1", "date": "2025-09-02T00:00:00.000Z", "group": "g1" },
            { "_id": "s2", "date": "2025-09-09T00:00:00.000Z", "group": "g1" }
        ],
        "attendanceByStudent": [
            {
                "student": {
                    "_id": "t1",
                    "firstName": "Jaan",
                    "lastName": "Tamm",
                    "parentEmail": "a,b@x.com"
                },
                "records": [
                    { "schedule": { "_id": "s1", "date": "2025-09-02" }, "present": true }
                ],
                "attended": 1,
                "totalLessons": 2
            },
            {
                "student": {
                    "_id": "t2",
                    "firstName": "Mari",
                    "lastName": "Maasikas",
                    "parent": {
                        "_id": "p1",
                        "firstName": "Kati",
                        "lastName": "Maasikas",
                        "email": "kati@example.ee"
                    }
                },
                "records": [],
                "attended": 0,
                "totalLessons": 2
            }
        ]
    })
}
