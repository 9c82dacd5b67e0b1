//! Attendance tracking for school groups.
//!
//! Loads one group's sessions and attendance records for a month from the
//! school backend, derives per-student totals, toggles single presence
//! records, and exports the month as a CSV report. The `attendanced` binary
//! exposes this over a line-delimited JSON protocol on stdin/stdout.

pub mod calc;
pub mod config;
pub mod error;
pub mod export;
pub mod ipc;
pub mod model;
pub mod period;
pub mod store;
pub mod tracker;
pub mod view;
