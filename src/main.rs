use attendanced::config::Config;
use attendanced::ipc;
use attendanced::store::HttpStore;
use clap::Parser;
use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // stdout carries IPC replies; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        api_base_url = %config.api_base_url,
        "attendanced starting"
    );

    let mut state = ipc::AppState::new(HttpStore::new(config.store_config()));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => {
                tracing::debug!(id = %req.id, method = %req.method, "request");
                ipc::handle_request(&mut state, req)
            }
            Err(e) => ipc::bad_json(e.to_string()),
        };
        writeln!(stdout, "{}", resp)?;
        stdout.flush()?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
