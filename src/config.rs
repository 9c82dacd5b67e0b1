use crate::store::HttpStoreConfig;
use clap::Parser;

/// Attendance sidecar: line-delimited JSON requests on stdin, replies on stdout.
#[derive(Debug, Clone, Parser)]
#[command(name = "attendanced", version)]
pub struct Config {
    /// Base URL of the school REST backend.
    #[arg(
        long,
        env = "ATTENDANCE_API_BASE_URL",
        default_value = "http://localhost:5000/api"
    )]
    pub api_base_url: String,

    /// Bearer token forwarded on every backend request.
    #[arg(long, env = "ATTENDANCE_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Client-side request timeout; 0 leaves requests unbounded.
    #[arg(long, env = "ATTENDANCE_REQUEST_TIMEOUT_MS", default_value_t = 0)]
    pub request_timeout_ms: u64,
}

impl Config {
    pub fn store_config(&self) -> HttpStoreConfig {
        HttpStoreConfig {
            base_url: self.api_base_url.clone(),
            token: self.api_token.clone(),
            timeout_ms: self.request_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cfg = Config::try_parse_from([
            "attendanced",
            "--api-base-url",
            "http://127.0.0.1:9/api/",
            "--request-timeout-ms",
            "2500",
        ])
        .expect("parse");
        assert_eq!(cfg.api_base_url, "http://127.0.0.1:9/api/");
        assert_eq!(cfg.request_timeout_ms, 2500);
        assert_eq!(cfg.store_config().timeout_ms, 2500);
    }
}
