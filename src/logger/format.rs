//! Access log format module
//!
//! Supports two formats:
//! - `default`: `remote "METHOD target HTTP/version" status bytes time`
//! - `json`: one JSON object per line

use chrono::Local;
use serde::Serialize;

/// Timestamp layout used on every log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time as `YYYY-MM-DD HH:MM:SS`
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Access log entry containing all request/response information
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    /// Client socket address
    pub remote_addr: String,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request target: path plus query string
    pub target: String,
    /// HTTP version (1.0, 1.1, 2)
    pub http_version: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes, when known
    pub body_bytes: Option<u64>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    pub fn new(remote_addr: String, method: String, target: String) -> Self {
        Self {
            remote_addr,
            method,
            target,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: None,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format.
    /// Unknown format names fall back to `default`.
    pub fn format(&self, format: &str) -> String {
        match format {
            "json" => self.format_json(),
            _ => self.format_default(),
        }
    }

    fn format_default(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;
        format!(
            "{} \"{} {} HTTP/{}\" {} {} {request_time:.3}s",
            self.remote_addr,
            self.method,
            self.target,
            self.http_version,
            self.status,
            self.body_bytes
                .map_or_else(|| "-".to_string(), |b| b.to_string()),
        )
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.format_default())
    }
}
