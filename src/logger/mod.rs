//! Logger module
//!
//! Every line goes to stdout (or the configured log file) prefixed with a
//! `[YYYY-MM-DD HH:MM:SS]` timestamp:
//! - Server lifecycle logging
//! - Access logging
//! - Proxy dispatch and failure logging

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(config.logging.log_file.as_deref())
}

fn write_line(message: &str) {
    match writer::get() {
        Some(w) => w.write_line(message),
        None => println!("{}", writer::stamp(message)),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_line("======================================");
    write_line("CORS relay started");
    write_line(&format!("Listening on: http://{addr}"));
    write_line(&format!("Static root: {}", config.static_files.root));
    write_line(&format!(
        "Default document: /{}",
        config.static_files.default_document
    ));
    write_line(&format!(
        "Proxy endpoint: {} (timeout {}s)",
        config.proxy.path_prefix, config.proxy.timeout_secs
    ));
    if let Some(workers) = config.server.workers {
        write_line(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.log_file {
        write_line(&format!("Log file: {path}"));
    }
    write_line("Press Ctrl+C to stop");
    write_line("======================================");
}

pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_line(&entry.format(format));
}

pub fn log_proxy_request(method: &str, url: &str) {
    write_line(&format!("Proxy request: {method} {url}"));
}

pub fn log_proxy_error(error: &impl std::fmt::Display) {
    write_line(&format!("Proxy request failed: {error}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_line(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_line(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_line(&format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write_line(message);
}

pub fn log_shutdown_started(active: usize) {
    write_line(&format!(
        "[Shutdown] Stopped accepting connections, {active} still active"
    ));
}

pub fn log_shutdown_complete() {
    write_line("[Shutdown] Relay stopped");
}
