//! Log writer module
//!
//! Provides thread-safe, timestamped line writing to stdout or a file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use super::format::timestamp;

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Append to file
    File(Mutex<File>),
}

/// Thread-safe log writer
pub struct LogWriter {
    target: LogTarget,
}

impl LogWriter {
    /// Create a new log writer, stdout unless a file path is given
    fn new(log_file: Option<&str>) -> io::Result<Self> {
        let target = match log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stdout,
        };
        Ok(Self { target })
    }

    /// Write one timestamped line
    pub fn write_line(&self, message: &str) {
        write_to_target(&self.target, &stamp(message));
    }
}

/// Prefix every line with the local timestamp
pub fn stamp(message: &str) -> String {
    format!("[{}] {message}", timestamp())
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

fn write_to_target(target: &LogTarget, line: &str) {
    match target {
        LogTarget::Stdout => {
            println!("{line}");
        }
        LogTarget::File(file) => {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{line}");
            }
        }
    }
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if the log file cannot be opened.
pub fn init(log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
