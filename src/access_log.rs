//! Apache common log format access logging.
//!
//! One line per completed request:
//!
//! ```text
//! 127.0.0.1:51312 - - [25/Aug/2026:14:03:21 +0200] "GET /index.html HTTP/1.1" 200 12
//! ```
//!
//! The sink is shared by every listener and every request, so the
//! format-and-write step runs under a mutex to keep concurrent lines from
//! interleaving.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use axum::http::{Method, StatusCode, Version};
use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::config::LogTarget;
use crate::error::Result;

/// Serialized access log sink.
pub struct AccessLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl AccessLog {
    /// Access log writing to stdout (the default sink).
    pub fn stdout() -> Self {
        Self::from_writer(std::io::stdout())
    }

    /// Wrap an arbitrary writer.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
        }
    }

    /// Open the configured sink, creating parent directories of file
    /// targets as needed.
    pub fn open(target: &LogTarget) -> Result<Self> {
        match target {
            LogTarget::Stdout => Ok(Self::from_writer(std::io::stdout())),
            LogTarget::Stderr => Ok(Self::from_writer(std::io::stderr())),
            LogTarget::File(path) => Ok(Self::from_writer(open_log_file(path)?)),
        }
    }

    /// Format and write one log line.
    ///
    /// Write failures are ignored: the sink is not recoverable at this
    /// point and a dead access log must not take down request handling.
    pub fn write_entry(&self, entry: &LogEntry) {
        let mut sink = self.sink.lock();
        let _ = writeln!(sink, "{entry}");
        let _ = sink.flush();
    }
}

/// Open a log file in append mode, creating parent directories first.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// One completed request, ready to be logged.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub remote_addr: String,
    pub method: Method,
    pub path: String,
    pub protocol: Version,
    pub status: StatusCode,
    pub bytes: u64,
    pub start_time: DateTime<Local>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // http::Version's Debug form is the wire name ("HTTP/1.1").
        write!(
            f,
            "{} - - [{}] \"{} {} {:?}\" {} {}",
            self.remote_addr,
            self.start_time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.path,
            self.protocol,
            self.status.as_u16(),
            self.bytes,
        )
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::SharedBuf;
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn entry(path: &str, status: StatusCode, bytes: u64) -> LogEntry {
        LogEntry {
            remote_addr: "127.0.0.1:51312".to_string(),
            method: Method::GET,
            path: path.to_string(),
            protocol: Version::HTTP_11,
            status,
            bytes,
            start_time: Local.with_ymd_and_hms(2026, 8, 25, 14, 3, 21).unwrap(),
        }
    }

    #[test]
    fn test_common_log_format() {
        let line = entry("/index.html", StatusCode::OK, 12).to_string();
        assert!(line.starts_with("127.0.0.1:51312 - - [25/Aug/2026:14:03:21 "));
        assert!(line.ends_with("] \"GET /index.html HTTP/1.1\" 200 12"));
    }

    #[test]
    fn test_not_found_line() {
        let line = entry("/missing", StatusCode::NOT_FOUND, 0).to_string();
        assert!(line.contains("\"GET /missing HTTP/1.1\" 404 0"));
    }

    #[test]
    fn test_write_entry_appends_newline() {
        let buf = SharedBuf::default();
        let log = AccessLog::from_writer(buf.clone());
        log.write_entry(&entry("/a", StatusCode::OK, 1));
        log.write_entry(&entry("/b", StatusCode::OK, 2));

        let contents = buf.contents();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn test_concurrent_writes_do_not_interleave() {
        let buf = SharedBuf::default();
        let log = Arc::new(AccessLog::from_writer(buf.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        log.write_entry(&entry(&format!("/t{i}/{j}"), StatusCode::OK, 12));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let contents = buf.contents();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 8 * 50);
        for line in lines {
            // Every line is a complete CLF record.
            assert!(line.starts_with("127.0.0.1:51312 - - ["), "bad line: {line}");
            assert!(line.ends_with(" 200 12"), "bad line: {line}");
        }
    }

    #[test]
    fn test_open_log_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("access.log");
        let log = AccessLog::open(&LogTarget::File(path.clone())).unwrap();
        log.write_entry(&entry("/x", StatusCode::OK, 3));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"GET /x HTTP/1.1\" 200 3"));
    }
}
