// 📝 Progress Logging
// Narrow logging capability injected into the pipeline driver

use chrono::Local;
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What the driver needs from a logger: progress lines and error lines
pub trait ProgressLog {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

// ============================================================================
// FILE LOGGER
// ============================================================================

/// Append-only text log, one timestamped line per message.
///
/// Lines look like `2024-Mar-05-14:02:11 : Stage extract started`.
/// Every message is also forwarded to the `log` facade.
pub struct FileLogger {
    path: PathBuf,
    timestamp_format: String,
}

impl FileLogger {
    pub fn new<P: AsRef<Path>>(path: P, timestamp_format: &str) -> Self {
        FileLogger {
            path: path.as_ref().to_path_buf(),
            timestamp_format: timestamp_format.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) {
        let stamp = Local::now().format(&self.timestamp_format);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{} : {}", stamp, line));

        // A broken log file never stops the run
        if let Err(e) = result {
            log::warn!("Failed to append to log file {}: {}", self.path.display(), e);
        }
    }
}

impl ProgressLog for FileLogger {
    fn info(&self, message: &str) {
        log::info!("{}", message);
        self.append(message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
        self.append(&format!("ERROR {}", message));
    }
}

// ============================================================================
// MEMORY LOGGER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// Collects messages in memory (tests, embedding)
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: RefCell<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(level, _)| *level == LogLevel::Error)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|(_, msg)| msg.contains(needle))
    }
}

impl ProgressLog for MemoryLogger {
    fn info(&self, message: &str) {
        self.lines.borrow_mut().push((LogLevel::Info, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.lines.borrow_mut().push((LogLevel::Error, message.to_string()));
    }
}
