use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Durable, append-only storage for notable monitor events.
pub trait EventLog {
    /// Append one already formatted line.
    fn append(&mut self, line: &str) -> io::Result<()>;

    /// Timestamp `message` and append it.
    fn log_event(&mut self, message: &str) -> io::Result<()> {
        self.append(&stamp(message))
    }
}

impl<L: EventLog + ?Sized> EventLog for Box<L> {
    fn append(&mut self, line: &str) -> io::Result<()> {
        (**self).append(line)
    }
}

/// Prefix `message` with the local wall-clock time.
pub fn stamp(message: &str) -> String {
    format!("[{}] {}", Local::now().format(TIMESTAMP_FORMAT), message)
}

/// Appends to a text file, creating it on first write.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    path: PathBuf,
}

impl FileEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLog for FileEventLog {
    fn append(&mut self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

/// Keeps lines in memory. Handy for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    pub lines: Vec<String>,
}

impl EventLog for MemoryEventLog {
    fn append(&mut self, line: &str) -> io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}
