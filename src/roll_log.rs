// roll_log.rs
use crate::error::Result;
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One accepted roll: the category path that led to it and the rolled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub path: Vec<String>,
    pub rolled: String,
}

impl LogEntry {
    pub fn render(&self, separator: &str) -> String {
        format!("{} :\n{}\n\n", self.path.join(separator), self.rolled)
    }
}

/// Append-only destination for accepted rolls.
pub trait LogSink {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;

    /// Flushes anything buffered. Called once when the session ends.
    fn close(&mut self) -> Result<()>;
}

pub fn session_header(now: &DateTime<Local>) -> String {
    format!(
        "==================== {} ====================\n\n",
        now.format("%m/%d/%Y %H:%M:%S")
    )
}

/// Appends to `<dir>/YYYY_MM_DD.txt`, one file per day.
pub struct DailyLogFile {
    path: PathBuf,
    separator: String,
    writer: BufWriter<File>,
}

impl DailyLogFile {
    pub fn open(log_dir: &Path, now: DateTime<Local>, separator: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("{}.txt", now.format("%Y_%m_%d")));
        let is_new = !path.is_file();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);
        if is_new {
            writer.write_all(session_header(&now).as_bytes())?;
        }
        tracing::info!(path = %path.display(), is_new, "opened roll log");

        Ok(Self {
            path,
            separator: separator.into(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for DailyLogFile {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        self.writer.write_all(entry.render(&self.separator).as_bytes())?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
