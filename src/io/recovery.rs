use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::warn;

/// Header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- tally recovery log: append-only
     Stored values that could not be read are copied here before tally
     falls back to an empty value and overwrites them.
     View with: tally recovery
     Safe to delete once you have recovered what you need. -->

---
";

/// Why an entry was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A stored value was unreadable and replaced by its default
    Load,
    /// A value could not be written
    Write,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Load => write!(f, "load"),
            RecoveryCategory::Write => write!(f, "write"),
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

/// Path of the recovery log inside a data directory.
pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl RecoveryEntry {
    /// Format this entry as a markdown block for the recovery log.
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} {}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            out.push_str("\n```text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
        out.push_str("\n---\n");
        out
    }
}

/// Append an entry to the log. Failures are logged, never returned.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = log_recovery_inner(data_dir, &entry) {
        warn!(error = %e, "could not write to recovery log");
    }
}

fn log_recovery_inner(data_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(data_dir);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Raw contents of the recovery log, if there is one
pub fn read_recovery_log(data_dir: &Path) -> Option<String> {
    std::fs::read_to_string(recovery_log_path(data_dir)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(description: &str, body: &str) -> RecoveryEntry {
        RecoveryEntry {
            timestamp: "2025-05-01T12:00:00Z".parse().unwrap(),
            category: RecoveryCategory::Load,
            description: description.to_string(),
            fields: vec![("Key".to_string(), "streak".to_string())],
            body: body.to_string(),
        }
    }

    #[test]
    fn entry_markdown() {
        let md = entry("unreadable value replaced", "{not json").to_markdown();
        assert_eq!(
            md,
            "## 2025-05-01T12:00:00Z load: unreadable value replaced\n\n\
             Key: streak\n\n\
             ```text\n{not json\n```\n\n---\n"
        );
    }

    #[test]
    fn log_appends_after_single_header() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), entry("first", "a"));
        log_recovery(tmp.path(), entry("second", "b"));
        let content = read_recovery_log(tmp.path()).unwrap();
        assert_eq!(content.matches("tally recovery log").count(), 1);
        let first = content.find("load: first").unwrap();
        let second = content.find("load: second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn missing_log_reads_as_none() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_log(tmp.path()).is_none());
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");
        atomic_write(&path, b"[1]").unwrap();
        atomic_write(&path, b"[2]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[2]");
    }
}
