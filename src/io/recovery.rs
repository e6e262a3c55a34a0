//! Append-only log of inbox text removed by processing.
//!
//! Every removed line or note is written here as soon as its removal is
//! saved, before the batch moves on to the next item.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tempfile::NamedTempFile;

const FILE_HEADER: &str = "\
<!-- gtd recovery log: append-only copy of removed inbox items
     View with: gtd recovery
     Safe to delete once you no longer need the removed text. -->

---
";

/// Separates the timestamp from the rest of an entry header
const HEADER_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// An inbox line or note was removed
    Delete,
    /// A file was replaced; its previous content is kept here
    Write,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Delete => write!(f, "delete"),
            RecoveryCategory::Write => write!(f, "write"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "delete" => Some(RecoveryCategory::Delete),
            "write" => Some(RecoveryCategory::Write),
            _ => None,
        }
    }
}

/// A single entry in the recovery log
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

impl RecoveryEntry {
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {}{}{}: {}\n\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            HEADER_SEPARATOR,
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

pub fn recovery_log_path(gtd_dir: &Path) -> PathBuf {
    gtd_dir.join(".recovery.log")
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

/// Append an entry. Failures are reported on stderr and otherwise ignored.
pub fn log_recovery(gtd_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(gtd_dir, &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(gtd_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(gtd_dir);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Record a removed inbox item
pub fn log_removed_item(gtd_dir: &Path, source: &str, location: Option<usize>, text: &str) {
    let mut fields = vec![("Source".to_string(), source.to_string())];
    if let Some(line) = location {
        fields.push(("Line".to_string(), line.to_string()));
    }
    log_recovery(
        gtd_dir,
        RecoveryEntry {
            timestamp: Utc::now(),
            category: RecoveryCategory::Delete,
            description: match location {
                Some(_) => "inbox line removed".to_string(),
                None => "inbox note removed".to_string(),
            },
            fields,
            body: text.to_string(),
        },
    );
}

/// Read entries, most recent first
pub fn read_recovery_entries(gtd_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(gtd_dir)) else {
        return Vec::new();
    };
    let mut entries = parse_entries(&content);
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some((timestamp, category, description)) =
            line.strip_prefix("## ").and_then(parse_entry_header)
        else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body_lines: Vec<&str> = Vec::new();
        let mut in_code_block = false;

        for line in lines.by_ref() {
            if in_code_block {
                if line == "```" {
                    in_code_block = false;
                } else {
                    body_lines.push(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                in_code_block = true;
            } else if let Some((key, value)) = line.trim().split_once(": ") {
                fields.push((key.to_string(), value.to_string()));
            }
        }

        entries.push(RecoveryEntry {
            timestamp,
            category,
            description,
            fields,
            body: body_lines.join("\n"),
        });
    }
    entries
}

fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp, rest) = header.split_once(HEADER_SEPARATOR)?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);
    let (category, description) = rest.split_once(": ")?;
    Some((
        timestamp,
        RecoveryCategory::parse_category(category)?,
        description.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_and_read_back() {
        let tmp = TempDir::new().unwrap();
        log_removed_item(tmp.path(), "Inbox.md", Some(4), "- [ ] Call Sam");
        log_removed_item(tmp.path(), "Inbox/Idea.md", None, "# Idea\n\nbody\n");

        let content = std::fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- gtd recovery log"));
        assert_eq!(content.matches("gtd recovery log").count(), 1);

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "inbox note removed");
        assert_eq!(entries[0].body, "# Idea\n\nbody");
        assert_eq!(entries[1].category, RecoveryCategory::Delete);
        assert_eq!(
            entries[1].fields,
            vec![
                ("Source".to_string(), "Inbox.md".to_string()),
                ("Line".to_string(), "4".to_string()),
            ]
        );
        assert_eq!(entries[1].body, "- [ ] Call Sam");
    }

    #[test]
    fn test_limit() {
        let tmp = TempDir::new().unwrap();
        for i in 1..=3 {
            log_removed_item(tmp.path(), "Inbox.md", Some(i), &format!("item {}", i));
        }
        let entries = read_recovery_entries(tmp.path(), Some(1));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, "item 3");
    }

    #[test]
    fn test_missing_log_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("note.md");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }
}
