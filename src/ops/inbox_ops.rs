use std::io;

use tracing::{debug, warn};

use crate::io::vault_io::NoteStore;
use crate::model::inbox::{InboxItem, InboxSource};
use crate::ops::deletion::{DeletionOffsetManager, DeletionOffsets};
use crate::parse::insert_next_action;

/// Error type for inbox operations
#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("inbox item index out of range: {0}")]
    IndexOutOfRange(usize),
    #[error("{path}: line {line} is past the end of the file")]
    LineOutOfRange { path: String, line: usize },
    #[error("{path}: line {line} changed since the inbox was read")]
    LineChanged { path: String, line: usize },
    #[error("cannot file an item from {0} into the same file")]
    TargetIsSource(String),
    #[error("could not access {path}: {source}")]
    Io { path: String, source: io::Error },
}

/// What happens to an item before it leaves the inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Just remove it
    Delete,
    /// Append it as `- [ ] text` to the next-actions file
    NextAction { file: String },
    /// Add it to a project's Next actions section
    Project { path: String },
}

impl Disposition {
    /// The file written before the item is removed
    pub fn target(&self) -> Option<&str> {
        match self {
            Disposition::Delete => None,
            Disposition::NextAction { file } => Some(file),
            Disposition::Project { path } => Some(path),
        }
    }
}

#[derive(Debug)]
pub struct ProcessedItem {
    pub item: InboxItem,
    /// Line number actually removed (line items only)
    pub removed_line: Option<usize>,
    /// The removed text: the verbatim line, or the whole note
    pub removed: String,
}

#[derive(Debug)]
pub struct FailedItem {
    pub item: InboxItem,
    pub error: InboxError,
}

/// Outcome of a batch. Failures never stop the rest of the batch.
#[derive(Debug, Default)]
pub struct ProcessReport {
    pub processed: Vec<ProcessedItem>,
    pub failed: Vec<FailedItem>,
}

/// Pick inbox items by 1-based index, in inbox order, without duplicates.
pub fn select_items(inbox: &[InboxItem], indices: &[usize]) -> Result<Vec<InboxItem>, InboxError> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .into_iter()
        .map(|n| {
            n.checked_sub(1)
                .and_then(|idx| inbox.get(idx))
                .cloned()
                .ok_or(InboxError::IndexOutOfRange(n))
        })
        .collect()
}

/// Remove the 1-based `line` from `text`.
///
/// Returns the new text and the removed line (without its line ending), or
/// `None` when the line does not exist. Whether the text ends with a
/// newline is preserved.
pub fn remove_line(text: &str, line: usize) -> Option<(String, String)> {
    let mut segments: Vec<&str> = text.split_inclusive('\n').collect();
    if line == 0 || line > segments.len() {
        return None;
    }
    let removed = segments.remove(line - 1);
    let mut updated = segments.concat();
    if !removed.ends_with('\n') && updated.ends_with('\n') {
        updated.pop();
        if updated.ends_with('\r') {
            updated.pop();
        }
    }
    Some((updated, removed.trim_end_matches(['\n', '\r']).to_string()))
}

/// Process a batch of inbox items.
///
/// Line items are handled in ascending line order per file. Each one is
/// shifted by the lines already removed from its file, checked against its
/// scanned text, filed according to `disposition`, and removed. Only a
/// successful removal is recorded, so a failed item never skews the items
/// after it.
pub fn process_items<S: NoteStore>(
    store: &mut S,
    items: &[InboxItem],
    disposition: &Disposition,
) -> ProcessReport {
    process_items_with(store, items, disposition, |_| {})
}

/// [`process_items`], calling `on_removed` right after each removal is
/// written and before the next item is touched.
pub fn process_items_with<S, F>(
    store: &mut S,
    items: &[InboxItem],
    disposition: &Disposition,
    mut on_removed: F,
) -> ProcessReport
where
    S: NoteStore,
    F: FnMut(&ProcessedItem),
{
    let mut ordered: Vec<&InboxItem> = items.iter().collect();
    ordered.sort_by(|a, b| {
        a.path()
            .cmp(b.path())
            .then(a.line_number().cmp(&b.line_number()))
    });

    let mut offsets = DeletionOffsets::new();
    let mut manager = DeletionOffsetManager::new(&mut offsets);
    let mut report = ProcessReport::default();

    for item in ordered {
        match process_one(store, &manager, item, disposition) {
            Ok((removed_line, removed)) => {
                manager.record_deletion(item);
                debug!(path = %item.path(), line = ?removed_line, "removed inbox item");
                let processed = ProcessedItem {
                    item: item.clone(),
                    removed_line,
                    removed,
                };
                on_removed(&processed);
                report.processed.push(processed);
            }
            Err(error) => {
                warn!(path = %item.path(), %error, "skipped inbox item");
                report.failed.push(FailedItem {
                    item: item.clone(),
                    error,
                });
            }
        }
    }
    report
}

fn process_one<S: NoteStore>(
    store: &mut S,
    manager: &DeletionOffsetManager<'_>,
    item: &InboxItem,
    disposition: &Disposition,
) -> Result<(Option<usize>, String), InboxError> {
    if disposition.target() == Some(item.path()) {
        return Err(InboxError::TargetIsSource(item.path().to_string()));
    }

    let target = manager.prepare_for_deletion(item);
    match &target.source {
        InboxSource::Line { path, line, raw } => {
            let text = read(store, path)?;
            let out_of_range = || InboxError::LineOutOfRange {
                path: path.clone(),
                line: *line,
            };
            let current = text.lines().nth(line - 1).ok_or_else(out_of_range)?;
            if current != raw.as_str() {
                return Err(InboxError::LineChanged {
                    path: path.clone(),
                    line: *line,
                });
            }

            file_item(store, item, disposition)?;
            let (updated, removed) = remove_line(&text, *line).ok_or_else(out_of_range)?;
            write(store, path, &updated)?;
            Ok((Some(*line), removed))
        }
        InboxSource::Note { path } => {
            let content = read(store, path)?;
            file_item(store, item, disposition)?;
            store.delete(path).map_err(|source| InboxError::Io {
                path: path.clone(),
                source,
            })?;
            Ok((None, content))
        }
    }
}

fn file_item<S: NoteStore>(
    store: &mut S,
    item: &InboxItem,
    disposition: &Disposition,
) -> Result<(), InboxError> {
    match disposition {
        Disposition::Delete => Ok(()),
        Disposition::NextAction { file } => {
            let text = match store.read(file) {
                Ok(text) => text,
                Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
                Err(source) => {
                    return Err(InboxError::Io {
                        path: file.clone(),
                        source,
                    });
                }
            };
            let updated = append_line(&text, &format!("- [ ] {}", item.text));
            write(store, file, &updated)
        }
        Disposition::Project { path } => {
            let text = read(store, path)?;
            write(store, path, &insert_next_action(&text, &item.text))
        }
    }
}

/// Append `line`, reusing the text's line ending (`\n` for new files)
fn append_line(text: &str, line: &str) -> String {
    let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let mut out = text.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push_str(eol);
    }
    out.push_str(line);
    out.push_str(eol);
    out
}

fn read<S: NoteStore>(store: &S, path: &str) -> Result<String, InboxError> {
    store.read(path).map_err(|source| InboxError::Io {
        path: path.to_string(),
        source,
    })
}

fn write<S: NoteStore>(store: &mut S, path: &str, content: &str) -> Result<(), InboxError> {
    store.write(path, content).map_err(|source| InboxError::Io {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_inbox_lines;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStore {
        files: HashMap<String, String>,
        fail_writes_to: Option<String>,
    }

    impl MemStore {
        fn with(files: &[(&str, &str)]) -> Self {
            MemStore {
                files: files
                    .iter()
                    .map(|(p, t)| (p.to_string(), t.to_string()))
                    .collect(),
                fail_writes_to: None,
            }
        }

        fn get(&self, path: &str) -> &str {
            self.files.get(path).map(String::as_str).unwrap_or("")
        }
    }

    impl NoteStore for MemStore {
        fn read(&self, path: &str) -> io::Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
        }

        fn write(&mut self, path: &str, content: &str) -> io::Result<()> {
            if self.fail_writes_to.as_deref() == Some(path) {
                return Err(io::Error::other("disk full"));
            }
            self.files.insert(path.to_string(), content.to_string());
            Ok(())
        }

        fn delete(&mut self, path: &str) -> io::Result<()> {
            self.files
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
        }
    }

    const INBOX: &str = "# Inbox\n\n- one\n- two\n- three\n- four\n- five\n";

    // --- remove_line ---

    #[test]
    fn test_remove_line() {
        assert_eq!(
            remove_line("a\nb\nc\n", 2),
            Some(("a\nc\n".to_string(), "b".to_string()))
        );
        assert_eq!(
            remove_line("a\nb\nc", 3),
            Some(("a\nb".to_string(), "c".to_string()))
        );
        assert_eq!(
            remove_line("a\r\nb\r\n", 1),
            Some(("b\r\n".to_string(), "a".to_string()))
        );
        assert_eq!(remove_line("only", 1), Some((String::new(), "only".to_string())));
        assert_eq!(remove_line("a\n", 2), None);
        assert_eq!(remove_line("a\n", 0), None);
    }

    // --- select_items ---

    #[test]
    fn test_select_items() {
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let picked = select_items(&inbox, &[3, 1, 3]).unwrap();
        let texts: Vec<&str> = picked.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "three"]);

        assert!(matches!(
            select_items(&inbox, &[0]),
            Err(InboxError::IndexOutOfRange(0))
        ));
        assert!(matches!(
            select_items(&inbox, &[6]),
            Err(InboxError::IndexOutOfRange(6))
        ));
    }

    // --- process_items ---

    #[test]
    fn test_delete_several_lines_from_one_file() {
        let mut store = MemStore::with(&[("Inbox.md", INBOX)]);
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let picked = select_items(&inbox, &[1, 3, 5]).unwrap();

        let report = process_items(&mut store, &picked, &Disposition::Delete);

        assert!(report.failed.is_empty());
        let removed_lines: Vec<Option<usize>> =
            report.processed.iter().map(|p| p.removed_line).collect();
        assert_eq!(removed_lines, vec![Some(3), Some(4), Some(5)]);
        assert_eq!(store.get("Inbox.md"), "# Inbox\n\n- two\n- four\n");
    }

    #[test]
    fn test_order_of_selection_does_not_matter() {
        let mut store = MemStore::with(&[("Inbox.md", INBOX)]);
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let picked = vec![inbox[4].clone(), inbox[0].clone(), inbox[2].clone()];

        let report = process_items(&mut store, &picked, &Disposition::Delete);
        assert_eq!(report.processed.len(), 3);
        assert_eq!(store.get("Inbox.md"), "# Inbox\n\n- two\n- four\n");
    }

    #[test]
    fn test_lines_from_two_files() {
        let other = "- x\n- y\n- z\n";
        let mut store = MemStore::with(&[("Inbox.md", INBOX), ("Phone.md", other)]);
        let mut items = parse_inbox_lines("Inbox.md", INBOX);
        items.extend(parse_inbox_lines("Phone.md", other));
        let picked = select_items(&items, &[2, 4, 6, 8]).unwrap();

        let report = process_items(&mut store, &picked, &Disposition::Delete);
        assert!(report.failed.is_empty());
        assert_eq!(store.get("Inbox.md"), "# Inbox\n\n- one\n- three\n- five\n");
        assert_eq!(store.get("Phone.md"), "- y\n");
    }

    #[test]
    fn test_changed_line_is_skipped_and_not_counted() {
        let mut store = MemStore::with(&[("Inbox.md", INBOX)]);
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let picked = select_items(&inbox, &[2, 4]).unwrap();
        // "two" was edited after the scan
        store
            .files
            .insert("Inbox.md".to_string(), INBOX.replace("- two", "- 2"));

        let report = process_items(&mut store, &picked, &Disposition::Delete);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].error,
            InboxError::LineChanged { line: 4, .. }
        ));
        // "four" is still found at its original line because nothing was removed before it
        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.processed[0].removed, "- four");
        assert_eq!(store.get("Inbox.md"), "# Inbox\n\n- one\n- 2\n- three\n- five\n");
    }

    #[test]
    fn test_failed_write_does_not_shift_later_items() {
        let mut store = MemStore::with(&[("Inbox.md", INBOX)]);
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let picked = select_items(&inbox, &[1]).unwrap();
        store.fail_writes_to = Some("Inbox.md".to_string());

        let report = process_items(&mut store, &picked, &Disposition::Delete);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].error, InboxError::Io { .. }));
        assert_eq!(store.get("Inbox.md"), INBOX);
    }

    #[test]
    fn test_move_to_next_actions() {
        let mut store = MemStore::with(&[
            ("Inbox.md", INBOX),
            ("Next actions.md", "- [ ] existing"),
        ]);
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let picked = select_items(&inbox, &[2, 3]).unwrap();
        let disposition = Disposition::NextAction {
            file: "Next actions.md".to_string(),
        };

        let report = process_items(&mut store, &picked, &disposition);
        assert!(report.failed.is_empty());
        assert_eq!(
            store.get("Next actions.md"),
            "- [ ] existing\n- [ ] two\n- [ ] three\n"
        );
        assert_eq!(store.get("Inbox.md"), "# Inbox\n\n- one\n- four\n- five\n");
    }

    #[test]
    fn test_next_actions_file_created() {
        let mut store = MemStore::with(&[("Inbox.md", INBOX)]);
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let disposition = Disposition::NextAction {
            file: "GTD/Next.md".to_string(),
        };
        process_items(&mut store, &inbox[..1], &disposition);
        assert_eq!(store.get("GTD/Next.md"), "- [ ] one\n");
    }

    #[test]
    fn test_next_actions_file_keeps_crlf() {
        let mut store = MemStore::with(&[
            ("Inbox.md", INBOX),
            ("Next actions.md", "- [ ] existing\r\n"),
        ]);
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let disposition = Disposition::NextAction {
            file: "Next actions.md".to_string(),
        };
        process_items(&mut store, &inbox[..1], &disposition);
        assert_eq!(store.get("Next actions.md"), "- [ ] existing\r\n- [ ] one\r\n");
    }

    #[test]
    fn test_removal_callback_runs_per_item() {
        let mut store = MemStore::with(&[("Inbox.md", INBOX)]);
        let mut inbox = parse_inbox_lines("Inbox.md", INBOX);
        // stale raw text: this one fails verification
        if let InboxSource::Line { raw, .. } = &mut inbox[1].source {
            *raw = "- edited".to_string();
        }
        let picked = select_items(&inbox, &[1, 2, 3]).unwrap();

        let mut seen = Vec::new();
        let report = process_items_with(&mut store, &picked, &Disposition::Delete, |p| {
            seen.push((p.removed_line, p.removed.clone()));
        });
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            seen,
            vec![
                (Some(3), "- one".to_string()),
                (Some(4), "- three".to_string()),
            ]
        );
    }

    #[test]
    fn test_move_to_project() {
        let project = "---\ntags: [project]\n---\n## Next actions\n- [ ] Plan\n";
        let mut store = MemStore::with(&[("Inbox.md", INBOX), ("Projects/Trip.md", project)]);
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let disposition = Disposition::Project {
            path: "Projects/Trip.md".to_string(),
        };

        let report = process_items(&mut store, &inbox[1..2], &disposition);
        assert!(report.failed.is_empty());
        assert_eq!(
            store.get("Projects/Trip.md"),
            "---\ntags: [project]\n---\n## Next actions\n- [ ] Plan\n- [ ] two\n"
        );
    }

    #[test]
    fn test_note_items_are_deleted_whole() {
        let mut store = MemStore::with(&[
            ("Inbox.md", INBOX),
            ("Inbox/Memo.md", "memo body\n"),
        ]);
        let mut items = parse_inbox_lines("Inbox.md", INBOX);
        items.push(InboxItem::note("Inbox/Memo.md", "Memo"));
        let picked = select_items(&items, &[1, 6]).unwrap();

        let report = process_items(&mut store, &picked, &Disposition::Delete);
        assert!(report.failed.is_empty());
        assert!(!store.files.contains_key("Inbox/Memo.md"));
        let memo = report
            .processed
            .iter()
            .find(|p| p.removed_line.is_none())
            .unwrap();
        assert_eq!(memo.removed, "memo body\n");
        assert_eq!(store.get("Inbox.md"), "# Inbox\n\n- two\n- three\n- four\n- five\n");
    }

    #[test]
    fn test_target_is_source_rejected() {
        let mut store = MemStore::with(&[("Inbox.md", INBOX)]);
        let inbox = parse_inbox_lines("Inbox.md", INBOX);
        let disposition = Disposition::NextAction {
            file: "Inbox.md".to_string(),
        };
        let report = process_items(&mut store, &inbox[..1], &disposition);
        assert!(matches!(
            report.failed[0].error,
            InboxError::TargetIsSource(_)
        ));
        assert_eq!(store.get("Inbox.md"), INBOX);
    }
}
