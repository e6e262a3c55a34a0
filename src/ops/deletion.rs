use std::borrow::Cow;
use std::collections::HashMap;

use tracing::warn;

use crate::model::inbox::{InboxItem, InboxSource};

/// Per-file count of lines already removed in the current batch
pub type DeletionOffsets = HashMap<String, usize>;

/// Corrects stale line numbers while a batch removes several lines from
/// the same files.
///
/// Removing line N shifts every later line of that file up by one. Items
/// are scanned once before the batch starts, so each item's line number is
/// adjusted by the number of removals already recorded for its file. The
/// offsets map belongs to the caller and lives for one batch.
///
/// Per item, callers must: `prepare_for_deletion`, remove the adjusted line,
/// and only after the removal succeeded, `record_deletion` with the
/// original item. Items of one file must arrive in ascending line order.
pub struct DeletionOffsetManager<'a> {
    offsets: &'a mut DeletionOffsets,
}

impl<'a> DeletionOffsetManager<'a> {
    pub fn new(offsets: &'a mut DeletionOffsets) -> Self {
        DeletionOffsetManager { offsets }
    }

    /// Removals recorded so far for `path`
    pub fn offset_for(&self, path: &str) -> usize {
        self.offsets.get(path).copied().unwrap_or(0)
    }

    /// The item to actually delete.
    ///
    /// Note items come back as-is. Line items come back as a new value with
    /// the line shifted down by the recorded offset, never below line 1.
    pub fn prepare_for_deletion<'i>(&self, item: &'i InboxItem) -> Cow<'i, InboxItem> {
        let InboxSource::Line { path, line, raw } = &item.source else {
            return Cow::Borrowed(item);
        };

        let prior = self.offset_for(path);
        if prior >= *line {
            warn!(
                path = %path,
                line = *line,
                prior_deletions = prior,
                "deletion offset exceeds line number; clamping to line 1"
            );
        }

        Cow::Owned(InboxItem {
            text: item.text.clone(),
            source: InboxSource::Line {
                path: path.clone(),
                line: line.saturating_sub(prior).max(1),
                raw: raw.clone(),
            },
        })
    }

    /// Count one removal from the item's file. No-op for note items.
    pub fn record_deletion(&mut self, item: &InboxItem) {
        if let InboxSource::Line { path, .. } = &item.source {
            *self.offsets.entry(path.clone()).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn line_item(path: &str, line: usize) -> InboxItem {
        InboxItem::line(path, line, format!("- item {}", line))
    }

    fn adjusted_line(item: &InboxItem) -> usize {
        item.line_number().unwrap()
    }

    #[test]
    fn test_sequential_deletions_shift_targets() {
        let mut offsets = DeletionOffsets::new();
        let mut manager = DeletionOffsetManager::new(&mut offsets);

        let mut targets = Vec::new();
        for line in [5, 10, 15] {
            let item = line_item("Inbox.md", line);
            targets.push(adjusted_line(&manager.prepare_for_deletion(&item)));
            manager.record_deletion(&item);
        }

        assert_eq!(targets, vec![5, 9, 13]);
        assert_eq!(offsets.get("Inbox.md"), Some(&3));
    }

    #[test]
    fn test_files_are_isolated() {
        let mut offsets = DeletionOffsets::new();
        let mut manager = DeletionOffsetManager::new(&mut offsets);

        for line in [1, 2, 3] {
            manager.record_deletion(&line_item("a.md", line));
        }

        let b = line_item("b.md", 7);
        assert_eq!(adjusted_line(&manager.prepare_for_deletion(&b)), 7);
        assert_eq!(manager.offset_for("b.md"), 0);
        assert_eq!(manager.offset_for("a.md"), 3);
    }

    #[test]
    #[traced_test]
    fn test_adjusted_line_never_below_one() {
        let mut offsets = DeletionOffsets::new();
        offsets.insert("Inbox.md".to_string(), 3);
        let manager = DeletionOffsetManager::new(&mut offsets);

        let item = line_item("Inbox.md", 1);
        assert_eq!(adjusted_line(&manager.prepare_for_deletion(&item)), 1);
        assert!(logs_contain("clamping to line 1"));
    }

    #[test]
    fn test_prepare_does_not_mutate_original() {
        let mut offsets = DeletionOffsets::new();
        offsets.insert("Inbox.md".to_string(), 2);
        let manager = DeletionOffsetManager::new(&mut offsets);

        let item = line_item("Inbox.md", 8);
        let prepared = manager.prepare_for_deletion(&item);
        assert!(matches!(prepared, Cow::Owned(_)));
        assert_eq!(adjusted_line(&prepared), 6);
        assert_eq!(prepared.text, item.text);
        assert_eq!(prepared.path(), "Inbox.md");
        assert_eq!(adjusted_line(&item), 8);
    }

    #[test]
    fn test_note_items_pass_through() {
        let mut offsets = DeletionOffsets::new();
        offsets.insert("Inbox/Idea.md".to_string(), 4);
        let mut manager = DeletionOffsetManager::new(&mut offsets);

        let note = InboxItem::note("Inbox/Idea.md", "Idea");
        let prepared = manager.prepare_for_deletion(&note);
        assert!(matches!(prepared, Cow::Borrowed(_)));
        assert!(std::ptr::eq(prepared.as_ref(), &note));

        manager.record_deletion(&note);
        assert_eq!(offsets.len(), 1);
        assert_eq!(offsets.get("Inbox/Idea.md"), Some(&4));
    }

    #[test]
    fn test_independent_batches() {
        let item = line_item("Inbox.md", 4);

        let mut first = DeletionOffsets::new();
        DeletionOffsetManager::new(&mut first).record_deletion(&item);

        let mut second = DeletionOffsets::new();
        let manager = DeletionOffsetManager::new(&mut second);
        assert_eq!(adjusted_line(&manager.prepare_for_deletion(&item)), 4);
        assert_eq!(first.get("Inbox.md"), Some(&1));
    }
}
