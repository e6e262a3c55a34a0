use serde::{Deserialize, Serialize};

/// Where an inbox item lives, and therefore what deleting it means
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InboxSource {
    /// A single line inside a file
    Line {
        /// Vault-relative path of the file
        path: String,
        /// 1-based line number at the time the item was scanned
        line: usize,
        /// The verbatim line, used to verify the target before removing it
        raw: String,
    },
    /// A whole note
    Note { path: String },
}

/// An inbox item waiting to be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxItem {
    /// Display text (list markers stripped, or the note title)
    pub text: String,
    #[serde(flatten)]
    pub source: InboxSource,
}

impl InboxItem {
    pub fn line(path: impl Into<String>, line: usize, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        InboxItem {
            text: raw.trim().to_string(),
            source: InboxSource::Line {
                path: path.into(),
                line,
                raw,
            },
        }
    }

    pub fn note(path: impl Into<String>, text: impl Into<String>) -> Self {
        InboxItem {
            text: text.into(),
            source: InboxSource::Note { path: path.into() },
        }
    }

    /// The file this item comes from
    pub fn path(&self) -> &str {
        match &self.source {
            InboxSource::Line { path, .. } | InboxSource::Note { path } => path,
        }
    }

    /// The 1-based line number, for line items
    pub fn line_number(&self) -> Option<usize> {
        match self.source {
            InboxSource::Line { line, .. } => Some(line),
            InboxSource::Note { .. } => None,
        }
    }
}
