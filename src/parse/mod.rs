pub mod frontmatter;
pub mod inbox_parser;
pub mod project_parser;

use std::sync::LazyLock;

use regex::Regex;

pub use frontmatter::{Frontmatter, parse_frontmatter, split_frontmatter};
pub use inbox_parser::parse_inbox_lines;
pub use project_parser::{insert_next_action, parse_project};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+(.*?)[\s#]*$").unwrap());

/// `- [ ] text`, also with `*` or `+` bullets
static OPEN_CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+\[ \]\s+(.*?)\s*$").unwrap());

/// `- [x] text` or any other non-blank checkbox state
static CLOSED_CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+\[[^ \]]\]").unwrap());

static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(?:\[ \]\s*)?").unwrap());

/// The text of a markdown ATX heading, or `None` if the line is not one
pub fn heading_text(line: &str) -> Option<&str> {
    HEADING_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// The text of an unchecked checkbox line
pub fn open_checkbox_text(line: &str) -> Option<&str> {
    OPEN_CHECKBOX_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}

/// Whether the line is a completed (or otherwise non-open) checkbox
pub fn is_closed_checkbox(line: &str) -> bool {
    CLOSED_CHECKBOX_RE.is_match(line)
}

/// Strip a leading bullet, numbered marker and open checkbox
pub fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER_RE.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line.trim(),
    }
}
