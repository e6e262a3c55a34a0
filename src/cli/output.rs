use indexmap::IndexMap;
use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::inbox::{InboxItem, InboxSource};
use crate::model::project::{ProjectDisplayName, ProjectNode};
use crate::ops::inbox_ops::ProcessReport;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct InboxItemJson<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub item: &'a InboxItem,
}

#[derive(Serialize)]
pub struct ShowJson<'a> {
    pub name: ProjectDisplayName,
    #[serde(flatten)]
    pub node: &'a ProjectNode,
}

#[derive(Serialize)]
pub struct ProcessedJson {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub text: String,
}

#[derive(Serialize)]
pub struct FailedJson {
    pub path: String,
    pub text: String,
    pub error: String,
}

#[derive(Serialize)]
pub struct ProcessJson {
    pub processed: Vec<ProcessedJson>,
    pub failed: Vec<FailedJson>,
}

#[derive(Serialize)]
pub struct RecoveryEntryJson {
    pub timestamp: String,
    pub category: String,
    pub description: String,
    pub fields: IndexMap<String, String>,
    pub body: String,
}

impl From<&RecoveryEntry> for RecoveryEntryJson {
    fn from(entry: &RecoveryEntry) -> Self {
        RecoveryEntryJson {
            timestamp: entry.timestamp.to_rfc3339(),
            category: entry.category.to_string(),
            description: entry.description.clone(),
            fields: entry.fields.iter().cloned().collect(),
            body: entry.body.clone(),
        }
    }
}

pub fn report_to_json(report: &ProcessReport) -> ProcessJson {
    ProcessJson {
        processed: report
            .processed
            .iter()
            .map(|p| ProcessedJson {
                path: p.item.path().to_string(),
                line: p.removed_line,
                text: p.item.text.clone(),
            })
            .collect(),
        failed: report
            .failed
            .iter()
            .map(|f| FailedJson {
                path: f.item.path().to_string(),
                text: f.item.text.clone(),
                error: f.error.to_string(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// One project line, indented two spaces per level
pub fn format_project_line(node: &ProjectNode) -> String {
    let mut line = format!("{}{}", "  ".repeat(node.depth), node.record.title);
    if let Some(status) = &node.record.status {
        line.push_str(&format!(" [{}]", status));
    }
    let own = node.record.next_actions.len();
    let total = node.all_next_actions.len();
    if total == own {
        line.push_str(&format!(" ({})", own));
    } else {
        line.push_str(&format!(" ({}/{})", own, total));
    }
    line
}

/// A project's next actions, indented under its line
pub fn format_project_actions(node: &ProjectNode) -> Vec<String> {
    let prefix = "  ".repeat(node.depth + 1);
    node.all_next_actions
        .iter()
        .map(|action| format!("{}- [ ] {}", prefix, action))
        .collect()
}

/// `Title` or `Title (in Parent)`
pub fn format_display_name(name: &ProjectDisplayName) -> String {
    match &name.parent {
        Some(parent) => format!("{} (in {})", name.primary, parent),
        None => name.primary.clone(),
    }
}

pub fn format_inbox_item(index: usize, item: &InboxItem) -> String {
    let location = match &item.source {
        InboxSource::Line { path, line, .. } => format!("{}:{}", path, line),
        InboxSource::Note { path } => path.clone(),
    };
    format!("{:>3}  {}  ({})", index, item.text, location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::ProjectRecord;
    use crate::ops::hierarchy::build_project_hierarchy;

    #[test]
    fn test_format_project_lines() {
        let mut home = ProjectRecord::new("Home.md", "Home").with_actions(["fix gate"]);
        home.status = Some("live".to_string());
        let records = vec![
            home,
            ProjectRecord::new("Garden.md", "Garden")
                .with_parent("[[Home]]")
                .with_actions(["weed", "mulch"]),
        ];
        let roots = build_project_hierarchy(&records);
        assert_eq!(format_project_line(&roots[0]), "Home [live] (1/3)");
        assert_eq!(format_project_line(&roots[0].children[0]), "  Garden (2)");
        assert_eq!(
            format_project_actions(&roots[0].children[0]),
            vec!["    - [ ] weed", "    - [ ] mulch"]
        );
    }

    #[test]
    fn test_format_display_name() {
        let name = ProjectDisplayName {
            primary: "Garden".to_string(),
            parent: Some("Home".to_string()),
        };
        assert_eq!(format_display_name(&name), "Garden (in Home)");
    }

    #[test]
    fn test_format_inbox_item() {
        let line = InboxItem::line("Inbox.md", 4, "- Call Sam");
        assert_eq!(format_inbox_item(1, &line), "  1  - Call Sam  (Inbox.md:4)");
        let note = InboxItem::note("Inbox/Memo.md", "Memo");
        assert_eq!(format_inbox_item(12, &note), " 12  Memo  (Inbox/Memo.md)");
    }
}
