use crate::model::inbox::InboxItem;
use crate::parse::frontmatter::split_frontmatter;
use crate::parse::{heading_text, is_closed_checkbox, strip_list_marker};

/// Scan an inbox file into line items.
///
/// Every non-blank line after the frontmatter is an item, except headings
/// and completed checkboxes. Line numbers are 1-based over the whole file.
pub fn parse_inbox_lines(path: &str, text: &str) -> Vec<InboxItem> {
    let skip = split_frontmatter(text).map_or(0, |fm| fm.lines);

    text.lines()
        .enumerate()
        .skip(skip)
        .filter_map(|(idx, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty() || heading_text(trimmed).is_some() || is_closed_checkbox(line) {
                return None;
            }
            let content = strip_list_marker(line);
            if content.is_empty() {
                return None;
            }
            let mut item = InboxItem::line(path, idx + 1, line);
            item.text = content.to_string();
            Some(item)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::inbox::InboxSource;

    #[test]
    fn test_parse_inbox_lines() {
        let text = "\
---
created: 2024-01-01
---
# Inbox

- [ ] Call the dentist
- [x] Already handled
- Read that article
Loose thought

- [ ]
";
        let items = parse_inbox_lines("Inbox.md", text);
        let summary: Vec<(usize, &str)> = items
            .iter()
            .map(|i| (i.line_number().unwrap(), i.text.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (6, "Call the dentist"),
                (8, "Read that article"),
                (9, "Loose thought"),
            ]
        );
        assert_eq!(
            items[0].source,
            InboxSource::Line {
                path: "Inbox.md".to_string(),
                line: 6,
                raw: "- [ ] Call the dentist".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_inbox() {
        assert!(parse_inbox_lines("Inbox.md", "").is_empty());
        assert!(parse_inbox_lines("Inbox.md", "# Inbox\n\n").is_empty());
    }
}
