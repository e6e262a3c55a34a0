use std::path::Path;

use crate::model::project::ProjectRecord;
use crate::parse::frontmatter::{parse_frontmatter, split_frontmatter, tags_field, text_field};
use crate::parse::{heading_text, open_checkbox_text};

/// Frontmatter keys holding the parent reference, in lookup order
const PARENT_KEYS: &[&str] = &["parent-project", "parent_project"];

const NEXT_ACTIONS_HEADING: &str = "next actions";

/// Parse a note into a project record.
///
/// Returns `None` unless the frontmatter tags include `project_tag` (or a
/// `project_tag/...` sub-tag). The title is the file stem.
pub fn parse_project(path: &str, text: &str, project_tag: &str) -> Option<ProjectRecord> {
    let fm = parse_frontmatter(text)?;
    let tags = tags_field(&fm);
    if !tags.iter().any(|t| is_project_tag(t, project_tag)) {
        return None;
    }

    let title = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string();

    let parent = PARENT_KEYS
        .iter()
        .find_map(|key| text_field(&fm, key))
        .filter(|p| !p.trim().is_empty());

    let priority = fm.get("priority").and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    });

    Some(ProjectRecord {
        path: path.to_string(),
        title,
        parent,
        next_actions: next_actions(text),
        status: text_field(&fm, "status"),
        priority,
        tags,
    })
}

fn is_project_tag(tag: &str, project_tag: &str) -> bool {
    tag == project_tag
        || tag
            .strip_prefix(project_tag)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Unchecked checkbox lines under the Next actions heading, in order
pub fn next_actions(text: &str) -> Vec<String> {
    let lines = body_lines(text);
    let Some((start, end)) = next_actions_section(&lines) else {
        return Vec::new();
    };
    lines[start + 1..end]
        .iter()
        .filter_map(|line| open_checkbox_text(line))
        .map(str::to_string)
        .collect()
}

/// Add `- [ ] action` to the end of the Next actions section, creating the
/// section at the end of the note when it is missing.
///
/// The note's line ending (`\r\n` or `\n`) is reused, and a final line
/// ending is written only if the note had one (or was empty).
pub fn insert_next_action(text: &str, action: &str) -> String {
    let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let final_eol = if text.is_empty() || text.ends_with('\n') { eol } else { "" };
    let new_line = format!("- [ ] {}", action.trim());
    let mut lines: Vec<&str> = text.lines().collect();
    let skip = split_frontmatter(text).map_or(0, |fm| fm.lines);

    match next_actions_section(&lines[skip..]) {
        Some((start, end)) => {
            let (start, end) = (start + skip, end + skip);
            let mut insert_at = start + 1;
            for (idx, line) in lines.iter().enumerate().take(end).skip(start + 1) {
                if !line.trim().is_empty() {
                    insert_at = idx + 1;
                }
            }
            lines.insert(insert_at, &new_line);
            format!("{}{}", lines.join(eol), final_eol)
        }
        None => {
            let trimmed = text.trim_end();
            if trimmed.is_empty() {
                format!("## Next actions{eol}{eol}{new_line}{final_eol}")
            } else {
                format!("{trimmed}{eol}{eol}## Next actions{eol}{eol}{new_line}{final_eol}")
            }
        }
    }
}

fn body_lines(text: &str) -> Vec<&str> {
    let skip = split_frontmatter(text).map_or(0, |fm| fm.lines);
    text.lines().skip(skip).collect()
}

/// `(heading index, end index)` of the Next actions section; the end is
/// the next heading or the end of the note
fn next_actions_section(lines: &[&str]) -> Option<(usize, usize)> {
    let start = lines.iter().position(|line| {
        heading_text(line).is_some_and(|h| h.eq_ignore_ascii_case(NEXT_ACTIONS_HEADING))
    })?;
    let end = lines[start + 1..]
        .iter()
        .position(|line| heading_text(line).is_some())
        .map_or(lines.len(), |offset| start + 1 + offset);
    Some((start, end))
}
