use serde_yaml::{Mapping, Value};

/// A note split at its YAML frontmatter fences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// Text between the fences
    pub yaml: &'a str,
    /// Everything after the closing fence
    pub body: &'a str,
    /// Lines taken by the frontmatter, fences included
    pub lines: usize,
}

/// Split off a leading `---` fenced block. Returns `None` when the note
/// does not start with a fence or the block is never closed.
pub fn split_frontmatter(text: &str) -> Option<Frontmatter<'_>> {
    let mut segments = text.split_inclusive('\n');
    let first = segments.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    let mut lines = 1;
    for segment in segments {
        lines += 1;
        if segment.trim_end() == "---" {
            return Some(Frontmatter {
                yaml: &text[yaml_start..offset],
                body: &text[offset + segment.len()..],
                lines,
            });
        }
        offset += segment.len();
    }
    None
}

/// Parsed frontmatter keys. Malformed YAML, or YAML that is not a
/// mapping, reads as no frontmatter.
pub fn parse_frontmatter(text: &str) -> Option<Mapping> {
    let fm = split_frontmatter(text)?;
    match serde_yaml::from_str::<Value>(fm.yaml) {
        Ok(Value::Mapping(map)) => Some(map),
        _ => None,
    }
}

/// A scalar field as text.
///
/// An unquoted wiki link (`parent: [[Home]]`) parses as a nested sequence
/// in YAML; it is turned back into `[[Home]]`.
pub fn text_field(fm: &Mapping, key: &str) -> Option<String> {
    match fm.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Sequence(outer) => match outer.as_slice() {
            [Value::Sequence(inner)] => match inner.as_slice() {
                [Value::String(s)] => Some(format!("[[{}]]", s)),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

/// Tags from a `tags` list or a comma/space separated string, `#` stripped
pub fn tags_field(fm: &Mapping) -> Vec<String> {
    let raw: Vec<String> = match fm.get("tags") {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    raw.iter()
        .map(|t| t.trim().trim_start_matches('#').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
