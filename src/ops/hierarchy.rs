//! Project hierarchy: turns flat project records linked by textual parent
//! references into a forest.
//!
//! Parent references are user-authored wiki links (`[[Parent]]`,
//! `[[Area/Parent]]`, `Parent.md`) that may be missing, mistyped or
//! circular. Building happens in two phases: every record is indexed by
//! path and by title-as-path, then each record is linked to its parent
//! unless the reference does not resolve or linking would close a cycle.
//! Anything that cannot be linked becomes a root; nothing here fails.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, warn};

use crate::model::project::{ProjectDisplayName, ProjectNode, ProjectRecord};

/// Extension appended to parent references that lack one
pub const NOTE_EXTENSION: &str = ".md";

// ---------------------------------------------------------------------------
// Reference resolution
// ---------------------------------------------------------------------------

/// Normalize a parent reference into a candidate note path.
///
/// Strips a `[[`/`]]` wrapper, trims whitespace and appends `.md` when the
/// reference has no extension. Returns `None` for absent or empty
/// references.
pub fn extract_parent_path(reference: Option<&str>) -> Option<String> {
    let reference = reference?.trim();
    let inner = reference.strip_prefix("[[").unwrap_or(reference);
    let inner = inner.strip_suffix("]]").unwrap_or(inner).trim();
    if inner.is_empty() {
        return None;
    }
    if inner.ends_with(NOTE_EXTENSION) {
        Some(inner.to_string())
    } else {
        Some(format!("{}{}", inner, NOTE_EXTENSION))
    }
}

/// Lookup tables over one snapshot of project records.
///
/// When two records share a path or a title, the first one wins.
pub struct ProjectIndex<'a> {
    records: &'a [ProjectRecord],
    by_path: HashMap<&'a str, usize>,
    by_title: HashMap<String, usize>,
}

impl<'a> ProjectIndex<'a> {
    pub fn new(records: &'a [ProjectRecord]) -> Self {
        let mut by_path = HashMap::with_capacity(records.len());
        let mut by_title = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            by_path.entry(record.path.as_str()).or_insert(idx);
            by_title
                .entry(format!("{}{}", record.title, NOTE_EXTENSION))
                .or_insert(idx);
        }
        ProjectIndex {
            records,
            by_path,
            by_title,
        }
    }

    /// Index of the record with exactly this path
    pub fn by_path(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// Resolve a reference: exact path first, then title-as-path.
    pub fn lookup(&self, reference: &str) -> Option<usize> {
        let candidate = extract_parent_path(Some(reference))?;
        self.by_path
            .get(candidate.as_str())
            .or_else(|| self.by_title.get(&candidate))
            .copied()
    }

    /// Resolve the parent reference of the record at `idx`
    pub fn resolve_parent(&self, idx: usize) -> Option<usize> {
        self.lookup(self.records[idx].parent.as_deref()?)
    }

    /// Would attaching `child` under `candidate` close a cycle?
    ///
    /// Walks up the parent-reference chain from `candidate`. Reaching the
    /// child's path means yes. Reaching a root, an unresolvable reference,
    /// or a record already seen on this walk (a cycle elsewhere that does
    /// not involve the child) means no.
    pub fn would_create_cycle(&self, child: usize, candidate: usize) -> bool {
        let child_path = self.records[child].path.as_str();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = Some(candidate);

        while let Some(idx) = current {
            let path = self.records[idx].path.as_str();
            if path == child_path {
                return true;
            }
            if !visited.insert(path) {
                return false;
            }
            current = self.resolve_parent(idx);
        }
        false
    }

    /// Decide how the record at `idx` attaches to the forest.
    pub fn link(&self, idx: usize) -> ParentLink {
        let record = &self.records[idx];
        let Some(reference) = record.parent.as_deref() else {
            return ParentLink::Root;
        };
        if extract_parent_path(Some(reference)).is_none() {
            return ParentLink::Root;
        }

        match self.lookup(reference) {
            None => {
                debug!(
                    project = %record.path,
                    parent = %reference,
                    "parent reference does not resolve; treating project as root"
                );
                ParentLink::Unresolved(reference.to_string())
            }
            Some(parent) if self.would_create_cycle(idx, parent) => {
                warn!(
                    project = %record.path,
                    parent = %self.records[parent].path,
                    "parent link would create a cycle; treating project as root"
                );
                ParentLink::Cycle(parent)
            }
            Some(parent) => ParentLink::Child(parent),
        }
    }
}

/// The link decision for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentLink {
    /// No parent reference
    Root,
    /// Attached under the record at this index
    Child(usize),
    /// The reference names no known project; demoted to root
    Unresolved(String),
    /// Attaching under the record at this index would close a cycle; demoted to root
    Cycle(usize),
}

impl ParentLink {
    /// The parent index, if the record is attached
    pub fn parent(&self) -> Option<usize> {
        match self {
            ParentLink::Child(parent) => Some(*parent),
            _ => None,
        }
    }
}

/// Link every record, in input order.
pub fn link_projects(records: &[ProjectRecord]) -> Vec<ParentLink> {
    let index = ProjectIndex::new(records);
    (0..records.len()).map(|idx| index.link(idx)).collect()
}

// ---------------------------------------------------------------------------
// Building and flattening
// ---------------------------------------------------------------------------

/// Build the project forest.
///
/// Roots come out in input order. Children are attached in input order,
/// depths are assigned from the roots down, and each node's
/// `all_next_actions` is its own actions followed by each child's
/// aggregate in attachment order.
pub fn build_project_hierarchy(records: &[ProjectRecord]) -> Vec<ProjectNode> {
    build_from_links(records, &link_projects(records))
}

/// Build the forest from link decisions already made by [`link_projects`].
///
/// `links` must have one entry per record, in the same order.
pub fn build_from_links(records: &[ProjectRecord], links: &[ParentLink]) -> Vec<ProjectNode> {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots = Vec::new();
    for (idx, link) in links.iter().enumerate() {
        match link.parent() {
            Some(parent) => children[parent].push(idx),
            None => roots.push(idx),
        }
    }

    roots
        .into_iter()
        .map(|idx| build_node(records, &children, idx, 0))
        .collect()
}

fn build_node(
    records: &[ProjectRecord],
    children: &[Vec<usize>],
    idx: usize,
    depth: usize,
) -> ProjectNode {
    let child_nodes: Vec<ProjectNode> = children[idx]
        .iter()
        .map(|&child| build_node(records, children, child, depth + 1))
        .collect();

    let record = records[idx].clone();
    let mut all_next_actions = record.next_actions.clone();
    for child in &child_nodes {
        all_next_actions.extend(child.all_next_actions.iter().cloned());
    }

    ProjectNode {
        record,
        depth,
        all_next_actions,
        children: child_nodes,
    }
}

/// Pre-order, depth-first walk of the forest, root by root.
pub fn flatten_hierarchy(roots: &[ProjectNode]) -> Vec<&ProjectNode> {
    let mut out = Vec::new();
    for root in roots {
        push_subtree(root, &mut out);
    }
    out
}

fn push_subtree<'a>(node: &'a ProjectNode, out: &mut Vec<&'a ProjectNode>) {
    out.push(node);
    for child in &node.children {
        push_subtree(child, out);
    }
}

// ---------------------------------------------------------------------------
// Display names
// ---------------------------------------------------------------------------

/// Title of the project at `path`, plus its parent's title when the parent
/// reference resolves. Unknown paths fall back to the file stem.
pub fn project_display_name(path: &str, records: &[ProjectRecord]) -> ProjectDisplayName {
    let index = ProjectIndex::new(records);
    match index.by_path(path) {
        Some(idx) => ProjectDisplayName {
            primary: records[idx].title.clone(),
            parent: index
                .resolve_parent(idx)
                .map(|parent| records[parent].title.clone()),
        },
        None => ProjectDisplayName {
            primary: Path::new(path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(path)
                .to_string(),
            parent: None,
        },
    }
}

/// Find a project by path or title, using the same rules as parent references.
pub fn find_project<'a>(records: &'a [ProjectRecord], query: &str) -> Option<&'a ProjectRecord> {
    let index = ProjectIndex::new(records);
    index
        .by_path(query)
        .or_else(|| index.lookup(query))
        .map(|idx| &records[idx])
}
