use serde::{Deserialize, Serialize};

/// A project note as scanned from the vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Vault-relative path of the note, e.g. `Projects/Website.md`
    pub path: String,
    /// Display title (the file stem)
    pub title: String,
    /// Free-text parent reference, usually a wiki link like `[[Parent]]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Unchecked items from the Next actions section, in file order
    #[serde(default)]
    pub next_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ProjectRecord {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        ProjectRecord {
            path: path.into(),
            title: title.into(),
            parent: None,
            next_actions: Vec::new(),
            status: None,
            priority: None,
            tags: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.next_actions = actions.into_iter().map(Into::into).collect();
        self
    }
}

/// A project placed in the hierarchy.
///
/// Built fresh by `build_project_hierarchy`; each node owns its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectNode {
    #[serde(flatten)]
    pub record: ProjectRecord,
    /// Parent hops to the root (0 = root)
    pub depth: usize,
    /// Own next actions followed by every descendant's, depth-first
    pub all_next_actions: Vec<String>,
    /// Child projects in attachment order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProjectNode>,
}

impl ProjectNode {
    /// Total number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(ProjectNode::subtree_len).sum::<usize>()
    }
}

/// Labels for showing a project in a list: its own title plus,
/// when it has a resolvable parent, the parent's title as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDisplayName {
    pub primary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}
