use serde::{Deserialize, Serialize};

/// Configuration from `.gtd/vault.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    pub vault: VaultInfo,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultInfo {
    pub name: String,
}

/// Vault-relative locations of the GTD files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Folder scanned for project notes. Empty means the whole vault.
    #[serde(default = "default_projects_folder")]
    pub projects_folder: String,
    /// File whose lines are inbox items
    #[serde(default = "default_inbox_file")]
    pub inbox_file: String,
    /// Folder whose notes are inbox items
    #[serde(default = "default_inbox_folder")]
    pub inbox_folder: String,
    /// File that receives processed next actions
    #[serde(default = "default_next_actions_file")]
    pub next_actions_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            projects_folder: default_projects_folder(),
            inbox_file: default_inbox_file(),
            inbox_folder: default_inbox_folder(),
            next_actions_file: default_next_actions_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsConfig {
    /// Frontmatter tag marking a note as a project (`project/work` also matches)
    #[serde(default = "default_project_tag")]
    pub tag: String,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        ProjectsConfig {
            tag: default_project_tag(),
        }
    }
}

fn default_projects_folder() -> String {
    "Projects".to_string()
}

fn default_inbox_file() -> String {
    "Inbox.md".to_string()
}

fn default_inbox_folder() -> String {
    "Inbox".to_string()
}

fn default_next_actions_file() -> String {
    "Next actions.md".to_string()
}

fn default_project_tag() -> String {
    "project".to_string()
}
