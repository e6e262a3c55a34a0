use std::path::PathBuf;

use super::config::VaultConfig;
use super::inbox::InboxItem;
use super::project::ProjectRecord;

/// A fully loaded notes vault
#[derive(Debug)]
pub struct Vault {
    /// Root directory of the vault (parent of `.gtd/`)
    pub root: PathBuf,
    /// Path to the `.gtd/` directory
    pub gtd_dir: PathBuf,
    /// Parsed vault.toml
    pub config: VaultConfig,
    /// Project notes in path order
    pub projects: Vec<ProjectRecord>,
    /// Inbox items: lines of the inbox file, then notes in the inbox folder
    pub inbox: Vec<InboxItem>,
}
