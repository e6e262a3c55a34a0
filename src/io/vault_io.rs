use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::io::config_io;
use crate::io::recovery::atomic_write;
use crate::model::inbox::InboxItem;
use crate::model::vault::Vault;
use crate::parse::{parse_inbox_lines, parse_project};

/// Directory holding the vault config, lock and recovery log
pub const GTD_DIR: &str = ".gtd";

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("not a gtd vault: no {}/{} found", GTD_DIR, config_io::CONFIG_FILE)]
    NotAVault,
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse vault.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit vault.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("could not scan vault: {0}")]
    WalkError(#[from] walkdir::Error),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// File contract
// ---------------------------------------------------------------------------

/// Text access to notes by vault-relative path
pub trait NoteStore {
    fn read(&self, path: &str) -> io::Result<String>;
    fn write(&mut self, path: &str, content: &str) -> io::Result<()>;
    fn delete(&mut self, path: &str) -> io::Result<()>;
}

/// `NoteStore` over a vault directory. Writes are atomic.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl NoteStore for FsStore {
    fn read(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.full_path(path))
    }

    fn write(&mut self, path: &str, content: &str) -> io::Result<()> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&full, content.as_bytes())
    }

    fn delete(&mut self, path: &str) -> io::Result<()> {
        fs::remove_file(self.full_path(path))
    }
}

// ---------------------------------------------------------------------------
// Discovery and loading
// ---------------------------------------------------------------------------

/// Find the vault by walking up from `start`, looking for `.gtd/vault.toml`.
pub fn discover_vault(start: &Path) -> Result<PathBuf, VaultError> {
    let mut current = start.to_path_buf();
    loop {
        if config_io::config_path(&current.join(GTD_DIR)).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(VaultError::NotAVault);
        }
    }
}

/// Load config, project notes and inbox items.
pub fn load_vault(root: &Path) -> Result<Vault, VaultError> {
    let gtd_dir = root.join(GTD_DIR);
    if !gtd_dir.is_dir() {
        return Err(VaultError::NotAVault);
    }
    let (config, _) = config_io::read_config(&gtd_dir)?;

    let mut projects = Vec::new();
    for path in list_markdown_files(root, &config.paths.projects_folder)? {
        let text = read_note(root, &path)?;
        if let Some(record) = parse_project(&path, &text, &config.projects.tag) {
            projects.push(record);
        }
    }
    debug!(count = projects.len(), "loaded project notes");

    let inbox = load_inbox(root, &config.paths.inbox_file, &config.paths.inbox_folder)?;

    Ok(Vault {
        root: root.to_path_buf(),
        gtd_dir,
        config,
        projects,
        inbox,
    })
}

/// Lines of the inbox file, then one item per note in the inbox folder
fn load_inbox(
    root: &Path,
    inbox_file: &str,
    inbox_folder: &str,
) -> Result<Vec<InboxItem>, VaultError> {
    let mut items = Vec::new();
    if !inbox_file.is_empty() && root.join(inbox_file).is_file() {
        let text = read_note(root, inbox_file)?;
        items.extend(parse_inbox_lines(inbox_file, &text));
    }
    if !inbox_folder.is_empty() {
        for path in list_markdown_files(root, inbox_folder)? {
            if path == inbox_file {
                continue;
            }
            let title = note_title(&path);
            items.push(InboxItem::note(path, title));
        }
    }
    Ok(items)
}

/// Markdown files under `folder` (empty = whole vault) as sorted,
/// `/`-separated vault-relative paths. Dot-directories are skipped.
pub fn list_markdown_files(root: &Path, folder: &str) -> Result<Vec<String>, VaultError> {
    let base = root.join(folder);
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let walker = WalkDir::new(&base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file()
            || entry.path().extension().and_then(|e| e.to_str()) != Some("md")
        {
            continue;
        }
        if let Some(rel) = relative_path(root, entry.path()) {
            paths.push(rel);
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

fn read_note(root: &Path, path: &str) -> Result<String, VaultError> {
    let full = root.join(path);
    fs::read_to_string(&full).map_err(|source| VaultError::ReadError { path: full, source })
}

/// File stem of a vault-relative path
pub fn note_title(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}
