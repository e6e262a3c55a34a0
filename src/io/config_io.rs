use std::fs;
use std::path::{Path, PathBuf};

use crate::io::vault_io::VaultError;
use crate::model::config::{PathsConfig, ProjectsConfig, VaultConfig};

pub const CONFIG_FILE: &str = "vault.toml";

pub fn config_path(gtd_dir: &Path) -> PathBuf {
    gtd_dir.join(CONFIG_FILE)
}

/// Read the vault config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_config(gtd_dir: &Path) -> Result<(VaultConfig, toml_edit::DocumentMut), VaultError> {
    let path = config_path(gtd_dir);
    let text = fs::read_to_string(&path).map_err(|source| VaultError::ReadError {
        path: path.clone(),
        source,
    })?;
    let config: VaultConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(gtd_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), VaultError> {
    let path = config_path(gtd_dir);
    fs::write(&path, doc.to_string()).map_err(|source| VaultError::WriteError { path, source })
}

/// The config written by `gtd init`, with every default spelled out
pub fn default_config_document(name: &str) -> toml_edit::DocumentMut {
    let paths = PathsConfig::default();
    let projects = ProjectsConfig::default();

    let mut doc = toml_edit::DocumentMut::new();
    doc["vault"] = toml_edit::table();
    doc["vault"]["name"] = toml_edit::value(name);

    doc["paths"] = toml_edit::table();
    doc["paths"]["projects_folder"] = toml_edit::value(paths.projects_folder);
    doc["paths"]["inbox_file"] = toml_edit::value(paths.inbox_file);
    doc["paths"]["inbox_folder"] = toml_edit::value(paths.inbox_folder);
    doc["paths"]["next_actions_file"] = toml_edit::value(paths.next_actions_file);

    doc["projects"] = toml_edit::table();
    doc["projects"]["tag"] = toml_edit::value(projects.tag);
    doc
}

/// Set one `[paths]` entry, creating the table if needed
pub fn set_path(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) {
    if !doc.contains_key("paths") {
        doc["paths"] = toml_edit::table();
    }
    doc["paths"][key] = toml_edit::value(value);
}
