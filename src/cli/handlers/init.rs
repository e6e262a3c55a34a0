use std::fs;
use std::path::{Component, Path};

use chrono::Utc;
use tracing::info;

use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::io::vault_io::{self, GTD_DIR};
use crate::model::config::PathsConfig;

const INBOX_TEMPLATE: &str = "# Inbox\n";

/// Infer a vault name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reject absolute paths and paths leaving the vault
fn validate_vault_path(flag: &str, path: &str) -> Result<(), String> {
    let p = Path::new(path);
    if p.is_absolute() || p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(format!("--{} must be a path inside the vault: {}", flag, path));
    }
    Ok(())
}

pub fn cmd_init(args: InitArgs, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let gtd_dir = root.join(GTD_DIR);
    let config_file = config_io::config_path(&gtd_dir);

    if config_file.is_file() && !args.force {
        return Err(format!(
            "gtd vault already exists in ./{}/ (use --force to reinitialize)",
            GTD_DIR
        )
        .into());
    }

    // Nested vaults are allowed; say so
    if let Some(parent) = root.parent()
        && let Ok(parent_root) = vault_io::discover_vault(parent)
    {
        eprintln!("Note: enclosing vault found at {}/", parent_root.display());
    }

    if let Some(ref inbox) = args.inbox {
        validate_vault_path("inbox", inbox)?;
    }
    if let Some(ref folder) = args.projects_folder {
        validate_vault_path("projects-folder", folder)?;
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let mut doc = config_io::default_config_document(&name);
    if let Some(ref inbox) = args.inbox {
        config_io::set_path(&mut doc, "inbox_file", inbox);
    }
    if let Some(ref folder) = args.projects_folder {
        config_io::set_path(&mut doc, "projects_folder", folder);
    }

    fs::create_dir_all(&gtd_dir)?;
    if let Ok(previous) = fs::read_to_string(&config_file) {
        recovery::log_recovery(
            &gtd_dir,
            RecoveryEntry {
                timestamp: Utc::now(),
                category: RecoveryCategory::Write,
                description: "vault.toml replaced by init --force".to_string(),
                fields: Vec::new(),
                body: previous,
            },
        );
    }
    config_io::write_config(&gtd_dir, &doc)?;
    info!(vault = %root.display(), "initialized vault");

    let inbox_file = args
        .inbox
        .unwrap_or_else(|| PathsConfig::default().inbox_file);
    let inbox_path = root.join(&inbox_file);
    let created_inbox = !inbox_path.exists();
    if created_inbox {
        if let Some(parent) = inbox_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&inbox_path, INBOX_TEMPLATE)?;
    }

    println!("Initialized gtd vault: {}", name);
    println!("  config: {}/{}", GTD_DIR, config_io::CONFIG_FILE);
    if created_inbox {
        println!("  inbox:  {} (created)", inbox_file);
    } else {
        println!("  inbox:  {}", inbox_file);
    }

    Ok(())
}
