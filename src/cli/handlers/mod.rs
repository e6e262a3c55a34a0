mod init;
pub use init::cmd_init;

use std::path::PathBuf;
use std::sync::OnceLock;

/// Vault directory given with -C, resolved once per process
static VAULT_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::lock::FileLock;
use crate::io::recovery;
use crate::io::vault_io::{self, FsStore, VaultError};
use crate::model::vault::Vault;
use crate::ops::check::{self, CheckError, CheckWarning};
use crate::ops::hierarchy::{
    build_project_hierarchy, find_project, flatten_hierarchy, project_display_name,
};
use crate::ops::inbox_ops::{self, Disposition};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;

    if let Some(ref dir) = cli.vault_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        let _ = VAULT_DIR_OVERRIDE.set(abs);
    }

    match cli.command {
        Commands::Init(args) => cmd_init(args, &start_dir()?),

        // Read commands
        Commands::Projects(args) => cmd_projects(args, json),
        Commands::Show(args) => cmd_show(args, json),
        Commands::Inbox => cmd_inbox_list(json),
        Commands::Check => cmd_check(json),
        Commands::Recovery(args) => cmd_recovery(args, json),

        // Write commands
        Commands::Process(args) => cmd_process(args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir() -> Result<PathBuf, VaultError> {
    match VAULT_DIR_OVERRIDE.get() {
        Some(dir) => Ok(dir.clone()),
        None => Ok(std::env::current_dir()?),
    }
}

fn vault_root_cwd() -> Result<PathBuf, VaultError> {
    vault_io::discover_vault(&start_dir()?)
}

fn load_vault_cwd() -> Result<Vault, VaultError> {
    vault_io::load_vault(&vault_root_cwd()?)
}

fn display_name(vault: &Vault, path: &str) -> String {
    format_display_name(&project_display_name(path, &vault.projects))
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_projects(args: ProjectsArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let vault = load_vault_cwd()?;
    let roots = build_project_hierarchy(&vault.projects);

    if json {
        println!("{}", serde_json::to_string_pretty(&roots)?);
        return Ok(());
    }

    if roots.is_empty() {
        println!("(no projects)");
    }
    for node in flatten_hierarchy(&roots) {
        println!("{}", format_project_line(node));
        if args.actions {
            for line in format_project_actions(node) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let vault = load_vault_cwd()?;
    let record = find_project(&vault.projects, &args.project)
        .ok_or_else(|| format!("project not found: {}", args.project))?;

    let roots = build_project_hierarchy(&vault.projects);
    let node = flatten_hierarchy(&roots)
        .into_iter()
        .find(|n| n.record.path == record.path)
        .ok_or_else(|| format!("project not found: {}", args.project))?;
    let name = project_display_name(&record.path, &vault.projects);

    if json {
        let output = ShowJson { name, node };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", format_display_name(&name));
    println!("  path: {}", node.record.path);
    if let Some(ref status) = node.record.status {
        println!("  status: {}", status);
    }
    if let Some(priority) = node.record.priority {
        println!("  priority: {}", priority);
    }
    if !node.record.tags.is_empty() {
        println!("  tags: {}", node.record.tags.join(", "));
    }
    if !node.children.is_empty() {
        println!("\nSub-projects:");
        for child in &node.children {
            println!("  {} ({})", child.record.title, child.all_next_actions.len());
        }
    }
    println!("\nNext actions:");
    if node.all_next_actions.is_empty() {
        println!("  (none)");
    }
    for action in &node.all_next_actions {
        println!("  - [ ] {}", action);
    }
    Ok(())
}

fn cmd_inbox_list(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let vault = load_vault_cwd()?;

    if json {
        let items: Vec<InboxItemJson> = vault
            .inbox
            .iter()
            .enumerate()
            .map(|(i, item)| InboxItemJson {
                index: i + 1,
                item,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        if vault.inbox.is_empty() {
            println!("(inbox is empty)");
        }
        for (i, item) in vault.inbox.iter().enumerate() {
            println!("{}", format_inbox_item(i + 1, item));
        }
    }
    Ok(())
}

fn cmd_check(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let vault = load_vault_cwd()?;
    let result = check::check_vault(&vault);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            match err {
                CheckError::ParentCycle { project, parent } => {
                    println!("  {}: parent {} would create a cycle", project, parent);
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            println!();
        }
        println!("Warnings:");
        for warn in &result.warnings {
            match warn {
                CheckWarning::UnresolvedParent { project, reference } => {
                    println!("  {}: parent {} not found", project, reference);
                }
                CheckWarning::DuplicateTitle { title, paths } => {
                    println!("  title \"{}\" is shared by: {}", title, paths.join(", "));
                }
                CheckWarning::StalledProject { project } => {
                    println!("  {} has no next actions", display_name(&vault, project));
                }
            }
        }
    }
    if result.valid {
        println!("✓ vault is valid");
    } else {
        println!("✗ vault has errors");
    }
    Ok(())
}

fn cmd_recovery(args: RecoveryArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let root = vault_root_cwd()?;
    let entries = recovery::read_recovery_entries(&root.join(vault_io::GTD_DIR), Some(args.limit));

    if json {
        let items: Vec<RecoveryEntryJson> = entries.iter().map(RecoveryEntryJson::from).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("(recovery log is empty)");
    }
    for entry in &entries {
        println!(
            "{}  {}: {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.category,
            entry.description
        );
        for (key, value) in &entry.fields {
            println!("     {}: {}", key, value);
        }
        for line in entry.body.lines() {
            println!("     | {}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_process(args: ProcessArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let vault = load_vault_cwd()?;
    let _lock = FileLock::acquire_default(&vault.gtd_dir)?;

    let items = inbox_ops::select_items(&vault.inbox, &args.items)?;
    let disposition = if args.next_action {
        Disposition::NextAction {
            file: vault.config.paths.next_actions_file.clone(),
        }
    } else if let Some(ref query) = args.project {
        let record = find_project(&vault.projects, query)
            .ok_or_else(|| format!("project not found: {}", query))?;
        Disposition::Project {
            path: record.path.clone(),
        }
    } else {
        Disposition::Delete
    };

    let mut store = FsStore::new(&vault.root);
    let report = inbox_ops::process_items_with(&mut store, &items, &disposition, |processed| {
        recovery::log_removed_item(
            &vault.gtd_dir,
            processed.item.path(),
            processed.removed_line,
            &processed.removed,
        );
    });

    if json {
        println!("{}", serde_json::to_string_pretty(&report_to_json(&report))?);
    } else {
        let verb = match &disposition {
            Disposition::Delete => "deleted".to_string(),
            Disposition::NextAction { file } => format!("filed to {}", file),
            Disposition::Project { path } => format!("filed to {}", display_name(&vault, path)),
        };
        for processed in &report.processed {
            println!("{}: {}", verb, processed.item.text);
        }
    }
    for failed in &report.failed {
        eprintln!("failed: {}: {}", failed.item.text, failed.error);
    }

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} items could not be processed",
            report.failed.len(),
            items.len()
        )
        .into())
    }
}
