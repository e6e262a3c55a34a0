use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gtd",
    about = concat!("gtd v", env!("CARGO_PKG_VERSION"), " - getting things done in plain markdown"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different vault directory
    #[arg(short = 'C', long = "vault-dir", global = true)]
    pub vault_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a vault in the current directory
    Init(InitArgs),
    /// Show the project hierarchy
    Projects(ProjectsArgs),
    /// Show one project with its parent and all next actions
    Show(ShowArgs),
    /// List inbox items
    Inbox,
    /// Process inbox items: delete them, or file them first
    Process(ProcessArgs),
    /// Check project links
    Check,
    /// Show inbox text removed by processing
    Recovery(RecoveryArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Vault name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Inbox file, relative to the vault root
    #[arg(long)]
    pub inbox: Option<String>,
    /// Folder scanned for project notes ("" for the whole vault)
    #[arg(long)]
    pub projects_folder: Option<String>,
    /// Reinitialize even if .gtd/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ProjectsArgs {
    /// List each project's next actions, including sub-projects'
    #[arg(long)]
    pub actions: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Project path or title
    pub project: String,
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Inbox item numbers, as listed by `gtd inbox`
    #[arg(required = true)]
    pub items: Vec<usize>,
    /// Append the items to the next-actions file before removing them
    #[arg(long, conflicts_with = "project")]
    pub next_action: bool,
    /// Add the items to this project's next actions before removing them
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value = "10")]
    pub limit: usize,
}
