use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "declarest")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile declared REST resources with a remote API", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Context file (defaults to ~/.config/declarest/config.toml)
    #[arg(short, long, global = true, env = "DECLAREST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch a resource (or a collection, with a trailing slash) from the server
    Get(GetArgs),

    /// List remote items of a collection
    List(ListArgs),

    /// Create or update remote resources from the local repository
    Save(SaveArgs),

    /// Create a remote resource from its local file
    Create {
        /// Logical resource path (e.g., /users/ana)
        path: String,
    },

    /// Update an existing remote resource from its local file
    Update {
        /// Logical resource path
        path: String,
    },

    /// Delete a remote resource
    Delete {
        /// Logical resource path
        path: String,
    },

    /// Show the remote paths a logical path maps to
    Path {
        /// Logical path
        path: String,
    },

    /// Show the metadata in effect for a path
    Metadata {
        /// Logical path
        path: String,

        /// Show merged fragments before template rendering
        #[arg(long)]
        raw: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Get / List / Save
// ============================================================================

#[derive(Parser)]
pub struct GetArgs {
    /// Logical path (trailing slash for a collection)
    pub path: String,

    /// Also write the fetched resource to the local repository
    #[arg(short, long)]
    pub save: bool,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Logical collection path; omit with --local
    pub path: Option<String>,

    /// List every collection that holds a local resource
    #[arg(short, long)]
    pub local: bool,

    /// Print id, alias and alias path for each item
    #[arg(short, long)]
    pub entries: bool,
}

#[derive(Parser)]
pub struct SaveArgs {
    /// Logical resource paths (default: every local resource)
    pub paths: Vec<String>,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

// ============================================================================
// Tests
// ============================================================================
