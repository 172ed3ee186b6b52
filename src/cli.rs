//! Command-line surface: one subcommand per query, plus the
//! hidden `daemon` command used internally when a client spawns one.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "clangd-query",
    about = "Fast command-line code intelligence for large C++ codebases",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Maximum number of results for commands that list several (search).
    #[arg(long, global = true)]
    pub limit: Option<usize>,

    /// Per-request timeout in seconds, overriding the adapter's default.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Verbose logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List symbols matching a name.
    Search { query: String },
    /// Print the declaration and definition of a symbol.
    Show { query: String },
    /// Reconstruct a symbol's full source extent.
    View { query: String },
    /// Find references to a symbol.
    Usages { query: String },
    /// Print a symbol's super/subtype tree.
    Hierarchy { query: String },
    /// Print a function or method's signature and documentation.
    Signature { query: String },
    /// Print a class or struct's public interface.
    Interface { query: String },
    /// Report whether the daemon's clangd session is ready.
    Status,
    /// Print the tail of the daemon's log file.
    Logs,
    /// Ask the daemon to shut down.
    Shutdown,
    /// Run the daemon in the foreground for `project_root` (internal).
    #[command(hide = true)]
    Daemon { project_root: PathBuf },
}

impl Command {
    /// The wire-protocol command name and its single positional argument,
    /// for every variant but `Daemon` (handled separately by the caller).
    pub fn as_request_parts(&self) -> Option<(&'static str, Vec<String>)> {
        match self {
            Command::Search { query } => Some(("search", vec![query.clone()])),
            Command::Show { query } => Some(("show", vec![query.clone()])),
            Command::View { query } => Some(("view", vec![query.clone()])),
            Command::Usages { query } => Some(("usages", vec![query.clone()])),
            Command::Hierarchy { query } => Some(("hierarchy", vec![query.clone()])),
            Command::Signature { query } => Some(("signature", vec![query.clone()])),
            Command::Interface { query } => Some(("interface", vec![query.clone()])),
            Command::Status => Some(("status", Vec::new())),
            Command::Logs => Some(("logs", Vec::new())),
            Command::Shutdown => Some(("shutdown", Vec::new())),
            Command::Daemon { .. } => None,
        }
    }
}
