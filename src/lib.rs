//! Fast command-line code intelligence for large C++ codebases, backed by
//! a per-project background daemon holding a live clangd session.

pub mod build_info;
pub mod cli;
pub mod daemon;
pub mod error;
pub mod hover;
pub mod ipc;
pub mod lockfile;
pub mod logging;
pub mod lsp;
pub mod project;
pub mod query;
pub mod watcher;
