//! The language-server adapter: everything needed to hold one live clangd
//! session and speak LSP to it.

pub mod adapter;
pub mod documents;
pub mod pending;
pub mod transport;

pub use adapter::{file_uri, ClangdAdapter, ReadinessState};
