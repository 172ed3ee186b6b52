//! Error taxonomy shared by the client and the daemon.
//!
//! Every error the CLI can surface falls into one of the kinds below. The
//! kind, not the message, decides the exit code and whether the text goes to
//! stdout (informational) or stderr (actionable).

use thiserror::Error;

/// A handled error, tagged with a taxonomy kind that decides its exit
/// code and display channel.
#[derive(Debug, Error)]
pub enum CliError {
    /// Malformed flag, bad `file:line:col`, whitespace in a symbol query.
    #[error("{0}")]
    UserInput(String),

    /// No `CMakeLists.txt`, stale lock that can't be cleaned up, daemon spawn failure.
    #[error("{0}")]
    Discovery(String),

    /// clangd crashed, EOF on its stdout, framing corruption.
    #[error("{0}")]
    LspTransport(String),

    /// clangd returned a JSON-RPC error, or a request timed out.
    #[error("{0}")]
    LspRequest(String),

    /// No matching symbol/reference. Not a failure: exit code 0.
    #[error("{0}")]
    NotFound(String),

    /// Hover markdown didn't parse the way the heuristics expected.
    #[error("{0}")]
    Parse(String),
}

impl CliError {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound(_) => 0,
            _ => 1,
        }
    }

    /// Whether this error's message belongs on stdout (informational) or
    /// stderr (actionable, user-facing remediation).
    pub fn is_informational(&self) -> bool {
        matches!(self, CliError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
