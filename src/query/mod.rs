//! Composes the LSP adapter's primitives into the seven user-facing
//! queries, plus the view-extent reconstruction.

pub mod hierarchy;
pub mod interface;
pub mod ranking;
pub mod search;
pub mod show;
pub mod signature;
pub mod usages;
pub mod view;

use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{Position, SymbolKind, Url, WorkspaceSymbol};

use crate::error::{CliError, Result};
use crate::lsp::ClangdAdapter;

/// Either a bare symbol name, or an explicit `path:line:col` (the file and
/// position are 0-indexed internally; the CLI argument is 1-indexed).
#[derive(Debug, Clone)]
pub enum Target {
    Name(String),
    Location { path: PathBuf, position: Position },
}

/// Parse a command argument as `path:line:col` if it looks like one
/// (contains a colon and the trailing segments are both integers),
/// otherwise treat the whole argument as a symbol name.
pub fn parse_target(arg: &str) -> Target {
    let parts: Vec<&str> = arg.rsplitn(3, ':').collect();
    if parts.len() == 3 {
        if let (Ok(col), Ok(line)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
            if col >= 1 && line >= 1 {
                let path = parts[2];
                return Target::Location {
                    path: PathBuf::from(path),
                    position: Position::new(line - 1, col - 1),
                };
            }
        }
    }
    Target::Name(arg.to_string())
}

pub fn not_found(query: &str) -> String {
    format!("No symbols found matching \"{query}\"")
}

/// Result of the shared preamble every name-based command runs.
pub struct Preamble {
    pub hint: Option<String>,
    pub candidates: Vec<WorkspaceSymbol>,
}

/// Shared preamble for every query command: warn on whitespace, run
/// `workspaceSymbol`, re-rank, hand back the sorted candidate list.
pub async fn preamble(adapter: &ClangdAdapter, query: &str) -> Result<Preamble> {
    let hint = if query.chars().any(char::is_whitespace) {
        Some(format!(
            "Hint: \"{query}\" looks like more than one identifier; queries usually name a single symbol."
        ))
    } else {
        None
    };

    let symbols = adapter.workspace_symbol(query).await?;
    let candidates = ranking::rerank(symbols, query);
    Ok(Preamble { hint, candidates })
}

pub fn relative_path(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
}

pub fn to_file_path(uri: &Url) -> Result<PathBuf> {
    uri.to_file_path()
        .map_err(|_| CliError::Parse(format!("not a file URI: {uri}")))
}

pub async fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Discovery(format!("reading {}: {e}", path.display())))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// `1`-indexed line/col for display, from a 0-indexed LSP [`Position`].
pub fn display_position(position: Position) -> (u32, u32) {
    (position.line + 1, position.character + 1)
}

pub fn kind_display_name(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::CLASS => "class",
        SymbolKind::STRUCT => "struct",
        SymbolKind::ENUM => "enum",
        SymbolKind::INTERFACE => "interface",
        SymbolKind::NAMESPACE => "namespace",
        SymbolKind::FUNCTION => "function",
        SymbolKind::METHOD => "method",
        SymbolKind::CONSTRUCTOR => "constructor",
        SymbolKind::FIELD => "field",
        SymbolKind::VARIABLE => "variable",
        SymbolKind::ENUM_MEMBER => "enumerator",
        _ => "symbol",
    }
}

pub fn fenced_cpp_block(text: &str) -> String {
    format!("```cpp\n{text}\n```")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_target_recognizes_file_line_col() {
        match parse_target("src/foo.cpp:12:4") {
            Target::Location { path, position } => {
                assert_eq!(path, PathBuf::from("src/foo.cpp"));
                assert_eq!(position, Position::new(11, 3));
            }
            Target::Name(_) => panic!("expected a location"),
        }
    }

    #[test]
    fn parse_target_falls_back_to_name() {
        match parse_target("GameObject") {
            Target::Name(name) => assert_eq!(name, "GameObject"),
            Target::Location { .. } => panic!("expected a name"),
        }
    }

    #[test]
    fn parse_target_rejects_non_numeric_suffix_as_name() {
        match parse_target("game_engine::GameObject") {
            Target::Name(name) => assert_eq!(name, "game_engine::GameObject"),
            Target::Location { .. } => panic!("expected a name"),
        }
    }
}
