//! `view <name|path:line:col>` — reconstruct a symbol's full source extent
//! from folding ranges. The delicate part of this crate:
//! clangd's workspace-symbol range is frequently just the name, so the
//! actual declaration/body span has to be inferred from folding ranges
//! with a document-symbol fallback.

use std::path::Path;

use tower_lsp::lsp_types::{DocumentSymbol, DocumentSymbolResponse, FoldingRange, SymbolKind, Url};

use crate::error::Result;
use crate::lsp::ClangdAdapter;
use crate::query::{self, ranking, Target};

/// Kinds for which the view forces the start back to the declaration line
/// and walks backward for a preceding comment block.
fn is_container_or_callable(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::CLASS
            | SymbolKind::STRUCT
            | SymbolKind::ENUM
            | SymbolKind::INTERFACE
            | SymbolKind::FUNCTION
            | SymbolKind::METHOD
    )
}

fn is_comment_block_kind(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::CLASS | SymbolKind::STRUCT | SymbolKind::ENUM | SymbolKind::INTERFACE
    )
}

const MAX_COMMENT_SCAN: usize = 50;

pub async fn run(adapter: &ClangdAdapter, project_root: &Path, arg: &str) -> Result<String> {
    let (label, uri, name, kind, start_position, match_count) = match query::parse_target(arg) {
        Target::Location { path, position } => {
            let absolute = if path.is_absolute() {
                path
            } else {
                project_root.join(path)
            };
            let uri = crate::lsp::file_uri(&absolute)?;
            let (name, kind) = symbol_at_position(adapter, &uri, position).await?;
            (arg.to_string(), uri, name, kind, position, 1)
        }
        Target::Name(name) => {
            let preamble = query::preamble(adapter, &name).await?;
            let Some(top) = preamble.candidates.first() else {
                return Ok(query::not_found(&name));
            };
            let (uri, position) = match &top.location {
                tower_lsp::lsp_types::OneOf::Left(loc) => (loc.uri.clone(), loc.range.start),
                tower_lsp::lsp_types::OneOf::Right(loc) => {
                    (loc.uri.clone(), tower_lsp::lsp_types::Position::new(0, 0))
                }
            };
            (
                ranking::qualified_name(top),
                uri,
                ranking::qualified_name(top),
                top.kind,
                position,
                preamble.candidates.len(),
            )
        }
    };
    let slice = extent_source(adapter, &uri, start_position.line, kind, &name).await?;

    let relative = query::relative_path(project_root, &query::to_file_path(&uri)?);
    let (display_line, display_col) = query::display_position(start_position);

    let mut out = format!(
        "Found {} '{}' at {}:{display_line}:{display_col}\n",
        query::kind_display_name(kind),
        label,
        relative.display()
    );
    if match_count > 1 {
        out.push_str(&format!(
            "(Found {match_count} matches, showing the most relevant one)\n"
        ));
    }
    out.push_str(&query::fenced_cpp_block(&slice));
    Ok(out)
}

/// The reusable half of `view`: resolve a symbol's extent and return the
/// source text slice, with no header. Shared with `show`, which wants the
/// same reconstruction for both a declaration and a definition location.
pub async fn extent_source(
    adapter: &ClangdAdapter,
    uri: &Url,
    start_line: u32,
    kind: SymbolKind,
    name: &str,
) -> Result<String> {
    let path = query::to_file_path(uri)?;
    let lines = query::read_lines(&path).await?;
    let folding_ranges = adapter.folding_range(uri).await?;

    let (mut start, end) = resolve_extent(adapter, uri, &folding_ranges, start_line, kind, name).await?;

    if is_container_or_callable(kind) {
        start = start_line;
    }
    let start = if is_comment_block_kind(kind) {
        scan_backward_for_comments(&lines, start)
    } else {
        start
    };

    let start = start.min(lines.len().saturating_sub(1) as u32);
    let end = end.min(lines.len().saturating_sub(1) as u32);

    Ok(lines
        .get(start as usize..=end as usize)
        .map(|s| s.join("\n"))
        .unwrap_or_default())
}

async fn symbol_at_position(
    adapter: &ClangdAdapter,
    uri: &Url,
    position: tower_lsp::lsp_types::Position,
) -> Result<(String, SymbolKind)> {
    if let DocumentSymbolResponse::Nested(symbols) = adapter.document_symbol(uri).await? {
        if let Some(found) = find_enclosing(&symbols, position.line) {
            return Ok((found.name.clone(), found.kind));
        }
    }
    Ok((String::new(), SymbolKind::VARIABLE))
}

fn find_enclosing(symbols: &[DocumentSymbol], line: u32) -> Option<&DocumentSymbol> {
    for symbol in symbols {
        if symbol.range.start.line <= line && line <= symbol.range.end.line {
            if let Some(children) = &symbol.children {
                if let Some(nested) = find_enclosing(children, line) {
                    return Some(nested);
                }
            }
            return Some(symbol);
        }
    }
    None
}

/// Pick the folding range that best represents
/// this symbol's body, with a document-symbol fallback.
async fn resolve_extent(
    adapter: &ClangdAdapter,
    uri: &Url,
    folding_ranges: &[FoldingRange],
    start_line: u32,
    kind: SymbolKind,
    name: &str,
) -> Result<(u32, u32)> {
    let range_at = folding_ranges.iter().find(|r| r.start_line == start_line);
    let range_after = range_at.and_then(|at| {
        folding_ranges
            .iter()
            .find(|r| r.start_line == at.end_line || r.start_line == at.end_line + 1)
    });

    if let Some(chosen) = range_after.or(range_at) {
        return Ok((chosen.start_line, chosen.end_line));
    }

    if let Some(next) = folding_ranges
        .iter()
        .filter(|r| r.start_line > start_line)
        .min_by_key(|r| r.start_line)
    {
        return Ok((next.start_line, next.end_line));
    }

    if let DocumentSymbolResponse::Nested(symbols) = adapter.document_symbol(uri).await? {
        if let Some(found) = find_by_line_and_name(&symbols, start_line, name) {
            return Ok((found.range.start.line, found.range.end.line));
        }
    }

    let _ = kind;
    Ok((start_line, start_line))
}

fn find_by_line_and_name<'a>(
    symbols: &'a [DocumentSymbol],
    line: u32,
    name: &str,
) -> Option<&'a DocumentSymbol> {
    for symbol in symbols {
        if symbol.range.start.line <= line && line <= symbol.range.end.line && symbol.name == name {
            return Some(symbol);
        }
        if let Some(children) = &symbol.children {
            if let Some(found) = find_by_line_and_name(children, line, name) {
                return Some(found);
            }
        }
    }
    None
}

/// Walk backward up to 50 lines to include a preceding comment block
/// `//…`, `/*…`, `* …`, `*/` lines are included;
/// blank lines only extend inclusion while already inside a comment block.
fn scan_backward_for_comments(lines: &[String], start: u32) -> u32 {
    let mut cursor = start;
    let mut scanned = 0;
    let mut in_comment = false;

    while cursor > 0 && scanned < MAX_COMMENT_SCAN {
        let candidate = cursor - 1;
        let trimmed = lines.get(candidate as usize).map(|s| s.trim()).unwrap_or("");

        let is_comment_line =
            trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*');
        let is_blank = trimmed.is_empty();

        if is_comment_line {
            in_comment = true;
            cursor = candidate;
        } else if is_blank && in_comment {
            cursor = candidate;
        } else {
            break;
        }
        scanned += 1;
    }

    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn scan_backward_includes_preceding_comment_block() {
        let src = lines("// Does a thing.\n// Really.\nvoid Foo();\n");
        let start = scan_backward_for_comments(&src, 2);
        assert_eq!(start, 0);
    }

    #[test]
    fn scan_backward_stops_at_non_comment_line() {
        let src = lines("int x;\nvoid Foo();\n");
        let start = scan_backward_for_comments(&src, 1);
        assert_eq!(start, 1);
    }

    #[test]
    fn scan_backward_respects_blank_line_only_inside_comment() {
        // The blank line before the comment gets pulled in too, since it's
        // encountered while still inside the comment-block walk; the scan
        // then stops at the non-comment line above it.
        let src = lines("int x;\n\n// A comment.\nvoid Foo();\n");
        let start = scan_backward_for_comments(&src, 3);
        assert_eq!(start, 1);
    }
}
