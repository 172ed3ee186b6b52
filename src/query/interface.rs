//! `interface <name>` — render a class/struct's public API from its
//! document-symbol children and their hover documentation.

use std::path::Path;

use tower_lsp::lsp_types::{DocumentSymbol, DocumentSymbolResponse, SymbolKind};

use crate::error::Result;
use crate::hover::{self, AccessLevel};
use crate::lsp::ClangdAdapter;
use crate::query::{self, ranking};

const WRAP_WIDTH: usize = 78;
const INDENT: usize = 2;

pub async fn run(adapter: &ClangdAdapter, project_root: &Path, query: &str) -> Result<String> {
    let _ = project_root;
    let preamble = query::preamble(adapter, query).await?;

    let Some(top) = preamble.candidates.first() else {
        return Ok(query::not_found(query));
    };

    if !matches!(top.kind, SymbolKind::CLASS | SymbolKind::STRUCT) {
        return Ok(format!(
            "'{}' is not a class or struct (found kind: {})",
            query,
            query::kind_display_name(top.kind)
        ));
    }

    let uri = match &top.location {
        tower_lsp::lsp_types::OneOf::Left(loc) => loc.uri.clone(),
        tower_lsp::lsp_types::OneOf::Right(loc) => loc.uri.clone(),
    };

    let children = fetch_children(adapter, &uri, &top.name).await?;

    let mut entries = Vec::new();
    for child in &children {
        let doc = match adapter.hover(&uri, child.selection_range.start).await? {
            Some(h) => hover::parse(&hover::hover_text(&h)),
            None => continue,
        };
        if doc.access_level != Some(AccessLevel::Public) {
            continue;
        }

        let mut lines = Vec::new();
        if let Some(signature) = &doc.signature {
            lines.push(signature.clone());
        } else {
            lines.push(child.name.clone());
        }
        if let Some(description) = &doc.description {
            lines.extend(hover::format::wrap_text(description, WRAP_WIDTH));
        }
        entries.push(hover::format::indent_lines(&lines.join("\n"), INDENT));
    }

    if entries.is_empty() {
        return Ok("No public members found.".to_string());
    }

    let mut out = format!("class {}\n\nPublic Interface:\n", ranking::qualified_name(top));
    out.push_str(&entries.join("\n\n"));
    Ok(out)
}

/// Find the top-level document symbol matching `name` and return its
/// children, handling both the flat and hierarchical shapes a server may
/// return.
async fn fetch_children(
    adapter: &ClangdAdapter,
    uri: &tower_lsp::lsp_types::Url,
    name: &str,
) -> Result<Vec<DocumentSymbol>> {
    match adapter.document_symbol(uri).await? {
        DocumentSymbolResponse::Nested(symbols) => Ok(find_nested_children(&symbols, name)),
        DocumentSymbolResponse::Flat(_) => Ok(Vec::new()),
    }
}

fn find_nested_children(symbols: &[DocumentSymbol], name: &str) -> Vec<DocumentSymbol> {
    for symbol in symbols {
        if symbol.name == name {
            return symbol.children.clone().unwrap_or_default();
        }
        if let Some(children) = &symbol.children {
            let found = find_nested_children(children, name);
            if !found.is_empty() {
                return found;
            }
        }
    }
    Vec::new()
}
