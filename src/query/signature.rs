//! `signature <name>` — print up to three matching function/method/
//! constructor signatures with their parsed documentation.

use std::path::Path;

use tower_lsp::lsp_types::SymbolKind;

use crate::error::Result;
use crate::hover;
use crate::lsp::ClangdAdapter;
use crate::query::{self, ranking};

const MAX_RESULTS: usize = 3;
const WRAP_WIDTH: usize = 80;

pub async fn run(adapter: &ClangdAdapter, project_root: &Path, query: &str) -> Result<String> {
    let preamble = query::preamble(adapter, query).await?;

    let candidates: Vec<_> = preamble
        .candidates
        .into_iter()
        .filter(|s| {
            matches!(
                s.kind,
                SymbolKind::FUNCTION | SymbolKind::METHOD | SymbolKind::CONSTRUCTOR
            )
        })
        .take(MAX_RESULTS)
        .collect();

    if candidates.is_empty() {
        return Ok(query::not_found(query));
    }

    let mut entries = Vec::with_capacity(candidates.len());
    for symbol in &candidates {
        entries.push(render_entry(adapter, project_root, symbol).await?);
    }

    let mut out = String::new();
    if let Some(hint) = &preamble.hint {
        out.push_str(hint);
        out.push('\n');
    }
    out.push_str(&entries.join("\n\n---\n\n"));
    Ok(out)
}

async fn render_entry(
    adapter: &ClangdAdapter,
    project_root: &Path,
    symbol: &tower_lsp::lsp_types::WorkspaceSymbol,
) -> Result<String> {
    let (uri, position) = match &symbol.location {
        tower_lsp::lsp_types::OneOf::Left(loc) => (loc.uri.clone(), loc.range.start),
        tower_lsp::lsp_types::OneOf::Right(loc) => (loc.uri.clone(), tower_lsp::lsp_types::Position::new(0, 0)),
    };
    let path = query::relative_path(project_root, &query::to_file_path(&uri)?);
    let (line, col) = query::display_position(position);

    let doc = match adapter.hover(&uri, position).await? {
        Some(h) => hover::parse(&hover::hover_text(&h)),
        None => hover::ParsedDocumentation::default(),
    };

    let mut lines = vec![format!(
        "{} at {}:{line}:{col}",
        ranking::qualified_name(symbol),
        path.display()
    )];

    if let Some(access) = doc.access_level {
        lines.push(format!("Access: {access}"));
    }
    if let Some(signature) = &doc.signature {
        lines.push(signature.clone());
    }
    if let Some(return_type) = &doc.return_type {
        lines.push(format!("Returns: {return_type}"));
    }
    if let Some(template_params) = &doc.template_params {
        lines.push(format!("Template: {template_params}"));
    }
    if let Some(parameters) = &doc.parameters_text {
        lines.push(parameters.clone());
    }
    if let Some(description) = &doc.description {
        lines.extend(crate::hover::format::wrap_text(description, WRAP_WIDTH));
    }
    if !doc.modifiers.is_empty() {
        let modifiers = doc
            .modifiers
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("Modifiers: {modifiers}"));
    }

    Ok(lines.join("\n"))
}
