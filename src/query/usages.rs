//! `usages <name|path:line:col>` — find references to a symbol or an
//! exact location, grouped by file.

use std::path::Path;

use tower_lsp::lsp_types::{Position, Url};

use crate::error::Result;
use crate::lsp::ClangdAdapter;
use crate::query::{self, ranking, Target};

pub async fn run(adapter: &ClangdAdapter, project_root: &Path, arg: &str) -> Result<String> {
    let (selected_name, uri, position) = match query::parse_target(arg) {
        Target::Location { path, position } => {
            let absolute = if path.is_absolute() {
                path
            } else {
                project_root.join(path)
            };
            let uri = crate::lsp::file_uri(&absolute)?;
            (arg.to_string(), uri, position)
        }
        Target::Name(name) => {
            let preamble = query::preamble(adapter, &name).await?;
            let Some(top) = preamble.candidates.first() else {
                return Ok(query::not_found(&name));
            };
            let (uri, position) = symbol_location(top);
            (ranking::qualified_name(top), uri, position)
        }
    };

    let locations = adapter.references(&uri, position, true).await?;
    if locations.is_empty() {
        return Ok(format!(
            "Selected symbol: {selected_name}\nFound 0 references:"
        ));
    }

    let mut out = format!(
        "Selected symbol: {selected_name}\nFound {} references:\n",
        locations.len()
    );

    for location in &locations {
        let path = query::relative_path(project_root, &query::to_file_path(&location.uri)?);
        let (line, col) = query::display_position(location.range.start);
        let snippet = snippet_for(&location.uri, location.range.start).await.unwrap_or_default();
        out.push_str(&format!(
            "- {}:{line}:{col}: {}\n",
            path.display(),
            snippet.trim()
        ));
    }

    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

fn symbol_location(symbol: &tower_lsp::lsp_types::WorkspaceSymbol) -> (Url, Position) {
    match &symbol.location {
        tower_lsp::lsp_types::OneOf::Left(loc) => (loc.uri.clone(), loc.range.start),
        tower_lsp::lsp_types::OneOf::Right(loc) => (loc.uri.clone(), Position::new(0, 0)),
    }
}

async fn snippet_for(uri: &Url, position: Position) -> Result<String> {
    let path = query::to_file_path(uri)?;
    let lines = query::read_lines(&path).await?;
    Ok(lines
        .get(position.line as usize)
        .cloned()
        .unwrap_or_default())
}
