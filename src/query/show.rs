//! `show <name>` — print the declaration (from the header) and the
//! definition (from the source file), each reconstructed the same way as
//! `view`.

use std::path::Path;

use crate::error::Result;
use crate::lsp::ClangdAdapter;
use crate::query::{self, view};

const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++"];

pub async fn run(adapter: &ClangdAdapter, project_root: &Path, query: &str) -> Result<String> {
    let preamble = super::preamble(adapter, query).await?;
    let Some(top) = preamble.candidates.first() else {
        return Ok(super::not_found(query));
    };

    let (decl_uri, decl_position) = match &top.location {
        tower_lsp::lsp_types::OneOf::Left(loc) => (loc.uri.clone(), loc.range.start),
        tower_lsp::lsp_types::OneOf::Right(loc) => {
            (loc.uri.clone(), tower_lsp::lsp_types::Position::new(0, 0))
        }
    };

    let mut sections = Vec::new();

    let decl_source = view::extent_source(adapter, &decl_uri, decl_position.line, top.kind, &top.name).await?;
    sections.push(render_section(project_root, &decl_uri, "declaration", &decl_source)?);

    let definitions = adapter.definition(&decl_uri, decl_position).await?;
    if let Some(def_location) = definitions
        .iter()
        .find(|loc| !is_header(&loc.uri) && loc.uri != decl_uri)
    {
        let def_source = view::extent_source(
            adapter,
            &def_location.uri,
            def_location.range.start.line,
            top.kind,
            &top.name,
        )
        .await?;
        sections.push(render_section(project_root, &def_location.uri, "definition", &def_source)?);
    }

    let mut out = String::new();
    if let Some(hint) = &preamble.hint {
        out.push_str(hint);
        out.push('\n');
    }
    out.push_str(&sections.join("\n\n"));
    Ok(out)
}

fn render_section(
    project_root: &Path,
    uri: &tower_lsp::lsp_types::Url,
    label: &str,
    source: &str,
) -> Result<String> {
    let path = query::relative_path(project_root, &query::to_file_path(uri)?);
    Ok(format!(
        "From {} ({label})\n{}",
        path.display(),
        query::fenced_cpp_block(source)
    ))
}

fn is_header(uri: &tower_lsp::lsp_types::Url) -> bool {
    uri.path()
        .rsplit('.')
        .next()
        .map(|ext| HEADER_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
