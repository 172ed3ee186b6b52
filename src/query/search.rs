//! `search <name>` — list symbols whose name or qualified name fuzzy-matches
//! the query.

use std::path::Path;

use crate::error::Result;
use crate::lsp::ClangdAdapter;
use crate::query::{self, ranking};

pub async fn run(adapter: &ClangdAdapter, project_root: &Path, query: &str, limit: usize) -> Result<String> {
    let preamble = query::preamble(adapter, query).await?;
    let mut out = String::new();

    if let Some(hint) = &preamble.hint {
        out.push_str(hint);
        out.push('\n');
    }

    if preamble.candidates.is_empty() {
        out.push_str(&query::not_found(query));
        return Ok(out);
    }

    for symbol in preamble.candidates.iter().take(limit) {
        let name = ranking::qualified_name(symbol);
        let display_name = match ranking::kind_prefix(symbol.kind) {
            Some(prefix) => format!("{prefix} {name}"),
            None => name,
        };

        let (uri, range) = match &symbol.location {
            tower_lsp::lsp_types::OneOf::Left(loc) => (loc.uri.clone(), Some(loc.range)),
            tower_lsp::lsp_types::OneOf::Right(loc) => (loc.uri.clone(), None),
        };
        let path = query::relative_path(project_root, &query::to_file_path(&uri)?);

        let location_text = match range {
            Some(range) => {
                let (line, col) = query::display_position(range.start);
                format!("{}:{line}:{col}", path.display())
            }
            None => path.display().to_string(),
        };

        out.push_str(&format!("- `{display_name}` at {location_text}\n"));
    }

    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}
