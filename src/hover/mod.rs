//! Parses clangd's markdown hover responses into structured documentation
//! and formats pieces of that structure back into text for
//! the query command layer.

pub mod format;
pub mod parser;
pub mod types;

pub use parser::parse;
pub use types::{AccessLevel, Modifier, ParsedDocumentation};

use tower_lsp::lsp_types::{Hover, HoverContents, MarkedString};

/// Flatten whatever shape of hover contents clangd sent (scalar markup,
/// legacy marked-string, or an array of either) into one markdown string.
pub fn hover_text(hover: &Hover) -> String {
    match &hover.contents {
        HoverContents::Scalar(marked) => marked_string_text(marked),
        HoverContents::Markup(markup) => markup.value.clone(),
        HoverContents::Array(items) => items
            .iter()
            .map(marked_string_text)
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn marked_string_text(marked: &MarkedString) -> String {
    match marked {
        MarkedString::String(s) => s.clone(),
        MarkedString::LanguageString(ls) => format!("```{}\n{}\n```", ls.language, ls.value),
    }
}
