//! Re-ranks `workspace/symbol` results before a query command picks its
//! top candidate: clangd's own ordering is trusted, but a
//! light re-sort demotes namespaces and promotes exact matches.

use tower_lsp::lsp_types::{SymbolKind, WorkspaceSymbol};

/// The name a user would actually type to find this symbol again:
/// `container::name`, or just `name` with no container.
pub fn qualified_name(symbol: &WorkspaceSymbol) -> String {
    match &symbol.container_name {
        Some(container) if !container.is_empty() => format!("{container}::{}", symbol.name),
        _ => symbol.name.clone(),
    }
}

fn score(symbol: &WorkspaceSymbol, query: &str) -> i32 {
    let mut score = 0;
    if symbol.kind == SymbolKind::NAMESPACE {
        score -= 10;
    }
    if symbol.name == query {
        score += 20;
    }
    if qualified_name(symbol) == query {
        score += 15;
    }
    score
}

/// Stable re-sort by descending score; ties keep clangd's original order.
pub fn rerank(mut symbols: Vec<WorkspaceSymbol>, query: &str) -> Vec<WorkspaceSymbol> {
    symbols.sort_by(|a, b| score(b, query).cmp(&score(a, query)));
    symbols
}

/// Display prefix for `search`'s bulleted list: the container-like kinds
/// get a lowercase keyword prefix, everything else (methods, functions,
/// fields, variables) gets none.
pub fn kind_prefix(kind: SymbolKind) -> Option<&'static str> {
    match kind {
        SymbolKind::CLASS => Some("class"),
        SymbolKind::STRUCT => Some("struct"),
        SymbolKind::ENUM => Some("enum"),
        SymbolKind::INTERFACE => Some("interface"),
        SymbolKind::NAMESPACE => Some("namespace"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::{OneOf, Url, WorkspaceSymbolLocation};

    fn symbol(name: &str, kind: SymbolKind, container: Option<&str>) -> WorkspaceSymbol {
        WorkspaceSymbol {
            name: name.to_string(),
            kind,
            tags: None,
            container_name: container.map(|s| s.to_string()),
            location: OneOf::Right(WorkspaceSymbolLocation {
                uri: Url::parse("file:///a.h").unwrap(),
            }),
            data: None,
        }
    }

    #[test]
    fn exact_name_match_is_promoted_above_namespace() {
        let ns = symbol("GameObject", SymbolKind::NAMESPACE, None);
        let exact = symbol("GameObject", SymbolKind::CLASS, Some("game_engine"));
        let reranked = rerank(vec![ns, exact.clone()], "GameObject");
        assert_eq!(reranked[0].kind, SymbolKind::CLASS);
    }

    #[test]
    fn exact_qualified_match_wins_over_exact_name_only() {
        let plain = symbol("Update", SymbolKind::METHOD, Some("OtherClass"));
        let qualified = symbol("Update", SymbolKind::METHOD, Some("GameObject"));
        let reranked = rerank(
            vec![plain, qualified.clone()],
            "GameObject::Update",
        );
        assert_eq!(reranked[0].container_name.as_deref(), Some("GameObject"));
    }

    #[test]
    fn kind_prefix_covers_container_like_kinds_only() {
        assert_eq!(kind_prefix(SymbolKind::CLASS), Some("class"));
        assert_eq!(kind_prefix(SymbolKind::METHOD), None);
        assert_eq!(kind_prefix(SymbolKind::VARIABLE), None);
    }

}
