//! `hierarchy <name>` — walk `prepareTypeHierarchy` upward (supertypes)
//! and downward (subtypes) and render an indented tree.

use std::path::Path;

use futures::future::BoxFuture;
use tower_lsp::lsp_types::TypeHierarchyItem;

use crate::error::Result;
use crate::lsp::ClangdAdapter;
use crate::query::{self, ranking};

const MAX_DEPTH: usize = 5;

struct TreeNode {
    name: String,
    children: Vec<TreeNode>,
}

pub async fn run(adapter: &ClangdAdapter, project_root: &Path, query: &str) -> Result<String> {
    let _ = project_root;
    let preamble = query::preamble(adapter, query).await?;

    let Some(top) = preamble.candidates.first() else {
        return Ok(query::not_found(query));
    };

    let (uri, position) = match &top.location {
        tower_lsp::lsp_types::OneOf::Left(loc) => (loc.uri.clone(), loc.range.start),
        tower_lsp::lsp_types::OneOf::Right(loc) => (loc.uri.clone(), tower_lsp::lsp_types::Position::new(0, 0)),
    };

    let items = adapter.prepare_type_hierarchy(&uri, position).await?;
    let Some(item) = items.into_iter().next() else {
        return Ok(query::not_found(query));
    };

    let supertypes = build_chain_upward(adapter, &item, MAX_DEPTH).await?;
    let subtypes = build_tree_downward(adapter, &item, MAX_DEPTH).await?;

    let mut out = String::new();
    out.push_str(&format!("{}\n\n", ranking::qualified_name(top)));

    out.push_str("Inherits from:\n");
    if supertypes.is_empty() {
        out.push_str("(none)\n");
    } else {
        render_tree(&supertypes, "", &mut out);
    }

    out.push_str("\nDerived types:\n");
    if subtypes.is_empty() {
        out.push_str("(none)\n");
    } else {
        render_tree(&subtypes, "", &mut out);
    }

    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

/// Supertypes form a chain (each ancestor nested one level inside its
/// child's render), one `prepareTypeHierarchy` "item" per level.
fn build_chain_upward<'a>(
    adapter: &'a ClangdAdapter,
    item: &'a TypeHierarchyItem,
    depth: usize,
) -> BoxFuture<'a, Result<Vec<TreeNode>>> {
    Box::pin(async move {
        if depth == 0 {
            return Ok(Vec::new());
        }
        let supers = adapter.type_hierarchy_supertypes(item.clone()).await?;
        let mut nodes = Vec::with_capacity(supers.len());
        for parent in &supers {
            let children = build_chain_upward(adapter, parent, depth - 1).await?;
            nodes.push(TreeNode {
                name: parent.name.clone(),
                children,
            });
        }
        Ok(nodes)
    })
}

fn build_tree_downward<'a>(
    adapter: &'a ClangdAdapter,
    item: &'a TypeHierarchyItem,
    depth: usize,
) -> BoxFuture<'a, Result<Vec<TreeNode>>> {
    Box::pin(async move {
        if depth == 0 {
            return Ok(Vec::new());
        }
        let subs = adapter.type_hierarchy_subtypes(item.clone()).await?;
        let mut nodes = Vec::with_capacity(subs.len());
        for child in &subs {
            let children = build_tree_downward(adapter, child, depth - 1).await?;
            nodes.push(TreeNode {
                name: child.name.clone(),
                children,
            });
        }
        Ok(nodes)
    })
}

fn render_tree(nodes: &[TreeNode], prefix: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i == nodes.len() - 1;
        let connector = if last { "└── " } else { "├── " };
        out.push_str(&format!("{prefix}{connector}{}\n", node.name));
        let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
        render_tree(&node.children, &child_prefix, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_tree_uses_corner_connector_for_single_child() {
        let nodes = vec![TreeNode {
            name: "GameObject".to_string(),
            children: vec![],
        }];
        let mut out = String::new();
        render_tree(&nodes, "", &mut out);
        assert_eq!(out, "└── GameObject\n");
    }

    #[test]
    fn render_tree_uses_tee_connector_for_non_last_siblings() {
        let nodes = vec![
            TreeNode {
                name: "Enemy".to_string(),
                children: vec![],
            },
            TreeNode {
                name: "Player".to_string(),
                children: vec![],
            },
        ];
        let mut out = String::new();
        render_tree(&nodes, "", &mut out);
        assert_eq!(out, "├── Enemy\n└── Player\n");
    }
}
