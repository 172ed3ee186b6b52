//! Open-document bookkeeping for the clangd adapter.
//!
//! clangd, like any LSP server, only has useful information about a file
//! once it has been told the file is open (`didOpen`). The adapter opens
//! documents lazily on first use and keeps just enough state — the URI and
//! current version — to issue well-formed `didChange`/`didClose`.

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

#[derive(Debug, Clone)]
struct OpenDocument {
    version: i32,
}

/// Tracks which file URIs the adapter has told clangd are open, and their
/// LSP document version counter.
#[derive(Default)]
pub struct DocumentTable {
    open: DashMap<Url, OpenDocument>,
}

impl DocumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if this URI has never been opened, i.e. a `didOpen` is needed
    /// before clangd can answer anything about it.
    pub fn needs_open(&self, uri: &Url) -> bool {
        !self.open.contains_key(uri)
    }

    pub fn mark_opened(&self, uri: Url) {
        self.open.insert(uri, OpenDocument { version: 1 });
    }

    /// Bump and return the next document version for a `didChange`.
    pub fn next_version(&self, uri: &Url) -> i32 {
        match self.open.get_mut(uri) {
            Some(mut doc) => {
                doc.version += 1;
                doc.version
            }
            None => 1,
        }
    }

    pub fn mark_closed(&self, uri: &Url) {
        self.open.remove(uri);
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.open.contains_key(uri)
    }

    /// Forget every tracked document, e.g. after the backing clangd session
    /// has been restarted and nothing in it has been told about any file.
    pub fn clear(&self) {
        self.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(path: &str) -> Url {
        Url::parse(&format!("file://{path}")).unwrap()
    }

    #[test]
    fn unopened_document_needs_open() {
        let table = DocumentTable::new();
        assert!(table.needs_open(&uri("/a.cpp")));
    }

    #[test]
    fn opened_document_no_longer_needs_open() {
        let table = DocumentTable::new();
        let u = uri("/a.cpp");
        table.mark_opened(u.clone());
        assert!(!table.needs_open(&u));
        assert!(table.is_open(&u));
    }

    #[test]
    fn version_increments_on_each_change() {
        let table = DocumentTable::new();
        let u = uri("/a.cpp");
        table.mark_opened(u.clone());
        assert_eq!(table.next_version(&u), 2);
        assert_eq!(table.next_version(&u), 3);
    }

    #[test]
    fn closing_forgets_the_document() {
        let table = DocumentTable::new();
        let u = uri("/a.cpp");
        table.mark_opened(u.clone());
        table.mark_closed(&u);
        assert!(table.needs_open(&u));
    }

    #[test]
    fn clear_forgets_every_document() {
        let table = DocumentTable::new();
        let a = uri("/a.cpp");
        let b = uri("/b.cpp");
        table.mark_opened(a.clone());
        table.mark_opened(b.clone());
        table.clear();
        assert!(table.needs_open(&a));
        assert!(table.needs_open(&b));
    }
}
