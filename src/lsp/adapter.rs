//! The clangd adapter: one long-lived child process speaking LSP over
//! stdio, with request/response correlation, server-initiated message
//! handling, readiness tracking, and lazy text-document synchronization.
//!
//! Owns a single clangd child and exposes the handful of typed LSP
//! operations callers need, all funneled through one `call()` that does id
//! allocation, correlation, and timeout.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentSymbolParams, DocumentSymbolResponse, FoldingRange, FoldingRangeParams,
    GotoDefinitionParams, GotoDefinitionResponse, Hover, HoverParams, Location, Position,
    ReferenceContext, ReferenceParams, TextDocumentContentChangeEvent, TextDocumentIdentifier,
    TextDocumentItem, TextDocumentPositionParams, TypeHierarchyItem, TypeHierarchyPrepareParams,
    TypeHierarchySubtypesParams, TypeHierarchySupertypesParams, Url, VersionedTextDocumentIdentifier,
    WorkspaceSymbol, WorkspaceSymbolParams,
};

use crate::error::{CliError, Result};
use crate::lsp::documents::DocumentTable;
use crate::lsp::pending::{PendingTable, RequestOutcome, DEFAULT_REQUEST_TIMEOUT};
use crate::lsp::transport;

/// Coarse indexing/readiness state, surfaced by the `status` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Initializing,
    Indexing,
    Ready,
    Dead,
}

struct AdapterInner {
    stdin: Mutex<ChildStdin>,
    child: Mutex<Child>,
    pending: PendingTable,
    documents: DocumentTable,
    request_timeout: Mutex<Duration>,
    ready: AtomicBool,
    alive: AtomicBool,
    indexing_started: AtomicBool,
    project_root: PathBuf,
}

/// Owns one clangd child process and the bidirectional JSON-RPC channel to it.
#[derive(Clone)]
pub struct ClangdAdapter {
    inner: Arc<AdapterInner>,
}

impl ClangdAdapter {
    /// Spawn `clangd` rooted at `project_root`, perform the `initialize` /
    /// `initialized` / `didChangeConfiguration` handshake, and start the
    /// background reader loop.
    pub async fn spawn(project_root: &Path) -> Result<Self> {
        let (child, stdin, stdout) = launch_child(project_root)?;

        let inner = Arc::new(AdapterInner {
            stdin: Mutex::new(stdin),
            child: Mutex::new(child),
            pending: PendingTable::new(),
            documents: DocumentTable::new(),
            request_timeout: Mutex::new(DEFAULT_REQUEST_TIMEOUT),
            ready: AtomicBool::new(false),
            alive: AtomicBool::new(true),
            indexing_started: AtomicBool::new(false),
            project_root: project_root.to_path_buf(),
        });

        let adapter = ClangdAdapter { inner };
        adapter.spawn_reader_loop(BufReader::new(stdout));
        adapter.initialize(project_root).await?;
        Ok(adapter)
    }

    /// If the clangd child has died (crash, or stdout EOF), respawn it and
    /// redo the initialize handshake before the caller's request proceeds.
    /// Previously open documents are forgotten; they get re-opened lazily
    /// on next use against the new session.
    async fn ensure_alive(&self) -> Result<()> {
        if self.inner.alive.load(Ordering::SeqCst) {
            return Ok(());
        }
        log::warn!("clangd is dead, restarting before handling the next request");
        let (child, stdin, stdout) = launch_child(&self.inner.project_root)?;

        *self.inner.child.lock().await = child;
        *self.inner.stdin.lock().await = stdin;
        self.inner.documents.clear();
        self.inner.ready.store(false, Ordering::SeqCst);
        self.inner.indexing_started.store(false, Ordering::SeqCst);
        self.inner.alive.store(true, Ordering::SeqCst);

        self.spawn_reader_loop(BufReader::new(stdout));
        let project_root = self.inner.project_root.clone();
        self.initialize(&project_root).await
    }

    fn spawn_reader_loop<R>(&self, mut reader: R)
    where
        R: tokio::io::AsyncBufRead + Unpin + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            loop {
                match transport::read_message(&mut reader).await {
                    Ok(Some(message)) => handle_inbound(&inner, message),
                    Ok(None) => {
                        log::warn!("clangd stdout closed (EOF)");
                        break;
                    }
                    Err(e) => {
                        log::error!("clangd transport error: {e:?}");
                        break;
                    }
                }
            }
            inner.alive.store(false, Ordering::SeqCst);
            inner.ready.store(false, Ordering::SeqCst);
            inner.pending.fail_all("clangd connection lost");
        });
    }

    async fn initialize(&self, project_root: &Path) -> Result<()> {
        let root_uri = Url::from_directory_path(project_root)
            .map_err(|_| CliError::Discovery("project root is not a valid file:// path".into()))?;

        let params = json!({
            "processId": std::process::id(),
            "rootUri": root_uri.to_string(),
            "capabilities": {
                "textDocument": {
                    "hover": {"contentFormat": ["markdown", "plaintext"]},
                    "documentSymbol": {"hierarchicalDocumentSymbolSupport": true},
                    "foldingRange": {},
                    "definition": {},
                    "references": {},
                    "typeHierarchy": {},
                },
                "workspace": {
                    "workspaceFolders": true,
                    "symbol": {},
                    "configuration": true,
                },
                "window": {
                    "workDoneProgress": true,
                },
            },
            "workspaceFolders": [{"uri": root_uri.to_string(), "name": "root"}],
        });

        self.call("initialize", params).await?;
        self.notify("initialized", json!({})).await?;
        self.notify("workspace/didChangeConfiguration", json!({"settings": {}}))
            .await?;
        Ok(())
    }

    /// Send a request, wait for the matching reply up to the adapter's
    /// configured timeout, and surface a `$/cancelRequest` best-effort on
    /// timeout.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.ensure_alive().await?;

        let (id, rx) = self.inner.pending.register();
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        {
            let mut stdin = self.inner.stdin.lock().await;
            transport::write_message(&mut *stdin, &request)
                .await
                .map_err(|e| CliError::LspTransport(format!("writing {method} request: {e}")))?;
        }

        let timeout = *self.inner.request_timeout.lock().await;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(RequestOutcome::Result(value))) => Ok(value),
            Ok(Ok(RequestOutcome::Error(err))) => Err(CliError::LspRequest(format!(
                "{method} failed: {err}"
            ))),
            Ok(Err(_)) => Err(CliError::LspTransport(format!(
                "{method} request channel closed before a reply arrived"
            ))),
            Err(_) => {
                self.inner.pending.cancel(id);
                let cancel = json!({
                    "jsonrpc": "2.0",
                    "method": "$/cancelRequest",
                    "params": {"id": id},
                });
                if let Ok(mut stdin) = self.inner.stdin.try_lock() {
                    let _ = transport::write_message(&mut *stdin, &cancel).await;
                }
                Err(CliError::LspRequest(format!(
                    "{method} timed out after {timeout:?}"
                )))
            }
        }
    }

    pub async fn set_request_timeout(&self, timeout: Duration) {
        *self.inner.request_timeout.lock().await = timeout;
    }

    pub async fn notify(&self, method: &str, params: Value) -> Result<()> {
        self.ensure_alive().await?;
        let notification = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        let mut stdin = self.inner.stdin.lock().await;
        transport::write_message(&mut *stdin, &notification)
            .await
            .map_err(|e| CliError::LspTransport(format!("writing {method} notification: {e}")))
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    /// Coarse readiness, surfaced by the `status` command.
    pub fn readiness_state(&self) -> ReadinessState {
        if !self.inner.alive.load(Ordering::SeqCst) {
            ReadinessState::Dead
        } else if self.inner.ready.load(Ordering::SeqCst) {
            ReadinessState::Ready
        } else if self.inner.indexing_started.load(Ordering::SeqCst) {
            ReadinessState::Indexing
        } else {
            ReadinessState::Initializing
        }
    }

    pub fn pending_request_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// A minimal `workspace/symbol` probe used by `status` (and internally
    /// before the first real query) to confirm clangd is answering, per the
    /// readiness model.
    pub async fn probe_ready(&self) -> bool {
        if self.call("workspace/symbol", json!({"query": ""})).await.is_ok() {
            self.inner.ready.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    pub async fn workspace_symbol(&self, query: &str) -> Result<Vec<WorkspaceSymbol>> {
        let params = WorkspaceSymbolParams {
            query: query.to_string(),
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let value = self
            .call("workspace/symbol", serde_json::to_value(params).unwrap())
            .await?;
        parse_or_empty(value)
    }

    pub async fn document_symbol(&self, uri: &Url) -> Result<DocumentSymbolResponse> {
        self.ensure_open(uri).await?;
        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let value = self
            .call("textDocument/documentSymbol", serde_json::to_value(params).unwrap())
            .await?;
        if value.is_null() {
            return Ok(DocumentSymbolResponse::Flat(Vec::new()));
        }
        serde_json::from_value(value)
            .map_err(|e| CliError::Parse(format!("parsing documentSymbol response: {e}")))
    }

    pub async fn folding_range(&self, uri: &Url) -> Result<Vec<FoldingRange>> {
        self.ensure_open(uri).await?;
        let params = FoldingRangeParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let value = self
            .call("textDocument/foldingRange", serde_json::to_value(params).unwrap())
            .await?;
        parse_or_empty(value)
    }

    pub async fn definition(&self, uri: &Url, position: Position) -> Result<Vec<Location>> {
        self.ensure_open(uri).await?;
        let params = GotoDefinitionParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position,
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let value = self
            .call("textDocument/definition", serde_json::to_value(params).unwrap())
            .await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        let response: GotoDefinitionResponse = serde_json::from_value(value)
            .map_err(|e| CliError::Parse(format!("parsing definition response: {e}")))?;
        Ok(match response {
            GotoDefinitionResponse::Scalar(loc) => vec![loc],
            GotoDefinitionResponse::Array(locs) => locs,
            GotoDefinitionResponse::Link(links) => links
                .into_iter()
                .map(|l| Location::new(l.target_uri, l.target_range))
                .collect(),
        })
    }

    pub async fn references(
        &self,
        uri: &Url,
        position: Position,
        include_declaration: bool,
    ) -> Result<Vec<Location>> {
        self.ensure_open(uri).await?;
        let params = ReferenceParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position,
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: ReferenceContext {
                include_declaration,
            },
        };
        let value = self
            .call("textDocument/references", serde_json::to_value(params).unwrap())
            .await?;
        parse_or_empty(value)
    }

    pub async fn hover(&self, uri: &Url, position: Position) -> Result<Option<Hover>> {
        self.ensure_open(uri).await?;
        let params = HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position,
            },
            work_done_progress_params: Default::default(),
        };
        let value = self
            .call("textDocument/hover", serde_json::to_value(params).unwrap())
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CliError::Parse(format!("parsing hover response: {e}")))
    }

    pub async fn prepare_type_hierarchy(
        &self,
        uri: &Url,
        position: Position,
    ) -> Result<Vec<TypeHierarchyItem>> {
        self.ensure_open(uri).await?;
        let params = TypeHierarchyPrepareParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position,
            },
            work_done_progress_params: Default::default(),
        };
        let value = self
            .call(
                "textDocument/prepareTypeHierarchy",
                serde_json::to_value(params).unwrap(),
            )
            .await?;
        parse_or_empty(value)
    }

    pub async fn type_hierarchy_supertypes(
        &self,
        item: TypeHierarchyItem,
    ) -> Result<Vec<TypeHierarchyItem>> {
        let params = TypeHierarchySupertypesParams {
            item,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let value = self
            .call("typeHierarchy/supertypes", serde_json::to_value(params).unwrap())
            .await?;
        parse_or_empty(value)
    }

    pub async fn type_hierarchy_subtypes(
        &self,
        item: TypeHierarchyItem,
    ) -> Result<Vec<TypeHierarchyItem>> {
        let params = TypeHierarchySubtypesParams {
            item,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let value = self
            .call("typeHierarchy/subtypes", serde_json::to_value(params).unwrap())
            .await?;
        parse_or_empty(value)
    }

    /// Open `uri` lazily if it hasn't been opened yet.
    pub async fn ensure_open(&self, uri: &Url) -> Result<()> {
        if !self.inner.documents.needs_open(uri) {
            return Ok(());
        }
        let path = uri
            .to_file_path()
            .map_err(|_| CliError::UserInput(format!("not a file URI: {uri}")))?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CliError::Discovery(format!("reading {}: {e}", path.display())))?;

        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "cpp".to_string(),
                version: 1,
                text,
            },
        };
        self.notify("textDocument/didOpen", serde_json::to_value(params).unwrap())
            .await?;
        self.inner.documents.mark_opened(uri.clone());
        Ok(())
    }

    /// Tell clangd a file changed, using full-text sync.
    pub async fn did_change(&self, uri: &Url) -> Result<()> {
        if !self.inner.documents.is_open(uri) {
            return self.ensure_open(uri).await;
        }
        let path = uri
            .to_file_path()
            .map_err(|_| CliError::UserInput(format!("not a file URI: {uri}")))?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CliError::Discovery(format!("reading {}: {e}", path.display())))?;
        let version = self.inner.documents.next_version(uri);

        let params = DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.clone(),
                version,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text,
            }],
        };
        self.notify(
            "textDocument/didChange",
            serde_json::to_value(params).unwrap(),
        )
        .await
    }

    pub async fn did_close(&self, uri: &Url) -> Result<()> {
        if !self.inner.documents.is_open(uri) {
            return Ok(());
        }
        let params = DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        };
        self.notify("textDocument/didClose", serde_json::to_value(params).unwrap())
            .await?;
        self.inner.documents.mark_closed(uri);
        Ok(())
    }

    /// `shutdown` request, wait for reply, `exit` notification, reap the
    /// child within a grace window, SIGKILL on timeout.
    pub async fn shutdown(&self) -> Result<()> {
        if self.inner.alive.load(Ordering::SeqCst) {
            let _ = self.call("shutdown", json!(null)).await;
            let _ = self.notify("exit", json!(null)).await;
        }

        let mut child = self.inner.child.lock().await;
        match tokio::time::timeout(Duration::from_secs(3), child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                log::warn!("clangd did not exit within grace window, killing it");
                let _ = child.start_kill();
            }
        }
        self.inner.alive.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Spawn a `clangd` child rooted at `project_root` and hand back its pipes,
/// with stderr already tee'd into the log. Shared by the initial `spawn`
/// and by `ensure_alive`'s restart path.
fn launch_child(project_root: &Path) -> Result<(Child, ChildStdin, ChildStdout)> {
    let mut child = Command::new("clangd")
        .arg("--background-index")
        .arg(format!("--compile-commands-dir={}", project_root.display()))
        .current_dir(project_root)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| CliError::Discovery(format!("failed to spawn clangd: {e}")))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| CliError::Discovery("clangd child has no stdin".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| CliError::Discovery("clangd child has no stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| CliError::Discovery("clangd child has no stderr".to_string()))?;

    tokio::spawn(transport::pipe_clangd_stderr(stderr));
    Ok((child, stdin, stdout))
}

fn parse_or_empty<T: serde::de::DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| CliError::Parse(format!("parsing LSP response: {e}")))
}

/// Dispatch an inbound message from clangd: a reply (has `id`), or a
/// server-initiated notification/request (has `method`).
fn handle_inbound(inner: &Arc<AdapterInner>, message: Value) {
    if let Some(id) = message.get("id").and_then(Value::as_u64) {
        let id = id as u32;
        if let Some(result) = message.get("result") {
            inner.pending.complete(id, RequestOutcome::Result(result.clone()));
            return;
        }
        if let Some(error) = message.get("error") {
            inner.pending.complete(id, RequestOutcome::Error(error.clone()));
            return;
        }
        // A request from clangd to us (has both id and method): give a
        // minimal stub reply rather than leaving it hanging.
        if let Some(method) = message.get("method").and_then(Value::as_str) {
            log::debug!("clangd server-initiated request (stub reply): {method}");
            let inner = Arc::clone(inner);
            let reply = json!({"jsonrpc": "2.0", "id": id, "result": Value::Null});
            tokio::spawn(async move {
                let mut stdin = inner.stdin.lock().await;
                if let Err(e) = transport::write_message(&mut *stdin, &reply).await {
                    log::warn!("failed to send stub reply for server-initiated request: {e}");
                }
            });
        }
        return;
    }

    let Some(method) = message.get("method").and_then(Value::as_str) else {
        return;
    };

    match method {
        "window/logMessage" | "window/showMessage" => {
            if let Some(text) = message
                .pointer("/params/message")
                .and_then(Value::as_str)
            {
                log::info!("[clangd] {text}");
            }
        }
        "$/progress" => {
            handle_progress(inner, message.get("params").cloned().unwrap_or(Value::Null));
        }
        "workspace/configuration" => {
            log::debug!("clangd requested workspace/configuration (no reply channel on notifications path)");
        }
        other => {
            log::trace!("unhandled clangd notification: {other}");
        }
    }
}

fn handle_progress(inner: &Arc<AdapterInner>, params: Value) {
    let kind = params.pointer("/value/kind").and_then(Value::as_str);
    match kind {
        Some("end") => {
            inner.ready.store(true, Ordering::SeqCst);
        }
        Some("begin") => {
            inner.indexing_started.store(true, Ordering::SeqCst);
        }
        _ => {}
    }
}

pub type ClangdChildHandle = Arc<tokio::sync::Mutex<Child>>;

/// Convenience path helper: convert an absolute filesystem path to a
/// `file://` URI, matching clangd's expectation everywhere in this crate.
pub fn file_uri(path: &Path) -> Result<Url> {
    Url::from_file_path(path).map_err(|_| CliError::UserInput(format!("not an absolute path: {}", path.display())))
}
