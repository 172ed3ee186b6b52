//! The daemon side of the wire protocol: accept loop, one short-lived
//! handler per connection, dispatch into the query command layer
//! for each query command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;

use crate::error::CliError;
use crate::ipc::protocol::{read_frame, write_frame, Request, Response};
use crate::lockfile::LockRecord;
use crate::lsp::ClangdAdapter;
use crate::query;

const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Accept connections until `shutdown` is notified, spawning a detached
/// handler per connection so one slow client can't stall the others.
pub async fn run_accept_loop(
    listener: UnixListener,
    adapter: ClangdAdapter,
    project_root: PathBuf,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                log::info!("accept loop stopping");
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let adapter = adapter.clone();
                        let project_root = project_root.clone();
                        let shutdown = Arc::clone(&shutdown);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &adapter, &project_root, &shutdown).await {
                                log::warn!("connection handler failed: {e}");
                            }
                        });
                    }
                    Err(e) => {
                        log::error!("accept failed: {e}");
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    stream: UnixStream,
    adapter: &ClangdAdapter,
    project_root: &Path,
    shutdown: &Arc<Notify>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = tokio::io::BufReader::new(read_half);

    let Some(request) = read_frame::<_, Request>(&mut reader).await? else {
        return Ok(());
    };

    let response = dispatch(adapter, project_root, shutdown, request).await;
    write_frame(&mut write_half, &response).await
}

async fn dispatch(
    adapter: &ClangdAdapter,
    project_root: &Path,
    shutdown: &Arc<Notify>,
    request: Request,
) -> Response {
    if let Some(timeout) = request.timeout {
        adapter.set_request_timeout(Duration::from_secs(timeout)).await;
    }

    let arg = request.arguments.first().map(String::as_str).unwrap_or("");
    let limit = request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    let result = match request.command.as_str() {
        "search" => query::search::run(adapter, project_root, arg, limit).await,
        "show" => query::show::run(adapter, project_root, arg).await,
        "view" => query::view::run(adapter, project_root, arg).await,
        "usages" => query::usages::run(adapter, project_root, arg).await,
        "hierarchy" => query::hierarchy::run(adapter, project_root, arg).await,
        "signature" => query::signature::run(adapter, project_root, arg).await,
        "interface" => query::interface::run(adapter, project_root, arg).await,
        "status" => Ok(status_text(adapter, project_root).await),
        "logs" => read_log_tail(project_root).await,
        "shutdown" => {
            shutdown.notify_one();
            Ok("Daemon shutting down.".to_string())
        }
        other => Err(CliError::UserInput(format!("unknown command: {other}"))),
    };

    match result {
        Ok(stdout) => Response::ok(stdout),
        Err(err) if err.is_informational() => Response::ok(err.to_string()),
        Err(err) => Response::error(err.to_string(), err.exit_code()),
    }
}

async fn status_text(adapter: &ClangdAdapter, project_root: &Path) -> String {
    use crate::lsp::ReadinessState;
    if adapter.is_alive() && !matches!(adapter.readiness_state(), ReadinessState::Ready) {
        // A minimal probe catches the case where indexing finished before
        // we ever saw its `$/progress` end notification.
        let _ = adapter.probe_ready().await;
    }
    let state = match adapter.readiness_state() {
        ReadinessState::Initializing => "initializing",
        ReadinessState::Indexing => "indexing",
        ReadinessState::Ready => "ready",
        ReadinessState::Dead => "dead",
    };

    let lock_path = project_root.join(".clangd-query.lock");
    let (pid_line, uptime_line) = match LockRecord::read(&lock_path) {
        Some(record) => {
            let uptime_secs = ((chrono::Utc::now().timestamp_millis() - record.start_time_ms) / 1000).max(0);
            (format!("pid: {}", record.pid), format!("uptime: {}", format_uptime(uptime_secs)))
        }
        None => ("pid: unknown".to_string(), "uptime: unknown".to_string()),
    };

    format!(
        "{pid_line}\n{uptime_line}\nclangd: {state}\npending requests: {}",
        adapter.pending_request_count()
    )
}

fn format_uptime(total_secs: i64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

async fn read_log_tail(project_root: &Path) -> crate::error::Result<String> {
    let log_path = project_root.join(".cache").join("clangd-query").join("daemon.log");
    let content = tokio::fs::read_to_string(&log_path)
        .await
        .map_err(|e| CliError::Discovery(format!("reading {}: {e}", log_path.display())))?;
    let tail: Vec<&str> = content.lines().rev().take(200).collect();
    Ok(tail.into_iter().rev().collect::<Vec<_>>().join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uptime_pads_each_field() {
        assert_eq!(format_uptime(5), "00:00:05");
        assert_eq!(format_uptime(3661), "01:01:01");
    }
}
