//! Daemon process entry point: write the lock file, bind the socket, start
//! the clangd adapter and file watcher, accept connections until a signal
//! or `shutdown` command arrives, then clean up.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::UnixListener;
use tokio::sync::Notify;

use crate::build_info;
use crate::error::{CliError, Result};
use crate::ipc::server;
use crate::lockfile::LockRecord;
use crate::logging;
use crate::lsp::ClangdAdapter;
use crate::project::ProjectIdentity;
use crate::watcher;

/// Run the daemon for `project_root` in the foreground. Returns once the
/// daemon has shut down cleanly; signals and the `shutdown` command both
/// drive this to completion rather than calling `std::process::exit`.
pub async fn run(project_root: PathBuf) -> Result<()> {
    logging::init_daemon(&project_root, false)
        .map_err(|e| CliError::Discovery(format!("setting up daemon logging: {e}")))?;

    let identity = ProjectIdentity::for_root(project_root.clone());
    log::info!("starting daemon for {}", identity.root.display());

    if let Some(existing) = LockRecord::read(&identity.lock_path) {
        if existing.staleness(&identity.root, build_info::current_executable_build_timestamp_ms()).is_none() {
            return Err(CliError::Discovery(format!(
                "a daemon is already running for {} (pid {})",
                identity.root.display(),
                existing.pid
            )));
        }
        log::info!("clearing stale lock left by pid {}", existing.pid);
        LockRecord::remove(&identity.lock_path);
        let _ = std::fs::remove_file(&identity.socket_path);
    }

    let listener = bind_socket(&identity.socket_path)?;

    let lock = LockRecord::new(
        identity.socket_path.clone(),
        identity.root.clone(),
        build_info::current_executable_build_timestamp_ms(),
    );
    lock.write_atomic(&identity.lock_path)
        .map_err(|e| CliError::Discovery(format!("writing lock file: {e}")))?;

    let adapter = match ClangdAdapter::spawn(&identity.root).await {
        Ok(adapter) => adapter,
        Err(e) => {
            // A clangd spawn failure doesn't abort the
            // daemon — it keeps accepting connections and reports the
            // error descriptively to every request instead.
            log::error!("failed to spawn clangd: {e}; daemon will report this to every request");
            return run_degraded(identity, listener, e).await;
        }
    };

    let watcher_result = watcher::start(identity.root.clone(), {
        let adapter = adapter.clone();
        move |paths| {
            let adapter = adapter.clone();
            tokio::spawn(async move {
                for path in paths {
                    if let Ok(uri) = crate::lsp::file_uri(&path) {
                        if let Err(e) = adapter.did_change(&uri).await {
                            log::warn!("didChange failed for {}: {e}", path.display());
                        }
                    }
                }
            });
        }
    });
    let _watcher = match watcher_result {
        Ok(w) => w,
        Err(e) => {
            cleanup(&identity);
            return Err(CliError::Discovery(format!("starting file watcher: {e}")));
        }
    };

    let shutdown = Arc::new(Notify::new());
    let accept_handle = tokio::spawn(server::run_accept_loop(
        listener,
        adapter.clone(),
        identity.root.clone(),
        Arc::clone(&shutdown),
    ));

    tokio::select! {
        result = accept_handle => {
            if let Err(e) = result {
                log::error!("accept loop task failed: {e:?}");
            }
        }
        _ = wait_for_termination_signal() => {
            log::info!("received termination signal");
            shutdown.notify_one();
        }
    }

    log::info!("shutting down clangd");
    let _ = adapter.shutdown().await;
    cleanup(&identity);
    log::info!("daemon exiting");
    Ok(())
}

/// clangd never started: keep accepting connections (this is the
/// explicit failure policy) so `status`/`logs`/`shutdown` still work, and
/// every query command gets a descriptive error instead of a dead socket.
async fn run_degraded(identity: ProjectIdentity, listener: UnixListener, spawn_error: CliError) -> Result<()> {
    log::error!("running in degraded mode: {spawn_error}");
    let shutdown = Arc::new(Notify::new());

    let accept_handle = tokio::spawn(degraded_accept_loop(listener, Arc::clone(&shutdown), spawn_error.to_string()));

    tokio::select! {
        result = accept_handle => {
            if let Err(e) = result {
                log::error!("degraded accept loop failed: {e:?}");
            }
        }
        _ = wait_for_termination_signal() => {
            shutdown.notify_one();
        }
    }

    cleanup(&identity);
    Ok(())
}

async fn degraded_accept_loop(listener: UnixListener, shutdown: Arc<Notify>, message: String) {
    use crate::ipc::protocol::{read_frame, write_frame, Request, Response};
    loop {
        tokio::select! {
            _ = shutdown.notified() => return,
            accepted = listener.accept() => {
                let Ok((stream, _)) = accepted else { continue };
                let message = message.clone();
                let shutdown = Arc::clone(&shutdown);
                tokio::spawn(async move {
                    let (read_half, mut write_half) = stream.into_split();
                    let mut reader = tokio::io::BufReader::new(read_half);
                    let Ok(Some(request)) = read_frame::<_, Request>(&mut reader).await else { return };
                    let response = if request.command == "shutdown" {
                        shutdown.notify_one();
                        Response::ok("Daemon shutting down.".to_string())
                    } else {
                        Response::error(format!("clangd is unavailable: {message}"), 1)
                    };
                    let _ = write_frame(&mut write_half, &response).await;
                });
            }
        }
    }
}

fn bind_socket(socket_path: &Path) -> Result<UnixListener> {
    let _ = std::fs::remove_file(socket_path);
    let listener = UnixListener::bind(socket_path)
        .map_err(|e| CliError::Discovery(format!("binding socket {}: {e}", socket_path.display())))?;
    let perms = std::fs::Permissions::from_mode(0o600);
    let _ = std::fs::set_permissions(socket_path, perms);
    Ok(listener)
}

fn cleanup(identity: &ProjectIdentity) {
    LockRecord::remove(&identity.lock_path);
    let _ = std::fs::remove_file(&identity.socket_path);
}

#[cfg(unix)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigint = signal(SignalKind::interrupt()).expect("installing SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("installing SIGTERM handler");
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
}
