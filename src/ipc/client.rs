//! Client-side discovery: locate or spawn the project daemon, connect over
//! its Unix socket, send one request, read one response.

use std::path::Path;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::UnixStream;

use crate::build_info;
use crate::error::{CliError, Result};
use crate::ipc::protocol::{read_frame, write_frame, Request, Response};
use crate::lockfile::LockRecord;
use crate::project::ProjectIdentity;

const SPAWN_POLL_TIMEOUT: Duration = Duration::from_secs(60);
const STARTUP_RACE_RETRY: Duration = Duration::from_millis(200);
const STARTUP_RACE_ATTEMPTS: u32 = 5;

/// Connect to the project's daemon, spawning it if necessary, and run one
/// request to completion. The caller has already resolved the project root
/// and derived `identity` from it.
pub async fn send_request(identity: &ProjectIdentity, request: Request) -> Result<Response> {
    let stream = connect_or_spawn(identity).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_frame(&mut write_half, &request)
        .await
        .map_err(|e| CliError::Discovery(format!("writing request to daemon: {e}")))?;

    read_frame::<_, Response>(&mut reader)
        .await
        .map_err(|e| CliError::Discovery(format!("reading daemon response: {e}")))?
        .ok_or_else(|| {
            CliError::Discovery("daemon closed the connection without a response".to_string())
        })
}

async fn connect_or_spawn(identity: &ProjectIdentity) -> Result<UnixStream> {
    if let Ok(stream) = UnixStream::connect(&identity.socket_path).await {
        return Ok(stream);
    }

    for _ in 0..STARTUP_RACE_ATTEMPTS {
        let Some(lock) = LockRecord::read(&identity.lock_path) else {
            break;
        };
        let client_build = build_info::current_executable_build_timestamp_ms();
        match lock.staleness(&identity.root, client_build) {
            None => {
                // A daemon is still starting up; give it a moment to bind
                // the socket rather than racing to spawn a second one.
                tokio::time::sleep(STARTUP_RACE_RETRY).await;
                if let Ok(stream) = UnixStream::connect(&identity.socket_path).await {
                    return Ok(stream);
                }
            }
            Some(reason) => {
                log::info!("removing stale daemon lock: {reason:?}");
                LockRecord::remove(&identity.lock_path);
                let _ = std::fs::remove_file(&identity.socket_path);
                break;
            }
        }
    }

    spawn_daemon(&identity.root)?;
    wait_for_socket(&identity.socket_path).await
}

/// Spawn a detached daemon: a new session via `setsid` so it outlives the
/// client's controlling terminal, stdio redirected to `/dev/null` since
/// `init_daemon` takes over logging to its own file.
fn spawn_daemon(project_root: &Path) -> Result<()> {
    let exe = std::env::current_exe()
        .map_err(|e| CliError::Discovery(format!("locating this executable: {e}")))?;

    let mut command = std::process::Command::new(exe);
    command
        .arg("daemon")
        .arg(project_root)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());

    #[cfg(unix)]
    unsafe {
        use std::os::unix::process::CommandExt;
        command.pre_exec(|| {
            nix::unistd::setsid().map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
            Ok(())
        });
    }

    command
        .spawn()
        .map_err(|e| CliError::Discovery(format!("failed to spawn daemon: {e}")))?;
    Ok(())
}

async fn wait_for_socket(socket_path: &Path) -> Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + SPAWN_POLL_TIMEOUT;
    let mut backoff = Duration::from_millis(50);

    loop {
        if let Ok(stream) = UnixStream::connect(socket_path).await {
            return Ok(stream);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(CliError::Discovery(
                "daemon did not become ready within 60s".to_string(),
            ));
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(Duration::from_secs(2));
    }
}
