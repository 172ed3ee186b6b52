//! Daemon lock record: one live daemon per project root, enforced by an
//! atomically-written JSON lock file plus a live-pid check, not an
//! in-process singleton.

use std::path::{Path, PathBuf};

use nix::sys::signal::kill;
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Contents of `.clangd-query.lock`, written via temp-file + rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub pid: u32,
    #[serde(rename = "socketPath")]
    pub socket_path: PathBuf,
    #[serde(rename = "startTime")]
    pub start_time_ms: i64,
    #[serde(rename = "projectRoot")]
    pub project_root: PathBuf,
    #[serde(rename = "buildTimestamp", skip_serializing_if = "Option::is_none")]
    pub build_timestamp_ms: Option<i64>,
}

/// Why a previously-written lock should no longer be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    ProcessDead,
    RootMismatch,
    OlderBuild,
}

impl LockRecord {
    pub fn new(socket_path: PathBuf, project_root: PathBuf, build_timestamp_ms: Option<i64>) -> Self {
        Self {
            pid: std::process::id(),
            socket_path,
            start_time_ms: chrono::Utc::now().timestamp_millis(),
            project_root,
            build_timestamp_ms,
        }
    }

    /// Atomically write the lock file: write to `<path>.tmp`, then rename.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::Discovery(format!("failed to serialize lock record: {e}")))?;

        let tmp_path = path.with_extension("lock.tmp");
        std::fs::write(&tmp_path, json.as_bytes())
            .map_err(|e| CliError::Discovery(format!("failed to write lock file: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o644);
            let _ = std::fs::set_permissions(&tmp_path, perms);
        }

        std::fs::rename(&tmp_path, path)
            .map_err(|e| CliError::Discovery(format!("failed to install lock file: {e}")))?;
        Ok(())
    }

    /// Read and parse a lock file. Tolerates a missing or malformed file by
    /// returning `None` rather than erroring — an absent lock is a normal
    /// "nobody's running" state.
    pub fn read(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn remove(path: &Path) {
        let _ = std::fs::remove_file(path);
    }

    /// Is the recorded pid still alive? Signal 0 checks existence without
    /// delivering a signal; `ESRCH` means dead, `EPERM` means alive but
    /// owned by someone else, anything else we treat as dead.
    pub fn is_process_alive(&self) -> bool {
        process_alive(self.pid)
    }

    /// Decide whether this lock is stale given the current project root and
    /// the client binary's own build timestamp.
    pub fn staleness(&self, expected_root: &Path, client_build_timestamp_ms: Option<i64>) -> Option<StaleReason> {
        if !self.is_process_alive() {
            return Some(StaleReason::ProcessDead);
        }
        if self.project_root != expected_root {
            return Some(StaleReason::RootMismatch);
        }
        if let (Some(daemon_ts), Some(client_ts)) = (self.build_timestamp_ms, client_build_timestamp_ms) {
            if daemon_ts < client_ts {
                return Some(StaleReason::OlderBuild);
            }
        }
        None
    }
}

fn process_alive(pid: u32) -> bool {
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn current_process_is_alive() {
        assert!(process_alive(std::process::id()));
    }

    #[test]
    fn bogus_pid_is_dead() {
        assert!(!process_alive(4_000_000));
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join(".clangd-query.lock");
        let record = LockRecord::new(
            PathBuf::from("/tmp/clangd-query-daemon-abc.sock"),
            dir.path().to_path_buf(),
            Some(1000),
        );
        record.write_atomic(&lock_path).unwrap();

        let read_back = LockRecord::read(&lock_path).unwrap();
        assert_eq!(read_back.pid, record.pid);
        assert_eq!(read_back.project_root, record.project_root);
        assert_eq!(read_back.build_timestamp_ms, Some(1000));
    }

    #[test]
    fn missing_lock_file_reads_as_none() {
        let dir = tempdir().unwrap();
        assert!(LockRecord::read(&dir.path().join("nope.lock")).is_none());
    }

    #[test]
    fn malformed_lock_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".clangd-query.lock");
        std::fs::write(&path, b"not json").unwrap();
        assert!(LockRecord::read(&path).is_none());
    }

    #[test]
    fn dead_pid_is_stale() {
        let record = LockRecord {
            pid: 4_000_000,
            socket_path: PathBuf::from("/tmp/sock"),
            start_time_ms: 0,
            project_root: PathBuf::from("/tmp/proj"),
            build_timestamp_ms: None,
        };
        assert_eq!(
            record.staleness(&PathBuf::from("/tmp/proj"), None),
            Some(StaleReason::ProcessDead)
        );
    }

    #[test]
    fn mismatched_root_is_stale() {
        let record = LockRecord {
            pid: std::process::id(),
            socket_path: PathBuf::from("/tmp/sock"),
            start_time_ms: 0,
            project_root: PathBuf::from("/tmp/proj-a"),
            build_timestamp_ms: None,
        };
        assert_eq!(
            record.staleness(&PathBuf::from("/tmp/proj-b"), None),
            Some(StaleReason::RootMismatch)
        );
    }

    #[test]
    fn older_build_is_stale() {
        let record = LockRecord {
            pid: std::process::id(),
            socket_path: PathBuf::from("/tmp/sock"),
            start_time_ms: 0,
            project_root: PathBuf::from("/tmp/proj"),
            build_timestamp_ms: Some(100),
        };
        assert_eq!(
            record.staleness(&PathBuf::from("/tmp/proj"), Some(200)),
            Some(StaleReason::OlderBuild)
        );
    }

    #[test]
    fn fresh_matching_lock_is_not_stale() {
        let record = LockRecord {
            pid: std::process::id(),
            socket_path: PathBuf::from("/tmp/sock"),
            start_time_ms: 0,
            project_root: PathBuf::from("/tmp/proj"),
            build_timestamp_ms: Some(200),
        };
        assert_eq!(record.staleness(&PathBuf::from("/tmp/proj"), Some(100)), None);
    }
}
