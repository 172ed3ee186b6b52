//! Project root discovery and derived identifiers (socket path, lock path).
//!
//! A project is uniquely named by the absolute path of its root directory —
//! the nearest ancestor of the current directory containing `CMakeLists.txt`.

use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Ascend from `start` until a directory containing `CMakeLists.txt` is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    let mut dir = start
        .canonicalize()
        .map_err(|e| CliError::Discovery(format!("cannot resolve {}: {e}", start.display())))?;

    loop {
        if dir.join("CMakeLists.txt").is_file() {
            return Ok(dir);
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => {
                return Err(CliError::Discovery(
                    "no CMakeLists.txt found in this directory or any parent".to_string(),
                ));
            }
        }
    }
}

/// Derived identity for a project root: socket path and lock path.
#[derive(Debug, Clone)]
pub struct ProjectIdentity {
    pub root: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
}

impl ProjectIdentity {
    pub fn for_root(root: PathBuf) -> Self {
        let digest = md5::compute(root.to_string_lossy().as_bytes());
        let socket_name = format!("clangd-daemon-{digest:x}.sock");
        let socket_path = std::env::temp_dir().join(socket_name);
        let lock_path = root.join(".clangd-query.lock");
        Self {
            root,
            socket_path,
            lock_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_root_from_nested_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("CMakeLists.txt"), "").unwrap();
        let nested = dir.path().join("src").join("core");
        fs::create_dir_all(&nested).unwrap();

        let root = find_project_root(&nested).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn same_root_yields_same_socket_path() {
        let a = ProjectIdentity::for_root(PathBuf::from("/tmp/proj"));
        let b = ProjectIdentity::for_root(PathBuf::from("/tmp/proj"));
        assert_eq!(a.socket_path, b.socket_path);
    }

    #[test]
    fn different_roots_yield_different_socket_paths() {
        let a = ProjectIdentity::for_root(PathBuf::from("/tmp/proj-a"));
        let b = ProjectIdentity::for_root(PathBuf::from("/tmp/proj-b"));
        assert_ne!(a.socket_path, b.socket_path);
    }
}
