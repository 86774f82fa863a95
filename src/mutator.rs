//! Atomic file commit with backup and rollback.
//!
//! Turns reconstructed text into file bytes: parent directories are created,
//! the current file (if any) is copied to a `.bak` sibling, and the new
//! content lands via write-to-temp + rename so a killed process can never
//! leave a half-written target. A failed commit restores the backup and
//! reports a [`WriteError`]; a successful one removes it. Backup creation
//! itself is best-effort and never blocks the write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to create parent directory for {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Commit { path: PathBuf, source: io::Error },
}

/// Write `content` to `path` atomically, with backup and rollback.
///
/// On success the target holds exactly `content` and no `.bak` or temp
/// sibling remains. On failure the target holds its prior bytes.
pub fn commit(path: &Path, content: &str) -> Result<(), WriteError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    let backup = create_backup(path);

    match write_atomic(path, content) {
        Ok(()) => {
            if let Some(bak) = &backup {
                let _ = fs::remove_file(bak);
            }
            info!(
                "[INFO] [mutator] Wrote {} ({} bytes)",
                path.display(),
                content.len()
            );
            Ok(())
        }
        Err(source) => {
            if let Some(bak) = &backup {
                if fs::copy(bak, path).is_err() {
                    warn!(
                        "[WARN] [mutator] Failed to restore backup for {}",
                        path.display()
                    );
                }
                let _ = fs::remove_file(bak);
            }
            Err(WriteError::Commit {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// The `.bak` sibling used during the write window.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Copy the current file to its `.bak` sibling, carrying permission bits.
/// Failure is recorded and the write proceeds without a backup.
fn create_backup(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }
    let bak = backup_path(path);
    match fs::copy(path, &bak) {
        Ok(_) => Some(bak),
        Err(e) => {
            warn!(
                "[WARN] [mutator] Backup of {} failed, writing without one: {}",
                path.display(),
                e
            );
            None
        }
    }
}

fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        e
    })
}
