//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Sibling file that carries the advisory lock for `path`.
///
/// The target is replaced by rename, so it can never hold the lock
/// itself, and it must not exist before its first complete write.
pub fn lock_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.lock", name))
}

fn open_lock(path: &Path) -> Result<File> {
    let lock = lock_path(path);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock)
        .map_err(|e| Error::io(&lock, e))
}

/// Write content atomically to a file with locking.
///
/// An exclusive advisory lock is held on the sibling lock file for the
/// duration of the write. Content goes to a sibling temp file which is
/// synced and then renamed over the target, so readers see either the
/// old or the new document, never a partial or empty one.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    let lock_file = open_lock(path)?;
    lock_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(path, e));
    }

    tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote file atomically");

    // Lock released when lock_file is dropped
    Ok(())
}

/// Read text content while holding a shared lock.
///
/// The target is opened after the lock is taken, so a concurrent
/// [`write_atomic`] has either renamed its document into place or not
/// started yet.
pub fn read_text_locked(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::io(
            path,
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }

    let lock_file = open_lock(path)?;
    lock_file.lock_shared().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let mut content = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut content))
        .map_err(|e| Error::io(path, e))?;
    Ok(content)
}

/// Write text content to a file atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
