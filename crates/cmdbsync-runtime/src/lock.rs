//! Single-run lock: an exclusive, non-blocking `flock` on a lock file.
//!
//! The lock lives as long as the returned guard. The kernel releases it when
//! the process exits.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Held lock. Released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    _file: File,
}

impl RunLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Try to take the lock. `Ok(None)` means another run holds it.
pub fn try_lock(path: &Path) -> anyhow::Result<Option<RunLock>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create lock directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .with_context(|| format!("failed to open lock file {}", path.display()))?;

    // SAFETY: the fd is owned by `file` and stays open for the call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::WouldBlock {
            return Ok(None);
        }
        return Err(err).with_context(|| format!("failed to lock {}", path.display()));
    }

    Ok(Some(RunLock {
        path: path.to_path_buf(),
        _file: file,
    }))
}
