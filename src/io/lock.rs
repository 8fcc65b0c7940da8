use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long writers wait for each other before giving up
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Exclusive advisory lock on `daylog/.lock`.
///
/// Every read-modify-write of the document file happens while one of these
/// is held, which is also what makes ticket numbering race-free. The lock
/// is released when the guard is dropped.
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out after {waited:?} waiting for {path}: another dl process is writing")]
    Timeout { path: PathBuf, waited: Duration },
}

impl StoreLock {
    /// Block up to `timeout` for the lock, polling with a short backoff.
    pub fn acquire(dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let start = Instant::now();
        let mut backoff = Duration::from_millis(2);
        while !try_flock(&file) {
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout { path, waited });
            }
            std::thread::sleep(backoff);
            backoff = (backoff * 2).min(Duration::from_millis(50));
        }
        tracing::trace!(path = %path.display(), "store lock acquired");
        Ok(StoreLock { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Non-blocking exclusive flock. The lock file itself is never removed:
/// unlinking it would let a waiter lock a stale inode.
#[cfg(unix)]
pub(crate) fn try_flock(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
pub(crate) fn try_flock(_file: &File) -> bool {
    true
}
