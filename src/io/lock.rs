use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long `acquire_default` waits for another process to finish
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory lock on `.gtd/.lock`, held while a batch rewrites inbox files.
///
/// Line numbers are only valid for the file contents they were scanned
/// from, so two processing runs must never interleave.
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another gtd process may be processing the inbox")]
    Timeout { path: PathBuf },
}

impl FileLock {
    /// Acquire the lock, waiting up to `timeout`.
    pub fn acquire(gtd_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = gtd_dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::CreateError {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + timeout;
        while try_lock(&file).is_err() {
            if Instant::now() >= deadline {
                return Err(LockError::Timeout { path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(FileLock { _file: file, path })
    }

    pub fn acquire_default(gtd_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(gtd_dir, DEFAULT_TIMEOUT)
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // flock is released with the file handle
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> std::io::Result<()> {
    Ok(())
}
