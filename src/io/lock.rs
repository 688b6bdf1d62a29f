use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

const LOCK_FILE: &str = ".lock";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Exclusive advisory lock on a tally data directory.
///
/// Held for the whole load, mutate, save cycle of a command so that two
/// tally processes never interleave their writes. Released when dropped.
/// The `.lock` file itself stays in place: every holder must flock the same
/// inode, so it is never unlinked.
pub struct DataLock {
    _file: File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}: another tally command is still running")]
    Timeout { path: PathBuf },
}

impl DataLock {
    /// Wait up to `timeout` for the lock on `data_dir`.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::CreateError {
                path: path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    debug!(path = %path.display(), "lock acquired");
                    return Ok(DataLock { _file: file });
                }
                Err(_) if start.elapsed() < timeout => std::thread::sleep(RETRY_INTERVAL),
                Err(_) => return Err(LockError::Timeout { path }),
            }
        }
    }

    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, DEFAULT_TIMEOUT)
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_is_reusable_after_drop() {
        let tmp = TempDir::new().unwrap();
        let first = DataLock::acquire_default(tmp.path()).unwrap();
        assert!(tmp.path().join(LOCK_FILE).exists());
        drop(first);
        assert!(tmp.path().join(LOCK_FILE).exists());
        assert!(DataLock::acquire_default(tmp.path()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn waiter_that_takes_over_still_excludes_newcomers() {
        use std::sync::mpsc;
        use std::thread;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_path_buf();
        let first = DataLock::acquire_default(&dir).unwrap();

        let (acquired_tx, acquired_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let waiter_dir = dir.clone();
        let waiter = thread::spawn(move || {
            // Opens the lock file now and spins until `first` goes away
            let second = DataLock::acquire(&waiter_dir, Duration::from_secs(5)).unwrap();
            acquired_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            drop(second);
        });

        thread::sleep(Duration::from_millis(50));
        drop(first);
        acquired_rx
            .recv_timeout(Duration::from_secs(5))
            .unwrap();

        let third = DataLock::acquire(&dir, Duration::from_millis(200));
        assert!(matches!(third, Err(LockError::Timeout { .. })));

        release_tx.send(()).unwrap();
        waiter.join().unwrap();
        assert!(DataLock::acquire(&dir, Duration::from_millis(200)).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn second_lock_times_out() {
        let tmp = TempDir::new().unwrap();
        let _held = DataLock::acquire_default(tmp.path()).unwrap();
        let err = DataLock::acquire(tmp.path(), Duration::from_millis(30))
            .err()
            .unwrap();
        assert!(matches!(err, LockError::Timeout { .. }));
    }

    #[test]
    fn missing_dir_is_a_create_error() {
        let tmp = TempDir::new().unwrap();
        let err = DataLock::acquire_default(&tmp.path().join("absent"))
            .err()
            .unwrap();
        assert!(matches!(err, LockError::CreateError { .. }));
    }
}
