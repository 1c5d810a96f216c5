//! Advisory file locks for cache entries.

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::CacheError;

/// An exclusive advisory lock held on a lock file.
///
/// The lock is released when the value is dropped and the file handle
/// closes. The lock file itself is left in place.
#[derive(Debug)]
pub struct CacheLock {
    _file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Blocks until an exclusive lock on `path` is held.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Lock` if the file cannot be opened or locked.
    pub fn acquire(path: &Path) -> Result<Self, CacheError> {
        let file = open_lock_file(path)?;
        lock_exclusive(&file).map_err(|source| CacheError::Lock {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(lock = %path.display(), "acquired cache lock");
        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    /// Takes the lock only if nobody else holds it.
    #[cfg(test)]
    fn try_acquire(path: &Path) -> Result<Option<Self>, CacheError> {
        let file = open_lock_file(path)?;
        match try_lock_exclusive(&file) {
            Ok(true) => Ok(Some(Self {
                _file: file,
                path: path.to_path_buf(),
            })),
            Ok(false) => Ok(None),
            Err(source) => Err(CacheError::Lock {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(path: &Path) -> Result<File, CacheError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|source| CacheError::Lock {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
    use rustix::fs::FlockOperation;
    use rustix::fs::flock;
    use std::os::fd::AsFd;

    flock(file.as_fd(), FlockOperation::LockExclusive)
        .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(all(unix, test))]
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
    use rustix::fs::FlockOperation;
    use rustix::fs::flock;
    use std::os::fd::AsFd;

    match flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive) {
        Ok(()) => Ok(true),
        Err(e) if e == rustix::io::Errno::WOULDBLOCK => Ok(false),
        Err(e) => Err(io::Error::from_raw_os_error(e.raw_os_error())),
    }
}

#[cfg(not(unix))]
fn lock_exclusive(file: &File) -> io::Result<()> {
    file.lock()
}

#[cfg(all(not(unix), test))]
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
    match file.try_lock() {
        Ok(()) => Ok(true),
        Err(std::fs::TryLockError::WouldBlock) => Ok(false),
        Err(std::fs::TryLockError::Error(e)) => Err(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_excludes_second_holder() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pip-20.2.1.tar.gz.lock");

        let held = CacheLock::acquire(&path).expect("first lock");
        assert_eq!(held.path(), path);
        assert!(CacheLock::try_acquire(&path).unwrap().is_none());

        drop(held);
        assert!(CacheLock::try_acquire(&path).unwrap().is_some());
        assert!(path.exists());
    }

    #[test]
    fn test_lock_waits_for_release() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("key.lock");

        let held = CacheLock::acquire(&path).unwrap();
        let waiter = {
            let path = path.clone();
            std::thread::spawn(move || CacheLock::acquire(&path).map(|_| ()))
        };

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!waiter.is_finished());
        drop(held);
        waiter.join().unwrap().unwrap();
    }

    #[test]
    fn test_missing_directory_is_lock_error() {
        let temp = TempDir::new().unwrap();
        let result = CacheLock::acquire(&temp.path().join("missing/key.lock"));
        assert!(matches!(result, Err(CacheError::Lock { .. })));
    }
}
