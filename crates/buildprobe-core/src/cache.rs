//! On-disk cache of downloaded source tarballs.

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tracing::debug;
use tracing::info;

use crate::CacheError;
use crate::FetchError;
use crate::Fetcher;
use crate::lock::CacheLock;

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "BUILDPROBE_CACHE_DIR";

/// Cache directory used when nothing else is configured.
pub const DEFAULT_CACHE_DIR: &str = ".integration-sources";

/// A directory of cached files, one per key.
///
/// Each key is guarded by its own lock file, `<root>/<key>.lock`, so several
/// processes sharing a cache download each file once. Entries are filled
/// into a temporary file and renamed into place, so a reader never sees a
/// partial download.
///
/// # Examples
///
/// ```no_run
/// use buildprobe_core::SourceCache;
/// use buildprobe_core::HttpFetcher;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = SourceCache::from_env();
/// let fetcher = HttpFetcher::new()?;
/// let path = cache.fetch_url(
///     "pip-20.2.1.tar.gz",
///     "https://github.com/pypa/pip/archive/20.2.1.tar.gz",
///     &fetcher,
/// )?;
/// println!("{}", path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCache {
    root: PathBuf,
}

impl SourceCache {
    /// Creates a cache rooted at `root`. Nothing is created until the first
    /// lookup.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a cache rooted at `$BUILDPROBE_CACHE_DIR`, or at
    /// `.integration-sources` in the current directory.
    #[must_use]
    pub fn from_env() -> Self {
        let root = std::env::var_os(CACHE_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR), PathBuf::from);
        Self::new(root)
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns where the entry for `key` is stored.
    #[must_use]
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Returns the lock file guarding `key`.
    #[must_use]
    pub fn lock_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.lock"))
    }

    /// Returns the entry for `key`, calling `filler` to produce it if it is
    /// not cached yet.
    ///
    /// `filler` runs while the key's lock is held and writes into a
    /// temporary file in the cache directory.
    ///
    /// # Errors
    ///
    /// - `CacheError::Io` for an unusable key or cache directory
    /// - `CacheError::Lock` if the key cannot be locked
    /// - `CacheError::Fill` if `filler` fails; nothing is stored
    pub fn get_or_fetch<F>(&self, key: &str, filler: F) -> Result<PathBuf, CacheError>
    where
        F: FnOnce(&mut dyn Write) -> Result<u64, FetchError>,
    {
        validate_key(key)?;
        std::fs::create_dir_all(&self.root)?;

        let _lock = CacheLock::acquire(&self.lock_path(key))?;
        let entry = self.entry_path(key);
        if entry.is_file() {
            debug!(key, path = %entry.display(), "cache hit");
            return Ok(entry);
        }

        let mut temp = NamedTempFile::new_in(&self.root)?;
        let bytes = filler(temp.as_file_mut()).map_err(|source| CacheError::Fill {
            key: key.to_string(),
            source,
        })?;
        temp.as_file_mut().flush()?;
        temp.as_file().sync_all()?;
        temp.persist(&entry).map_err(|e| e.error)?;

        info!(key, bytes, path = %entry.display(), "cached");
        Ok(entry)
    }

    /// Downloads `url` into the entry for `key` unless it is already cached.
    ///
    /// # Errors
    ///
    /// See [`SourceCache::get_or_fetch`].
    pub fn fetch_url(
        &self,
        key: &str,
        url: &str,
        fetcher: &dyn Fetcher,
    ) -> Result<PathBuf, CacheError> {
        self.get_or_fetch(key, |sink| fetcher.fetch(url, sink))
    }
}

impl Default for SourceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

fn validate_key(key: &str) -> Result<(), CacheError> {
    let single_component = Path::new(key)
        .components()
        .map(|c| matches!(c, std::path::Component::Normal(_)))
        .eq([true]);

    if single_component && !key.contains(['/', '\\']) {
        Ok(())
    } else {
        Err(CacheError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid cache key: {key:?}"),
        )))
    }
}
