//! Error types for extraction, fetching, caching and build invocation.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Errors that can occur during archive extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Filesystem operation failed (permissions, disk full, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive format is unsupported or unrecognized.
    #[error("unsupported archive format")]
    UnsupportedFormat,

    /// Archive is corrupted or cannot be read.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// An entry resolves outside the destination directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The entry path as stored in the archive.
        path: PathBuf,
    },

    /// Symlink target resolves outside the destination directory.
    #[error("symlink target outside extraction directory: {path}")]
    SymlinkEscape {
        /// The symlink entry path.
        path: PathBuf,
    },

    /// Hardlink target resolves outside the destination directory.
    #[error("hardlink target outside extraction directory: {path}")]
    HardlinkEscape {
        /// The hardlink entry path.
        path: PathBuf,
    },

    /// Operation not permitted by the extraction configuration.
    #[error("operation denied by extraction policy: {reason}")]
    SecurityViolation {
        /// Reason for the violation.
        reason: String,
    },
}

impl ExtractionError {
    /// Returns `true` if this error was raised by a containment or policy
    /// check rather than by the archive reader or the filesystem.
    ///
    /// # Examples
    ///
    /// ```
    /// use buildprobe_core::ExtractionError;
    /// use std::path::PathBuf;
    ///
    /// let err = ExtractionError::PathTraversal {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = ExtractionError::UnsupportedFormat;
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::PathTraversal { .. }
                | Self::SymlinkEscape { .. }
                | Self::HardlinkEscape { .. }
                | Self::SecurityViolation { .. }
        )
    }

    /// Returns the offending entry path for containment failures.
    #[must_use]
    pub fn entry_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PathTraversal { path }
            | Self::SymlinkEscape { path }
            | Self::HardlinkEscape { path } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn invalid_archive(context: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidArchive(format!("{context}: {err}"))
    }
}

/// Errors raised while downloading a file.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Transport-level failure (DNS, TLS, connection reset).
    #[error("request to {url} failed: {source}")]
    Http {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Writing the response body failed.
    #[error("failed to write response body: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the on-disk source cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The advisory lock for a cache key could not be taken.
    #[error("failed to lock {path}: {source}")]
    Lock {
        /// Lock file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Cache directory or entry could not be written.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The fill callback failed; no entry was stored.
    #[error("failed to populate cache entry {key}: {source}")]
    Fill {
        /// Cache key being filled.
        key: String,
        /// Download failure.
        #[source]
        source: FetchError,
    },
}

/// Errors raised while preparing a reference project.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// No project with that name is registered.
    #[error("unknown project: {0}")]
    Unknown(String),

    /// Fetching or caching the project tarball failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Extraction of the project tarball failed.
    #[error("failed to extract {archive} (from {url}): {source}")]
    Extract {
        /// Cached archive path.
        archive: PathBuf,
        /// Download URL of the archive.
        url: String,
        /// Extraction failure.
        #[source]
        source: ExtractionError,
    },

    /// Copying a local project tree failed.
    #[error("failed to copy project tree {path}: {source}")]
    Copy {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The extracted archive lacks the expected top-level directory.
    #[error("archive {archive} has no top-level directory {expected}")]
    MissingRoot {
        /// Cached archive path.
        archive: PathBuf,
        /// Expected directory name.
        expected: String,
    },
}

/// Errors raised while running a build frontend or checking its output.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The frontend process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The frontend exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Program that ran.
        program: String,
        /// Exit status.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The in-process frontend reported an error.
    #[error("build failed: {0}")]
    Frontend(String),

    /// The output directory lacks an expected artifact kind.
    #[error("no {kind} found in {dir}")]
    MissingArtifact {
        /// Artifact kind ("sdist" or "wheel").
        kind: &'static str,
        /// Output directory scanned.
        dir: PathBuf,
    },

    /// Output directory or work directory I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single scenario did not produce its artifacts.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// The project sources could not be prepared.
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// The frontend failed or produced incomplete output.
    #[error(transparent)]
    Build(#[from] BuildError),
}
