//! Integration harness for Python package build frontends.
//!
//! The harness downloads reference projects, unpacks them, runs a build
//! frontend against them through several invocation paths, and checks that
//! a source distribution and a wheel come out. Unpacking goes through a safe
//! extractor that refuses any archive entry which would land outside the
//! destination directory.
//!
//! # Quick Start
//!
//! ```no_run
//! use buildprobe_core::ArchiveSource;
//! use buildprobe_core::ExtractionConfig;
//! use buildprobe_core::extract;
//!
//! # fn main() -> Result<(), buildprobe_core::ExtractionError> {
//! let source = ArchiveSource::from_path("pip-20.2.1.tar.gz");
//! let report = extract(&source, "/tmp/pip", &ExtractionConfig::default())?;
//! println!("Extracted {} files", report.files_extracted);
//! # Ok(())
//! # }
//! ```
//!
//! # Extraction guarantees
//!
//! - Every entry path, symlink target and hardlink target is validated
//!   before anything is written; one bad entry rejects the whole archive.
//! - Containment is decided on path components after normalization, so
//!   `/tmp/dest` does not contain `/tmp/destination-evil`.
//! - Symlinks created by the archive and symlinks already on disk are both
//!   followed when deciding where an entry lands.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod artifacts;
pub mod cache;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fetch;
pub mod formats;
pub mod frontend;
pub mod lock;
pub mod matrix;
pub mod project;
pub mod report;
pub mod security;
pub mod source;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use artifacts::ArtifactSet;
pub use cache::SourceCache;
pub use config::AllowedFeatures;
pub use config::ExtractionConfig;
pub use error::BuildError;
pub use error::CacheError;
pub use error::ExtractionError;
pub use error::FetchError;
pub use error::ProjectError;
pub use error::Result;
pub use error::ScenarioError;
pub use extraction::extract;
pub use extraction::extract_archive;
pub use fetch::Fetcher;
pub use fetch::HttpFetcher;
pub use frontend::BuildFrontend;
pub use frontend::BuildOptions;
pub use frontend::Call;
pub use frontend::Invocation;
pub use matrix::MatrixConfig;
pub use matrix::Outcome;
pub use matrix::Platform;
pub use matrix::Runner;
pub use matrix::Scenario;
pub use matrix::ScenarioResult;
pub use project::Project;
pub use project::ProjectSource;
pub use report::ExtractionReport;
pub use security::is_within_directory;
pub use source::ArchiveSource;
