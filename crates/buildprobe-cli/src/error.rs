//! Error conversion utilities for CLI.
//!
//! Converts buildprobe-core's typed errors (thiserror) into contextual
//! errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use buildprobe_core::CacheError;
use buildprobe_core::ExtractionError;
use buildprobe_core::FetchError;
use buildprobe_core::Project;
use buildprobe_core::ProjectError;
use std::path::Path;

/// Converts `ExtractionError` to an anyhow error naming the archive.
pub fn convert_extraction_error(err: ExtractionError, archive: &Path) -> anyhow::Error {
    match err {
        ExtractionError::PathTraversal { path } => anyhow!(
            "Security violation: archive '{}' attempted path traversal with '{}'\n\
             HINT: This archive may be malicious. Do not extract from untrusted sources.",
            archive.display(),
            path.display()
        ),
        ExtractionError::SymlinkEscape { path } => anyhow!(
            "Security violation: symlink '{}' in '{}' points outside the destination\n\
             HINT: This archive may be malicious. Do not extract from untrusted sources.",
            path.display(),
            archive.display()
        ),
        ExtractionError::HardlinkEscape { path } => anyhow!(
            "Security violation: hardlink '{}' in '{}' points outside the destination\n\
             HINT: This archive may be malicious. Do not extract from untrusted sources.",
            path.display(),
            archive.display()
        ),
        ExtractionError::SecurityViolation { reason } => anyhow!(
            "Security violation in '{}': {reason}\n\
             HINT: Links are refused with --strict; drop it if the archive is trusted.",
            archive.display()
        ),
        ExtractionError::Io(io_err) => {
            anyhow!("I/O error while processing '{}': {io_err}", archive.display())
        }
        ExtractionError::UnsupportedFormat => anyhow!(
            "Archive format not supported: {}\n\
             HINT: Supported formats: tar, tar.gz, tgz, zip, whl",
            archive.display()
        ),
        ExtractionError::InvalidArchive(reason) => anyhow!(
            "Invalid archive '{}': {reason}\n\
             HINT: The archive may be corrupted or truncated.",
            archive.display()
        ),
    }
}

/// Adds archive context to an extraction result.
pub fn add_archive_context<T>(
    result: Result<T, ExtractionError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_extraction_error(e, archive))
}

/// Converts `ProjectError` to an anyhow error with guidance.
pub fn convert_project_error(err: ProjectError) -> anyhow::Error {
    match err {
        ProjectError::Unknown(name) => {
            let known: Vec<_> = Project::reference().into_iter().map(|p| p.name).collect();
            anyhow!(
                "Unknown project '{name}'\n\
                 HINT: Known projects: {}",
                known.join(", ")
            )
        }
        ProjectError::Cache(CacheError::Fill {
            key,
            source: source @ (FetchError::Http { .. } | FetchError::Status { .. }),
        }) => anyhow!(
            "Failed to download {key}: {source}\n\
             HINT: Check network access to github.com, or pre-populate the cache directory."
        ),
        ProjectError::Cache(CacheError::Lock { path, source }) => anyhow!(
            "Failed to lock cache entry {}: {source}\n\
             HINT: Check that the cache directory is writable.",
            path.display()
        ),
        ProjectError::Extract {
            archive,
            url,
            source,
        } => convert_extraction_error(source, &archive).context(format!("downloaded from {url}")),
        ProjectError::MissingRoot { archive, expected } => anyhow!(
            "Archive '{}' has no top-level directory '{expected}'\n\
             HINT: Delete the cached archive to download it again.",
            archive.display()
        ),
        other => anyhow::Error::from(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_convert_path_traversal_error() {
        let err = ExtractionError::PathTraversal {
            path: PathBuf::from("../../etc/passwd"),
        };
        let msg = format!("{:?}", convert_extraction_error(err, Path::new("malicious.tar.gz")));
        assert!(msg.contains("path traversal"));
        assert!(msg.contains("malicious.tar.gz"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_io_error() {
        let err = ExtractionError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = format!("{:?}", convert_extraction_error(err, Path::new("archive.tar.gz")));
        assert!(msg.contains("I/O error"));
    }

    #[test]
    fn test_convert_unknown_project() {
        let msg = format!("{:?}", convert_project_error(ProjectError::Unknown("numpy".into())));
        assert!(msg.contains("numpy"));
        assert!(msg.contains("dateutil, pip, Solaar, flit"));
    }

    #[test]
    fn test_convert_extract_error_keeps_url() {
        let err = ProjectError::Extract {
            archive: PathBuf::from(".integration-sources/pip-20.2.1.tar.gz"),
            url: "https://github.com/pypa/pip/archive/20.2.1.tar.gz".into(),
            source: ExtractionError::PathTraversal {
                path: PathBuf::from("../x"),
            },
        };
        let msg = format!("{:?}", convert_project_error(err));
        assert!(msg.contains("pip-20.2.1.tar.gz"));
        assert!(msg.contains("https://github.com/pypa/pip/archive/20.2.1.tar.gz"));
    }
}
