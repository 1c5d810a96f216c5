//! Validated hardlink type.

use crate::ExtractionConfig;
use crate::ExtractionError;
use crate::Result;
use std::path::Path;

use super::DestDir;
use super::SafePath;

/// A hardlink whose target is an entry path inside the destination.
///
/// Tar stores hardlink targets relative to the archive root, not to the
/// link's directory, so the target is validated exactly like an entry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeHardlink {
    link: SafePath,
    target: SafePath,
}

impl SafeHardlink {
    /// Validates a hardlink entry.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::SecurityViolation` if hardlinks are disabled or
    ///   the target names the destination itself
    /// - `ExtractionError::HardlinkEscape` if the target resolves outside
    ///   `dest`
    pub fn validate(
        link: &SafePath,
        target: &Path,
        dest: &DestDir,
        config: &ExtractionConfig,
    ) -> Result<Self> {
        if !config.allowed.hardlinks {
            return Err(ExtractionError::SecurityViolation {
                reason: format!("hardlinks not allowed: {}", link.as_path().display()),
            });
        }

        let target = SafePath::validate(target, dest).map_err(|e| match e {
            ExtractionError::PathTraversal { .. } => ExtractionError::HardlinkEscape {
                path: link.as_path().to_path_buf(),
            },
            other => other,
        })?;

        if target.is_root() {
            return Err(ExtractionError::SecurityViolation {
                reason: format!(
                    "hardlink targets the extraction root: {}",
                    link.as_path().display()
                ),
            });
        }

        Ok(Self {
            link: link.clone(),
            target,
        })
    }

    /// Returns the link path, relative to the destination.
    #[inline]
    #[must_use]
    pub fn link_path(&self) -> &Path {
        self.link.as_path()
    }

    /// Returns the normalized target, relative to the destination.
    #[inline]
    #[must_use]
    pub fn target_path(&self) -> &Path {
        self.target.as_path()
    }
}
