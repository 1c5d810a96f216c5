//! Extraction configuration.

/// Link kinds the extractor may create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedFeatures {
    /// Extract symlink entries whose target stays inside the destination.
    pub symlinks: bool,

    /// Extract hardlink entries whose target stays inside the destination.
    pub hardlinks: bool,
}

impl Default for AllowedFeatures {
    fn default() -> Self {
        Self {
            symlinks: true,
            hardlinks: true,
        }
    }
}

/// Configuration for [`extract`](crate::extract).
///
/// The defaults match what source tarballs of real projects need: links are
/// allowed as long as they resolve inside the destination, and permission
/// bits are kept so scripts stay executable.
///
/// # Examples
///
/// ```
/// use buildprobe_core::ExtractionConfig;
///
/// let config = ExtractionConfig::default();
/// assert!(config.allowed.symlinks);
///
/// let strict = ExtractionConfig::strict();
/// assert!(!strict.allowed.symlinks);
/// assert!(!strict.allowed.hardlinks);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Link kinds that may be extracted.
    pub allowed: AllowedFeatures,

    /// Apply permission bits from the archive (setuid, setgid and sticky
    /// bits are always dropped).
    pub preserve_permissions: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            allowed: AllowedFeatures::default(),
            preserve_permissions: true,
        }
    }
}

impl ExtractionConfig {
    /// Configuration that refuses every link entry.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            allowed: AllowedFeatures {
                symlinks: false,
                hardlinks: false,
            },
            ..Self::default()
        }
    }

    /// Masks an archive mode down to the bits that may be applied.
    #[must_use]
    pub const fn sanitize_mode(mode: u32) -> u32 {
        mode & 0o777
    }
}
