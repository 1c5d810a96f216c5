//! Archive format detection.

use std::path::Path;

use crate::ExtractionError;
use crate::Result;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGICS: [[u8; 4]; 3] = [*b"PK\x03\x04", *b"PK\x05\x06", *b"PK\x07\x08"];
const USTAR_OFFSET: usize = 257;
const USTAR_MAGIC: &[u8; 5] = b"ustar";
const TAR_BLOCK: usize = 512;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// Tar archive (uncompressed).
    Tar,
    /// Gzip-compressed tar archive.
    TarGz,
    /// ZIP archive.
    Zip,
}

impl ArchiveType {
    /// Returns the conventional name of the format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }
}

/// Detects the archive type from its leading bytes.
///
/// Magic bytes win; the file name is consulted only when they are
/// inconclusive. Headers that are at least one tar block long and match
/// nothing else are read as old-style tar.
///
/// # Errors
///
/// Returns `ExtractionError::UnsupportedFormat` if nothing matches.
pub fn detect_format(header: &[u8], name_hint: Option<&Path>) -> Result<ArchiveType> {
    if header.starts_with(&GZIP_MAGIC) {
        return Ok(ArchiveType::TarGz);
    }

    if ZIP_MAGICS.iter().any(|magic| header.starts_with(magic)) {
        return Ok(ArchiveType::Zip);
    }

    if header
        .get(USTAR_OFFSET..USTAR_OFFSET + USTAR_MAGIC.len())
        .is_some_and(|magic| magic == USTAR_MAGIC)
    {
        return Ok(ArchiveType::Tar);
    }

    if let Some(kind) = name_hint.and_then(detect_from_extension) {
        return Ok(kind);
    }

    if header.len() >= TAR_BLOCK {
        return Ok(ArchiveType::Tar);
    }

    Err(ExtractionError::UnsupportedFormat)
}

/// Detects the archive type from a file name.
#[must_use]
pub fn detect_from_extension(path: &Path) -> Option<ArchiveType> {
    let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveType::TarGz)
    } else if name.ends_with(".tar") {
        Some(ArchiveType::Tar)
    } else if name.ends_with(".zip") || name.ends_with(".whl") {
        Some(ArchiveType::Zip)
    } else {
        None
    }
}
