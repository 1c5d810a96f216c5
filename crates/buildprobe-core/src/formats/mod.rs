//! Archive format readers.

pub mod detect;
pub mod tar;
pub mod traits;
pub mod zip;

pub use detect::ArchiveType;
pub use detect::detect_format;
pub use traits::ArchiveFormat;
pub use traits::EntryVisitor;

use crate::Result;
use crate::source::ReadSeek;

/// Opens a reader for the given archive type.
///
/// # Errors
///
/// Returns `InvalidArchive` if a ZIP central directory cannot be read.
pub fn open_format<'a>(
    kind: ArchiveType,
    reader: Box<dyn ReadSeek + 'a>,
) -> Result<Box<dyn ArchiveFormat + 'a>> {
    Ok(match kind {
        ArchiveType::Tar => Box::new(tar::TarFormat::new(reader)),
        ArchiveType::TarGz => Box::new(tar::TarFormat::gzip(reader)),
        ArchiveType::Zip => Box::new(zip::ZipFormat::new(reader)?),
    })
}
