//! ZIP archive reader.

use std::io::Read;
use std::path::PathBuf;

use zip::ZipArchive;

use super::traits::ArchiveFormat;
use super::traits::EntryVisitor;
use crate::ExtractionError;
use crate::Result;
use crate::source::ReadSeek;
use crate::types::ArchiveEntry;
use crate::types::EntryType;

/// ZIP archive reader.
///
/// Symlinks are recognized from the Unix mode in the external attributes;
/// their data is the link target. Hardlinks and special files do not exist
/// in ZIP.
pub struct ZipFormat<'a> {
    archive: ZipArchive<Box<dyn ReadSeek + 'a>>,
}

impl<'a> ZipFormat<'a> {
    /// Reads the central directory.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchive` if the central directory is missing or
    /// corrupt.
    pub fn new(reader: Box<dyn ReadSeek + 'a>) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| ExtractionError::invalid_archive("reading zip central directory", e))?;
        Ok(Self { archive })
    }
}

impl ArchiveFormat for ZipFormat<'_> {
    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        for index in 0..self.archive.len() {
            let mut file = self
                .archive
                .by_index(index)
                .map_err(|e| ExtractionError::invalid_archive("reading zip entry", e))?;

            let path = PathBuf::from(file.name());
            let mode = file.unix_mode();
            let size = file.size();

            let entry_type = if file.is_dir() {
                EntryType::Directory
            } else if file.is_symlink() {
                let mut target = String::new();
                file.read_to_string(&mut target)
                    .map_err(|e| ExtractionError::invalid_archive("reading symlink target", e))?;
                EntryType::Symlink {
                    target: PathBuf::from(target),
                }
            } else {
                EntryType::File
            };

            let entry = ArchiveEntry {
                path,
                entry_type,
                size,
                mode,
            };
            visit(&entry, &mut file)?;
        }

        Ok(())
    }

    fn format_name(&self) -> &'static str {
        "zip"
    }
}
