//! TAR archive reader, plain or gzip-compressed.

use std::io::Read;
use std::path::PathBuf;

use flate2::read::GzDecoder;
use tar::Archive;

use super::traits::ArchiveFormat;
use super::traits::EntryVisitor;
use crate::ExtractionError;
use crate::Result;
use crate::types::ArchiveEntry;
use crate::types::EntryType;

/// TAR archive reader.
///
/// Supports POSIX ustar, GNU and PAX headers; long names and PAX records are
/// folded into the entry they describe by the `tar` crate. PAX global
/// headers are metadata only and produce no entry.
pub struct TarFormat<'a> {
    archive: Archive<Box<dyn Read + 'a>>,
    name: &'static str,
}

impl<'a> TarFormat<'a> {
    /// Opens an uncompressed tar stream.
    #[must_use]
    pub fn new(reader: Box<dyn Read + 'a>) -> Self {
        Self {
            archive: Archive::new(reader),
            name: "tar",
        }
    }

    /// Opens a gzip-compressed tar stream.
    #[must_use]
    pub fn gzip(reader: Box<dyn Read + 'a>) -> Self {
        Self {
            archive: Archive::new(Box::new(GzDecoder::new(reader))),
            name: "tar.gz",
        }
    }
}

impl ArchiveFormat for TarFormat<'_> {
    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        let entries = self
            .archive
            .entries()
            .map_err(|e| ExtractionError::invalid_archive("reading tar stream", e))?;

        for entry in entries {
            let mut entry =
                entry.map_err(|e| ExtractionError::invalid_archive("reading tar header", e))?;

            let Some(parsed) = parse_entry(&entry)? else {
                continue;
            };

            visit(&parsed, &mut entry)?;
        }

        Ok(())
    }

    fn format_name(&self) -> &'static str {
        self.name
    }
}

fn parse_entry<R: Read>(entry: &tar::Entry<'_, R>) -> Result<Option<ArchiveEntry>> {
    let path = entry
        .path()
        .map_err(|e| ExtractionError::invalid_archive("reading entry path", e))?
        .into_owned();

    let header = entry.header();
    let entry_type = match header.entry_type() {
        tar::EntryType::Regular | tar::EntryType::Continuous => EntryType::File,
        tar::EntryType::Directory => EntryType::Directory,
        tar::EntryType::Symlink => EntryType::Symlink {
            target: link_target(entry)?,
        },
        tar::EntryType::Link => EntryType::Hardlink {
            target: link_target(entry)?,
        },
        tar::EntryType::XGlobalHeader
        | tar::EntryType::XHeader
        | tar::EntryType::GNULongName
        | tar::EntryType::GNULongLink => return Ok(None),
        tar::EntryType::Char => EntryType::Special {
            kind: "character device",
        },
        tar::EntryType::Block => EntryType::Special {
            kind: "block device",
        },
        tar::EntryType::Fifo => EntryType::Special { kind: "fifo" },
        tar::EntryType::GNUSparse => EntryType::Special {
            kind: "sparse file",
        },
        _ => EntryType::Special {
            kind: "unknown entry type",
        },
    };

    Ok(Some(ArchiveEntry {
        path,
        entry_type,
        size: entry.size(),
        mode: header.mode().ok(),
    }))
}

fn link_target<R: Read>(entry: &tar::Entry<'_, R>) -> Result<PathBuf> {
    entry
        .link_name()
        .map_err(|e| ExtractionError::invalid_archive("reading link target", e))?
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| ExtractionError::InvalidArchive("link entry without target".into()))
}
