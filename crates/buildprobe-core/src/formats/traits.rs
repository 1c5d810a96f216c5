//! Common trait for archive format readers.

use std::io::Read;

use crate::Result;
use crate::types::ArchiveEntry;

/// Callback invoked once per entry with its header and a reader over its
/// data.
pub type EntryVisitor<'v> = dyn FnMut(&ArchiveEntry, &mut dyn Read) -> Result<()> + 'v;

/// An opened archive that can enumerate its entries once, in archive order.
///
/// Readers translate their format's header fields into [`ArchiveEntry`] and
/// swallow pure metadata records (PAX global headers and the like). Errors
/// from the underlying decoder surface as
/// [`ExtractionError::InvalidArchive`](crate::ExtractionError::InvalidArchive).
pub trait ArchiveFormat {
    /// Visits every entry. Stops at the first error returned by `visit`.
    ///
    /// # Errors
    ///
    /// Returns the visitor's error, or `InvalidArchive` if the archive cannot
    /// be decoded.
    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()>;

    /// Returns the archive format name.
    fn format_name(&self) -> &'static str;
}
