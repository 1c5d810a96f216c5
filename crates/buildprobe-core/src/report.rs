//! Extraction outcome reporting.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Report of a completed extraction.
///
/// `extracted` holds the absolute path of every entry that was written, so
/// two extractions of the same archive can be compared directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Absolute paths created or overwritten, one per extracted entry.
    pub extracted: BTreeSet<PathBuf>,

    /// Number of regular files written.
    pub files_extracted: usize,

    /// Number of directory entries processed.
    pub directories_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// Number of hardlinks created.
    pub hardlinks_created: usize,

    /// Total file bytes written.
    pub bytes_written: u64,

    /// Entries that were not extracted (device nodes, FIFOs).
    pub entries_skipped: usize,

    /// Warnings generated during extraction.
    pub warnings: Vec<String>,

    /// Wall-clock time of the whole operation, validation included.
    pub duration: Duration,
}

impl ExtractionReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning message.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Returns the number of entries written.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted
            + self.directories_created
            + self.symlinks_created
            + self.hardlinks_created
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
