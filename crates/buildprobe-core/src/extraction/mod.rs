//! Validate-then-write archive extraction.

pub mod copy;
pub mod plan;
pub mod writer;

use std::path::Path;
use std::time::Instant;

use tracing::info;
use tracing::warn;

use crate::ArchiveSource;
use crate::ExtractionConfig;
use crate::ExtractionReport;
use crate::Result;
use crate::types::DestDir;

pub use plan::ExtractionPlan;
pub use writer::EntryWriter;

/// Extracts `source` into `destination`.
///
/// All entries are validated first; if any entry would land outside the
/// destination, the call fails before the destination is even created.
/// Only then is the archive read a second time and written out.
///
/// # Errors
///
/// - `PathTraversal`, `SymlinkEscape`, `HardlinkEscape` or
///   `SecurityViolation` if an entry is rejected (nothing is written)
/// - `UnsupportedFormat` or `InvalidArchive` if the archive cannot be read
/// - `Io` if the filesystem fails
///
/// # Examples
///
/// ```no_run
/// use buildprobe_core::ArchiveSource;
/// use buildprobe_core::ExtractionConfig;
/// use buildprobe_core::extract;
///
/// # fn main() -> Result<(), buildprobe_core::ExtractionError> {
/// let source = ArchiveSource::from_path(".integration-sources/pip-20.2.1.tar.gz");
/// let report = extract(&source, "/tmp/pip", &ExtractionConfig::default())?;
/// println!("{} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract(
    source: &ArchiveSource,
    destination: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionReport> {
    let start = Instant::now();
    let dest = DestDir::new(destination.as_ref())?;

    let plan = ExtractionPlan::build(source, &dest, config).inspect_err(|e| {
        warn!(source = %source.describe(), error = %e, "archive rejected");
    })?;

    dest.create()?;

    let mut writer = EntryWriter::new(&dest);
    let mut format = source.open()?;
    let mut index = 0;
    format.for_each_entry(&mut |entry, data| {
        let action = plan.action_for(index, entry)?;
        index += 1;
        writer.write(&entry.path, action, data)
    })?;

    if index != plan.len() {
        return Err(plan::archive_changed());
    }

    let mut report = writer.finish()?;
    report.duration = start.elapsed();

    info!(
        source = %source.describe(),
        dest = %dest.as_path().display(),
        files = report.files_extracted,
        directories = report.directories_created,
        links = report.symlinks_created + report.hardlinks_created,
        skipped = report.entries_skipped,
        "extraction complete"
    );

    Ok(report)
}

/// Extracts the archive file at `archive` into `destination`.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_archive(
    archive: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionReport> {
    extract(
        &ArchiveSource::from_path(archive.as_ref()),
        destination,
        config,
    )
}
