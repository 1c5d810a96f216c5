//! Write pass: creates planned entries on disk.

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tracing::trace;
use tracing::warn;

use super::copy::CopyBuffer;
use super::copy::copy_entry_data;
use super::plan::Action;
use super::plan::PlannedEntry;
use super::plan::PlannedKind;
use super::plan::ensure_on_disk;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::Result;
use crate::types::DestDir;

/// Applies validated actions to the destination directory.
///
/// Directory modes are collected and applied by [`EntryWriter::finish`], so
/// a read-only directory does not block writes of its own children.
pub struct EntryWriter<'d> {
    dest: &'d DestDir,
    report: ExtractionReport,
    buffer: CopyBuffer,
    dir_modes: Vec<(PathBuf, u32)>,
}

impl<'d> EntryWriter<'d> {
    /// Creates a writer for `dest`, which must already exist.
    #[must_use]
    pub fn new(dest: &'d DestDir) -> Self {
        Self {
            dest,
            report: ExtractionReport::new(),
            buffer: CopyBuffer::new(),
            dir_modes: Vec::new(),
        }
    }

    /// Performs one action.
    ///
    /// The on-disk containment check is repeated right before writing, since
    /// earlier entries may have created symlinks in the meantime.
    ///
    /// # Errors
    ///
    /// Returns `Io` on filesystem failures, `InvalidArchive` if the entry data
    /// cannot be read, and `PathTraversal` if the location no longer resolves
    /// inside the destination.
    pub fn write(&mut self, raw: &Path, action: &Action, data: &mut dyn Read) -> Result<()> {
        let planned = match action {
            Action::Write(planned) => planned,
            Action::Skip { kind } => {
                warn!(entry = %raw.display(), kind, "skipping entry that cannot be extracted");
                self.report.entries_skipped += 1;
                self.report
                    .add_warning(format!("skipped {kind}: {}", raw.display()));
                return Ok(());
            }
        };

        let target = self.dest.join_path(&planned.location);
        ensure_on_disk(self.dest, &target, raw)?;

        match &planned.kind {
            PlannedKind::Directory => {
                fs::create_dir_all(&target)?;
                if let Some(mode) = planned.mode {
                    self.dir_modes.push((target.clone(), mode));
                }
                self.report.directories_created += 1;
            }
            PlannedKind::File => {
                prepare_slot(&target)?;
                let written = write_file(&target, data, &mut self.buffer)?;
                if let Some(mode) = planned.mode {
                    set_mode(&target, mode)?;
                }
                self.report.files_extracted += 1;
                self.report.bytes_written += written;
            }
            PlannedKind::Symlink { target: link_target } => {
                prepare_slot(&target)?;
                create_symlink(link_target, &target)?;
                self.report.symlinks_created += 1;
            }
            PlannedKind::Hardlink { target: original } => {
                prepare_slot(&target)?;
                fs::hard_link(self.dest.join_path(original), &target)?;
                self.report.hardlinks_created += 1;
            }
        }

        trace!(entry = %raw.display(), location = %target.display(), "extracted");
        self.report.extracted.insert(self.entry_path(planned));
        Ok(())
    }

    /// Applies deferred directory modes, deepest first, and returns the
    /// report.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a mode cannot be applied.
    pub fn finish(mut self) -> Result<ExtractionReport> {
        self.dir_modes
            .sort_by_key(|(path, _)| std::cmp::Reverse(path.components().count()));
        for (path, mode) in &self.dir_modes {
            set_mode(path, *mode)?;
        }
        Ok(self.report)
    }

    fn entry_path(&self, planned: &PlannedEntry) -> PathBuf {
        self.dest.join(&planned.path)
    }
}

/// Creates the parent directory and clears whatever non-directory sits at
/// `path`, so a later entry replaces an earlier one instead of writing
/// through it.
fn prepare_slot(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Err(ExtractionError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("a directory already exists at {}", path.display()),
        ))),
        Ok(_) => {
            fs::remove_file(path)?;
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn write_file(path: &Path, data: &mut dyn Read, buffer: &mut CopyBuffer) -> Result<u64> {
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(64 * 1024, file);
    let written = copy_entry_data(data, &mut writer, buffer)?;
    writer.flush()?;
    Ok(written)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_symlink(_target: &Path, link: &Path) -> Result<()> {
    Err(ExtractionError::SecurityViolation {
        reason: format!(
            "symlinks are not supported on this platform: {}",
            link.display()
        ),
    })
}
