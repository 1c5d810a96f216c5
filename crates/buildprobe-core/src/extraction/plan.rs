//! Validation pass.
//!
//! Every entry is checked before the first byte is written, so an archive
//! with one bad member leaves nothing behind. Checks run in two stages:
//!
//! 1. Per entry, lexically: the entry path and any link target must stay
//!    inside the destination, and the configuration must allow the entry.
//! 2. Across entries: each path is replayed through the symlinks the archive
//!    itself will create, then through whatever already exists on disk.
//!
//! The second stage is what catches link chains such as `t -> .` followed
//! by `s -> t/..`, where each link looks harmless on its own.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::ArchiveSource;
use crate::ExtractionConfig;
use crate::ExtractionError;
use crate::Result;
use crate::security::LinkTree;
use crate::security::Resolution;
use crate::security::resolve_on_disk;
use crate::types::ArchiveEntry;
use crate::types::DestDir;
use crate::types::EntryType;
use crate::types::SafeHardlink;
use crate::types::SafePath;
use crate::types::SafeSymlink;

/// What the write pass does with one entry.
#[derive(Debug, Clone)]
pub enum Action {
    /// Create the entry.
    Write(PlannedEntry),
    /// Leave the entry out and record a warning.
    Skip {
        /// Entry kind, for the warning.
        kind: &'static str,
    },
}

/// A validated entry.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    /// Normalized path as named in the archive, relative to the destination.
    pub path: SafePath,
    /// Where the entry lands once archive symlinks are followed.
    pub location: PathBuf,
    /// Entry kind and link data.
    pub kind: PlannedKind,
    /// Sanitized mode to apply, if permissions are preserved.
    pub mode: Option<u32>,
}

/// Entry kinds that reach the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symlink with its target exactly as stored.
    Symlink {
        /// Raw target.
        target: PathBuf,
    },
    /// Hardlink to an already resolved location.
    Hardlink {
        /// Target location relative to the destination.
        target: PathBuf,
    },
}

#[derive(Debug)]
struct Slot {
    raw: PathBuf,
    type_name: &'static str,
    action: Action,
}

/// Ordered list of actions, one per archive entry.
#[derive(Debug)]
pub struct ExtractionPlan {
    slots: Vec<Slot>,
}

enum Checked {
    Entry {
        path: SafePath,
        kind: CheckedKind,
        mode: Option<u32>,
    },
    Skip(&'static str),
}

enum CheckedKind {
    File,
    Directory,
    Symlink(SafeSymlink),
    Hardlink {
        link: SafeHardlink,
        raw_target: PathBuf,
    },
}

impl ExtractionPlan {
    /// Reads every entry of `source` and validates it against `dest`.
    ///
    /// Entry data is read to the end as well, so corrupt compressed data is
    /// reported here rather than halfway through writing.
    ///
    /// # Errors
    ///
    /// Returns the first containment, policy or format error found.
    pub fn build(
        source: &ArchiveSource,
        dest: &DestDir,
        config: &ExtractionConfig,
    ) -> Result<Self> {
        let mut format = source.open()?;
        let mut checked: Vec<(PathBuf, &'static str, Checked)> = Vec::new();
        let mut links = LinkTree::new();

        format.for_each_entry(&mut |entry, data| {
            let result = check_entry(entry, dest, config, &mut links)?;
            std::io::copy(data, &mut std::io::sink())
                .map_err(|e| ExtractionError::invalid_archive("reading entry data", e))?;
            checked.push((entry.path.clone(), entry.entry_type.name(), result));
            Ok(())
        })?;

        debug!(
            entries = checked.len(),
            links = links.len(),
            format = format.format_name(),
            "archive entries passed lexical checks"
        );

        let slots = checked
            .into_iter()
            .map(|(raw, type_name, checked)| {
                let action = resolve_entry(&raw, checked, dest, &links)?;
                Ok(Slot {
                    raw,
                    type_name,
                    action,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        check_overlaps(&slots)?;

        Ok(Self { slots })
    }

    /// Number of entries in the archive, skipped ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` for an archive without entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the action for the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchive` if `entry` is not the entry that was
    /// validated at that position.
    pub fn action_for(&self, index: usize, entry: &ArchiveEntry) -> Result<&Action> {
        match self.slots.get(index) {
            Some(slot) if slot.raw == entry.path && slot.type_name == entry.entry_type.name() => {
                Ok(&slot.action)
            }
            _ => Err(archive_changed()),
        }
    }
}

pub(crate) fn archive_changed() -> ExtractionError {
    ExtractionError::InvalidArchive("archive changed between validation and extraction".into())
}

fn check_entry(
    entry: &ArchiveEntry,
    dest: &DestDir,
    config: &ExtractionConfig,
    links: &mut LinkTree,
) -> Result<Checked> {
    let path = SafePath::validate(&entry.path, dest)?;

    let kind = match &entry.entry_type {
        EntryType::File => CheckedKind::File,
        EntryType::Directory => CheckedKind::Directory,
        EntryType::Symlink { target } => {
            let symlink = SafeSymlink::validate(&path, target, dest, config)?;
            links.insert(path.as_path(), target);
            CheckedKind::Symlink(symlink)
        }
        EntryType::Hardlink { target } => CheckedKind::Hardlink {
            link: SafeHardlink::validate(&path, target, dest, config)?,
            raw_target: target.clone(),
        },
        EntryType::Special { kind } => return Ok(Checked::Skip(*kind)),
    };

    if path.is_root() && !matches!(kind, CheckedKind::Directory) {
        return Err(ExtractionError::SecurityViolation {
            reason: format!(
                "{} entry replaces the extraction root: {}",
                entry.entry_type.name(),
                entry.path.display()
            ),
        });
    }

    let mode = match kind {
        CheckedKind::File | CheckedKind::Directory if config.preserve_permissions => {
            entry.mode.map(ExtractionConfig::sanitize_mode)
        }
        _ => None,
    };

    Ok(Checked::Entry { path, kind, mode })
}

fn resolve_entry(
    raw: &Path,
    checked: Checked,
    dest: &DestDir,
    links: &LinkTree,
) -> Result<Action> {
    let (path, kind, mode) = match checked {
        Checked::Skip(kind) => return Ok(Action::Skip { kind }),
        Checked::Entry { path, kind, mode } => (path, kind, mode),
    };

    // The raw path is walked, not the normalized one: `up/..` is a no-op
    // lexically but not when `up` is a symlink. A directory entry also
    // follows a final link, so `a -> sub` then `a/` creates `sub`.
    let follow_last = matches!(kind, CheckedKind::Directory);
    let location = match links.resolve(walkable(raw, path.as_path()), follow_last) {
        Resolution::Inside(location) => location,
        Resolution::Escapes => return Err(traversal(raw)),
        Resolution::TooManyLinks => return Err(link_loop(raw)),
    };
    ensure_on_disk(dest, &dest.join_path(&location), raw)?;
    ensure_on_disk(dest, &dest.join_path(raw), raw)?;

    let kind = match kind {
        CheckedKind::File => PlannedKind::File,
        CheckedKind::Directory => PlannedKind::Directory,
        CheckedKind::Symlink(symlink) => {
            ensure_link_in_place(raw, &path, &location)?;
            let escape = || ExtractionError::SymlinkEscape {
                path: raw.to_path_buf(),
            };
            let target_from_root = symlink.target_from_root();
            let real = match links.resolve(&target_from_root, true) {
                Resolution::Inside(real) => real,
                Resolution::Escapes => return Err(escape()),
                Resolution::TooManyLinks => return Err(link_loop(raw)),
            };
            ensure_on_disk(dest, &dest.join_path(&real), raw).map_err(|_| escape())?;
            ensure_on_disk(dest, &dest.join_path(&target_from_root), raw).map_err(|_| escape())?;
            PlannedKind::Symlink {
                target: symlink.target_path().to_path_buf(),
            }
        }
        CheckedKind::Hardlink { link, raw_target } => {
            ensure_link_in_place(raw, &path, &location)?;
            let escape = || ExtractionError::HardlinkEscape {
                path: raw.to_path_buf(),
            };
            let target = match links.resolve(walkable(&raw_target, link.target_path()), true) {
                Resolution::Inside(real) => real,
                Resolution::Escapes => return Err(escape()),
                Resolution::TooManyLinks => return Err(link_loop(raw)),
            };
            ensure_on_disk(dest, &dest.join_path(&target), raw).map_err(|_| escape())?;
            ensure_on_disk(dest, &dest.join_path(&raw_target), raw).map_err(|_| escape())?;
            PlannedKind::Hardlink { target }
        }
    };

    Ok(Action::Write(PlannedEntry {
        path,
        location,
        kind,
        mode,
    }))
}

/// Rejects entries that cannot share the tree with an earlier one: a
/// directory where a file or link was placed, or the reverse.
fn check_overlaps(slots: &[Slot]) -> Result<()> {
    // location -> is a directory
    let mut placed: HashMap<&Path, bool> = HashMap::new();

    for slot in slots {
        let Action::Write(entry) = &slot.action else {
            continue;
        };
        let location = entry.location.as_path();
        let is_dir = entry.kind == PlannedKind::Directory;

        let parents = location
            .ancestors()
            .skip(1)
            .filter(|parent| !parent.as_os_str().is_empty());
        for parent in parents {
            if placed.insert(parent, true) == Some(false) {
                return Err(overlap(&slot.raw));
            }
        }
        if placed.insert(location, is_dir).is_some_and(|was_dir| was_dir != is_dir) {
            return Err(overlap(&slot.raw));
        }
    }
    Ok(())
}

/// Rejects `path` if it resolves outside `dest` through links already on disk.
pub(crate) fn ensure_on_disk(dest: &DestDir, path: &Path, raw: &Path) -> Result<()> {
    let resolved = resolve_on_disk(path)?;
    if dest.contains(&resolved) {
        Ok(())
    } else {
        Err(traversal(raw))
    }
}

// Absolute entry paths that passed lexical validation point back into the
// destination; only their normalized relative form can be walked.
fn walkable<'p>(raw: &'p Path, normalized: &'p Path) -> &'p Path {
    if raw.has_root() { normalized } else { raw }
}

// Links are recorded under their normalized path, so a link has to land
// exactly there: no parent of it may itself be a link.
fn ensure_link_in_place(raw: &Path, path: &SafePath, location: &Path) -> Result<()> {
    if location == path.as_path() {
        return Ok(());
    }
    Err(ExtractionError::SecurityViolation {
        reason: format!("link created beneath another link: {}", raw.display()),
    })
}

fn overlap(raw: &Path) -> ExtractionError {
    ExtractionError::InvalidArchive(format!(
        "entry conflicts with an earlier entry of another kind: {}",
        raw.display()
    ))
}

fn traversal(raw: &Path) -> ExtractionError {
    ExtractionError::PathTraversal {
        path: raw.to_path_buf(),
    }
}

fn link_loop(raw: &Path) -> ExtractionError {
    ExtractionError::SecurityViolation {
        reason: format!("too many levels of symbolic links: {}", raw.display()),
    }
}
