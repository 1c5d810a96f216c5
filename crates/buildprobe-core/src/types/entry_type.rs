//! Archive entry metadata.

use std::path::PathBuf;

/// Type of entry in an archive.
///
/// Link targets are carried exactly as stored and have NOT been validated.
///
/// # Examples
///
/// ```
/// use buildprobe_core::types::EntryType;
/// use std::path::PathBuf;
///
/// let symlink = EntryType::Symlink {
///     target: PathBuf::from("../target"),
/// };
/// assert_eq!(symlink.name(), "symlink");
/// assert_eq!(EntryType::File.name(), "file");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file entry.
    File,

    /// Directory entry.
    Directory,

    /// Symbolic link; `target` is relative to the link's directory.
    Symlink {
        /// The symlink target path (not yet validated).
        target: PathBuf,
    },

    /// Hard link; `target` is relative to the archive root.
    Hardlink {
        /// The hardlink target path (not yet validated).
        target: PathBuf,
    },

    /// Device node, FIFO or another kind that is never extracted.
    Special {
        /// Human-readable kind, used in skip warnings.
        kind: &'static str,
    },
}

impl EntryType {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink { .. } => "symlink",
            Self::Hardlink { .. } => "hardlink",
            Self::Special { kind } => *kind,
        }
    }
}

/// One entry as read from an archive header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry path as stored (may contain `..` or be absolute).
    pub path: PathBuf,

    /// Entry type and link target.
    pub entry_type: EntryType,

    /// Declared data size in bytes.
    pub size: u64,

    /// Permission bits, if the format records them.
    pub mode: Option<u32>,
}
