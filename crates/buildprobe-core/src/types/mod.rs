//! Validated types for archive extraction.
//!
//! Entry paths and link targets only reach the filesystem wrapped in one of
//! these types, and each can only be built through its `validate`
//! constructor. None of them implements `From<PathBuf>`.

pub mod dest_dir;
pub mod entry_type;
pub mod safe_hardlink;
pub mod safe_path;
pub mod safe_symlink;

pub use dest_dir::DestDir;
pub use entry_type::ArchiveEntry;
pub use entry_type::EntryType;
pub use safe_hardlink::SafeHardlink;
pub use safe_path::SafePath;
pub use safe_symlink::SafeSymlink;
