//! Containment checks used by the extractor.
//!
//! - [`containment`]: lexical normalization, on-disk resolution and the
//!   segment-aware [`is_within_directory`] predicate
//! - [`links`]: virtual resolution through the archive's own symlinks

pub mod containment;
pub mod links;

pub use containment::absolute;
pub use containment::is_within_directory;
pub use containment::normalize_lexical;
pub use containment::resolve_on_disk;
pub use links::LinkTree;
pub use links::MAX_LINK_HOPS;
pub use links::Resolution;
