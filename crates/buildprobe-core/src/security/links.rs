//! Resolution of entry paths through the symlinks an archive will create.
//!
//! Lexical normalization alone is not enough once an archive carries its own
//! symlinks: `t -> .` followed by `s -> t/..` looks contained lexically but
//! points at the parent of the destination once both links exist. The
//! [`LinkTree`] replays the archive's links virtually, rooted at the
//! destination, and treats any `..` that would leave that root as an escape.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Maximum number of links followed while resolving one path (`SYMLOOP_MAX`
/// on Linux).
pub const MAX_LINK_HOPS: usize = 40;

/// Outcome of resolving a path through a [`LinkTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The path stays inside the root; the value is relative to it.
    Inside(PathBuf),
    /// The path leaves the root.
    Escapes,
    /// More than [`MAX_LINK_HOPS`] links were followed.
    TooManyLinks,
}

/// Symlinks planned for extraction, keyed by their normalized relative path.
#[derive(Debug, Default, Clone)]
pub struct LinkTree {
    links: HashMap<PathBuf, PathBuf>,
}

impl LinkTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a symlink at `link` (relative to the root) pointing at the raw
    /// `target`.
    pub fn insert(&mut self, link: &Path, target: &Path) {
        self.links.insert(link.to_path_buf(), target.to_path_buf());
    }

    /// Number of recorded links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` when no links are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Resolves `path`, interpreted from the root, through recorded links.
    ///
    /// Every intermediate component is followed. The final component is
    /// followed only when `follow_last` is set, which is what the kernel
    /// does for a symlink target but not for the path an entry is written
    /// to.
    ///
    /// # Examples
    ///
    /// ```
    /// use buildprobe_core::security::LinkTree;
    /// use buildprobe_core::security::Resolution;
    /// use std::path::Path;
    /// use std::path::PathBuf;
    ///
    /// let mut tree = LinkTree::new();
    /// tree.insert(Path::new("t"), Path::new("."));
    ///
    /// assert_eq!(
    ///     tree.resolve(Path::new("t/a.txt"), false),
    ///     Resolution::Inside(PathBuf::from("a.txt"))
    /// );
    /// assert_eq!(tree.resolve(Path::new("t/.."), true), Resolution::Escapes);
    /// ```
    #[must_use]
    pub fn resolve(&self, path: &Path, follow_last: bool) -> Resolution {
        let mut current: Vec<OsString> = Vec::new();
        let mut hops = 0;

        match self.walk(&mut current, path, follow_last, &mut hops) {
            Ok(()) => Resolution::Inside(current.iter().collect()),
            Err(stop) => stop,
        }
    }

    fn walk(
        &self,
        current: &mut Vec<OsString>,
        path: &Path,
        follow_last: bool,
        hops: &mut usize,
    ) -> Result<(), Resolution> {
        let components: Vec<Component<'_>> = path.components().collect();
        let count = components.len();

        for (index, component) in components.into_iter().enumerate() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if current.pop().is_none() {
                        return Err(Resolution::Escapes);
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(Resolution::Escapes),
                Component::Normal(name) => {
                    current.push(name.to_os_string());

                    if index + 1 == count && !follow_last {
                        continue;
                    }

                    let key: PathBuf = current.iter().collect();
                    if let Some(target) = self.links.get(&key) {
                        *hops += 1;
                        if *hops > MAX_LINK_HOPS {
                            return Err(Resolution::TooManyLinks);
                        }
                        current.pop();
                        self.walk(current, target, true, hops)?;
                    }
                }
            }
        }

        Ok(())
    }
}
