//! Path normalization and segment-aware containment checks.
//!
//! Containment is always decided on path components, never on string
//! prefixes: `/tmp/dest` contains `/tmp/dest/x` but not
//! `/tmp/destination-evil/x`.

use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Lexically removes `.` and `..` components.
///
/// `..` never climbs above the root of an absolute path. Leading `..`
/// components of a relative path are kept. The filesystem is not consulted,
/// so symlinks are not resolved.
///
/// # Examples
///
/// ```
/// use buildprobe_core::security::normalize_lexical;
/// use std::path::Path;
///
/// assert_eq!(normalize_lexical(Path::new("/a/./b/../c")), Path::new("/a/c"));
/// assert_eq!(normalize_lexical(Path::new("/a/../../b")), Path::new("/b"));
/// assert_eq!(normalize_lexical(Path::new("../a/..")), Path::new(".."));
/// ```
#[must_use]
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::with_capacity(path.components().count());

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    parts.iter().collect()
}

/// Makes `path` absolute against the current directory and normalizes it.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    Ok(normalize_lexical(&std::path::absolute(path)?))
}

/// Resolves `path` against the filesystem as far as it exists.
///
/// The longest existing ancestor of `path` is canonicalized (resolving every
/// symlink on the way, including ones followed by `..`) and the remaining
/// components are appended and normalized lexically. The result is what the
/// operating system would reach if the missing components were created as
/// plain directories.
///
/// # Errors
///
/// Returns an error if canonicalization fails for a reason other than a
/// missing component.
pub fn resolve_on_disk(path: &Path) -> io::Result<PathBuf> {
    let path = std::path::absolute(path)?;

    for ancestor in path.ancestors() {
        match ancestor.canonicalize() {
            Ok(canonical) => {
                let rest = path.strip_prefix(ancestor).unwrap_or_else(|_| Path::new(""));
                return Ok(normalize_lexical(&canonical.join(rest)));
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(normalize_lexical(&path))
}

/// Returns `true` if `target` equals `directory` or lies beneath it.
///
/// Both sides are made absolute against the current directory and
/// normalized the same way before their components are compared. Neither
/// side is resolved through symlinks; use [`resolve_on_disk`] first when
/// the filesystem should be consulted.
///
/// # Examples
///
/// ```
/// use buildprobe_core::is_within_directory;
/// use std::path::Path;
///
/// assert!(is_within_directory(Path::new("/tmp/dest"), Path::new("/tmp/dest/a/b")));
/// assert!(is_within_directory(Path::new("/tmp/dest"), Path::new("/tmp/dest")));
/// assert!(!is_within_directory(
///     Path::new("/tmp/dest"),
///     Path::new("/tmp/destination-evil/x")
/// ));
/// assert!(!is_within_directory(Path::new("/tmp/dest"), Path::new("/tmp/dest/../x")));
/// ```
#[must_use]
pub fn is_within_directory(directory: &Path, target: &Path) -> bool {
    match (absolute(directory), absolute(target)) {
        (Ok(directory), Ok(target)) => target.starts_with(directory),
        _ => false,
    }
}
