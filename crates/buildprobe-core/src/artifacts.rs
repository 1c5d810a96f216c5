//! Checking what a build left in its output directory.

use std::path::Path;
use std::path::PathBuf;

use crate::BuildError;

const SDIST_SUFFIX: &str = ".tar.gz";
const WHEEL_SUFFIX: &str = ".whl";

/// File names found in a build output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    dir: PathBuf,
    names: Vec<String>,
}

impl ArtifactSet {
    /// Lists the entries of `dir`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Io` if the directory cannot be read.
    pub fn scan(dir: &Path) -> Result<Self, BuildError> {
        let mut names = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<Result<Vec<_>, _>>()?;
        names.sort();
        Ok(Self {
            dir: dir.to_path_buf(),
            names,
        })
    }

    /// All names found.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Source distributions (`*.tar.gz`).
    pub fn sdists(&self) -> impl Iterator<Item = &str> {
        self.with_suffix(SDIST_SUFFIX)
    }

    /// Wheels (`*.whl`).
    pub fn wheels(&self) -> impl Iterator<Item = &str> {
        self.with_suffix(WHEEL_SUFFIX)
    }

    /// Checks that at least one sdist and one wheel were produced.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::MissingArtifact` naming the first missing kind.
    pub fn verify(&self) -> Result<(), BuildError> {
        if self.sdists().next().is_none() {
            return Err(self.missing("sdist"));
        }
        if self.wheels().next().is_none() {
            return Err(self.missing("wheel"));
        }
        Ok(())
    }

    fn with_suffix<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(move |name| name.len() > suffix.len() && name.ends_with(suffix))
    }

    fn missing(&self, kind: &'static str) -> BuildError {
        BuildError::MissingArtifact {
            kind,
            dir: self.dir.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn test_classifies_outputs() {
        let temp = TempDir::new().unwrap();
        touch(
            temp.path(),
            &[
                "pip-20.2.1-py2.py3-none-any.whl",
                "pip-20.2.1.tar.gz",
                "build.log",
            ],
        );

        let set = ArtifactSet::scan(temp.path()).unwrap();
        assert_eq!(set.names().len(), 3);
        assert_eq!(set.sdists().collect::<Vec<_>>(), ["pip-20.2.1.tar.gz"]);
        assert_eq!(
            set.wheels().collect::<Vec<_>>(),
            ["pip-20.2.1-py2.py3-none-any.whl"]
        );
        set.verify().unwrap();
    }

    #[test]
    fn test_missing_wheel() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &["flit-2.3.0.tar.gz"]);

        let err = ArtifactSet::scan(temp.path()).unwrap().verify().unwrap_err();
        assert!(matches!(err, BuildError::MissingArtifact { kind: "wheel", .. }));
    }

    #[test]
    fn test_empty_dir_missing_sdist() {
        let temp = TempDir::new().unwrap();
        let err = ArtifactSet::scan(temp.path()).unwrap().verify().unwrap_err();
        assert_eq!(err.to_string(), format!("no sdist found in {}", temp.path().display()));
    }

    #[test]
    fn test_scan_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            ArtifactSet::scan(&temp.path().join("pkgs")),
            Err(BuildError::Io(_))
        ));
    }
}
