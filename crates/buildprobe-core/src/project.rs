//! Reference projects the frontend is exercised against.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::info;
use walkdir::DirEntry;
use walkdir::WalkDir;

use crate::ArchiveSource;
use crate::ExtractionConfig;
use crate::Fetcher;
use crate::ProjectError;
use crate::SourceCache;
use crate::extract;

/// Projects built by default: `(name, GitHub repository, version)`.
pub const REFERENCE_PROJECTS: [(&str, &str, &str); 4] = [
    ("dateutil", "dateutil/dateutil", "2.8.1"),
    ("pip", "pypa/pip", "20.2.1"),
    ("Solaar", "pwr-Solaar/Solaar", "1.0.3"),
    ("flit", "takluyver/flit", "2.3.0"),
];

const GITHUB: &str = "https://github.com";

/// Directory and file names never copied from a local project.
const IGNORED_NAMES: [&str; 8] = [
    ".tox",
    "dist",
    ".git",
    "__pycache__",
    ".integration-sources",
    ".github",
    "tests",
    "docs",
];

/// Where a project's sources come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSource {
    /// A tagged GitHub source tarball.
    GitHub {
        /// `org/repo`.
        repo: String,
        /// Tag name.
        version: String,
    },
    /// A source tree on the local filesystem.
    Local {
        /// Tree root.
        path: PathBuf,
    },
}

/// A named project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Short name, used for directories and scenario ids.
    pub name: String,
    /// Where to get the sources.
    pub source: ProjectSource,
}

impl Project {
    /// A project published as a GitHub tag.
    pub fn github(
        name: impl Into<String>,
        repo: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: ProjectSource::GitHub {
                repo: repo.into(),
                version: version.into(),
            },
        }
    }

    /// A project copied from a local tree.
    pub fn local(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: ProjectSource::Local { path: path.into() },
        }
    }

    /// All built-in reference projects.
    #[must_use]
    pub fn reference() -> Vec<Self> {
        REFERENCE_PROJECTS
            .iter()
            .map(|(name, repo, version)| Self::github(*name, *repo, *version))
            .collect()
    }

    /// Looks up a built-in project by name.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Unknown` if no project has that name.
    pub fn lookup(name: &str) -> Result<Self, ProjectError> {
        Self::reference()
            .into_iter()
            .find(|project| project.name == name)
            .ok_or_else(|| ProjectError::Unknown(name.to_string()))
    }

    /// Returns the version, for GitHub projects.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        match &self.source {
            ProjectSource::GitHub { version, .. } => Some(version),
            ProjectSource::Local { .. } => None,
        }
    }

    /// Tarball download URL, for GitHub projects.
    ///
    /// # Examples
    ///
    /// ```
    /// use buildprobe_core::Project;
    ///
    /// let pip = Project::lookup("pip").unwrap();
    /// assert_eq!(
    ///     pip.url().as_deref(),
    ///     Some("https://github.com/pypa/pip/archive/20.2.1.tar.gz")
    /// );
    /// assert_eq!(pip.archive_name().as_deref(), Some("pip-20.2.1.tar.gz"));
    /// ```
    #[must_use]
    pub fn url(&self) -> Option<String> {
        match &self.source {
            ProjectSource::GitHub { repo, version } => {
                Some(format!("{GITHUB}/{repo}/archive/{version}.tar.gz"))
            }
            ProjectSource::Local { .. } => None,
        }
    }

    /// Cache key and file name of the tarball.
    #[must_use]
    pub fn archive_name(&self) -> Option<String> {
        self.version()
            .map(|version| format!("{}-{version}.tar.gz", self.name))
    }

    /// Top-level directory inside the tarball.
    #[must_use]
    pub fn root_dir_name(&self) -> Option<String> {
        self.version()
            .map(|version| format!("{}-{version}", self.name))
    }

    /// Downloads (through `cache`) the project's tarball without extracting it.
    ///
    /// Local projects have nothing to download and return their tree root.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Cache` if the download or cache write fails.
    pub fn fetch(
        &self,
        cache: &SourceCache,
        fetcher: &dyn Fetcher,
    ) -> Result<PathBuf, ProjectError> {
        match &self.source {
            ProjectSource::GitHub { repo, version } => {
                let key = format!("{}-{version}.tar.gz", self.name);
                let url = format!("{GITHUB}/{repo}/archive/{version}.tar.gz");
                Ok(cache.fetch_url(&key, &url, fetcher)?)
            }
            ProjectSource::Local { path } => Ok(path.clone()),
        }
    }

    /// Makes the project's sources available under `workdir/<name>` and
    /// returns the source tree root.
    ///
    /// GitHub projects are fetched through `cache` and unpacked with the safe
    /// extractor; local projects are copied without build outputs and VCS
    /// metadata.
    ///
    /// # Errors
    ///
    /// - `ProjectError::Cache` if the tarball cannot be fetched
    /// - `ProjectError::Extract` if the tarball is rejected or unreadable
    /// - `ProjectError::MissingRoot` if the tarball lacks `<name>-<version>/`
    /// - `ProjectError::Copy` if a local tree cannot be copied
    pub fn prepare(
        &self,
        cache: &SourceCache,
        fetcher: &dyn Fetcher,
        workdir: &Path,
    ) -> Result<PathBuf, ProjectError> {
        let dest = workdir.join(&self.name);

        if let ProjectSource::Local { path } = &self.source {
            copy_project_tree(path, &dest)?;
            return Ok(dest);
        }

        let archive = self.fetch(cache, fetcher)?;
        let url = self.url().unwrap_or_default();
        info!(project = %self.name, archive = %archive.display(), "unpacking");

        extract(
            &ArchiveSource::from_path(&archive),
            &dest,
            &ExtractionConfig::default(),
        )
        .map_err(|source| ProjectError::Extract {
            archive: archive.clone(),
            url,
            source,
        })?;

        let expected = self.root_dir_name().unwrap_or_default();
        let root = dest.join(&expected);
        if !root.is_dir() {
            return Err(ProjectError::MissingRoot { archive, expected });
        }
        Ok(root)
    }
}

/// Returns `true` for entries a local project copy leaves out.
///
/// `depth` is the entry's depth below the tree root (1 for direct
/// children); only a top-level `build` directory is ignored.
#[must_use]
pub fn is_ignored(name: &str, depth: usize) -> bool {
    IGNORED_NAMES.contains(&name)
        || name.ends_with("_cache")
        || name.ends_with(".egg-info")
        || name.ends_with(".pyc")
        || (depth == 1 && name == "build")
}

/// Copies `source` to `dest`, skipping ignored entries.
///
/// # Errors
///
/// Returns `ProjectError::Copy` naming the path that failed.
pub fn copy_project_tree(source: &Path, dest: &Path) -> Result<(), ProjectError> {
    let copy_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| ProjectError::Copy { path, source }
    };

    let walker = WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !skip(entry));

    let mut copied = 0usize;
    for entry in walker {
        let entry = entry.map_err(|e| ProjectError::Copy {
            path: e.path().unwrap_or(source).to_path_buf(),
            source: e.into(),
        })?;

        let relative = entry.path().strip_prefix(source).unwrap_or(Path::new(""));
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(copy_err(&target))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target).map_err(copy_err(entry.path()))?;
            copied += 1;
        } else {
            fs::copy(entry.path(), &target).map_err(copy_err(entry.path()))?;
            copied += 1;
        }
    }

    debug!(
        source = %source.display(),
        dest = %dest.display(),
        files = copied,
        "copied project tree"
    );
    Ok(())
}

fn skip(entry: &DirEntry) -> bool {
    entry.depth() > 0 && is_ignored(&entry.file_name().to_string_lossy(), entry.depth())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    fs::copy(link, target).map(|_| ())
}
