//! Invoking the build frontend under test.
//!
//! The frontend is opaque: it takes a source tree and an output directory
//! and is expected to leave an sdist and a wheel behind. It can be reached
//! three ways, mirroring how users run it: called in-process, run as a
//! module of an interpreter, or run through its installed entrypoint.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

use tracing::debug;
use tracing::info;

use crate::BuildError;

/// Module name passed to `<interpreter> -m`.
pub const MODULE: &str = "build";

/// Name of the installed console script.
pub const ENTRYPOINT: &str = "pyproject-build";

/// Environment variable pinning the version of `setuptools_scm` projects,
/// which cannot compute one from a tarball without VCS metadata.
pub const PRETEND_VERSION_ENV: &str = "SETUPTOOLS_SCM_PRETEND_VERSION";

/// Value set for [`PRETEND_VERSION_ENV`].
pub const PRETEND_VERSION: &str = "0+dummy";

/// Options forwarded to the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build in an isolated environment (the frontend's default).
    pub isolation: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { isolation: true }
    }
}

impl BuildOptions {
    /// Scenario id fragment for these options.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        if self.isolation {
            "isolated"
        } else {
            "no_isolation"
        }
    }

    /// Builds the frontend's argument vector.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use buildprobe_core::BuildOptions;
    ///
    /// let args = BuildOptions { isolation: false }.args(Path::new("src"), Path::new("pkgs"));
    /// assert_eq!(args, ["src", "-o", "pkgs", "-x", "--no-isolation"]);
    /// ```
    #[must_use]
    pub fn args(&self, source: &Path, output: &Path) -> Vec<OsString> {
        let mut args = vec![
            source.as_os_str().to_owned(),
            OsString::from("-o"),
            output.as_os_str().to_owned(),
        ];
        if !self.isolation {
            args.push(OsString::from("-x"));
            args.push(OsString::from("--no-isolation"));
        }
        args
    }
}

/// A frontend callable from this process.
///
/// Implementations build `source` into `output` and report failure as
/// `BuildError::Frontend`.
pub trait BuildFrontend {
    /// Builds an sdist and a wheel of `source` into `output`.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` if the build fails.
    fn build(&self, source: &Path, output: &Path, options: &BuildOptions)
    -> Result<(), BuildError>;
}

/// The ways of reaching the frontend a scenario can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Call {
    /// In-process call.
    Code,
    /// `<interpreter> -m build`.
    Module,
    /// `pyproject-build`.
    Entrypoint,
}

impl Call {
    /// All calls, in matrix order.
    pub const ALL: [Self; 3] = [Self::Code, Self::Module, Self::Entrypoint];

    /// Scenario id fragment.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Module => "module",
            Self::Entrypoint => "entrypoint",
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A resolved way of running the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Call a [`BuildFrontend`] directly.
    InProcess,
    /// Run `<interpreter> -m build <args>`.
    Module {
        /// Interpreter executable.
        interpreter: PathBuf,
    },
    /// Run the installed entrypoint.
    Entrypoint {
        /// Path to `pyproject-build`.
        program: PathBuf,
    },
}

impl Invocation {
    /// Resolves `call` against `interpreter`.
    ///
    /// Returns `None` for [`Call::Entrypoint`] when no `pyproject-build` is
    /// installed next to the interpreter.
    #[must_use]
    pub fn resolve(call: Call, interpreter: &Path) -> Option<Self> {
        match call {
            Call::Code => Some(Self::InProcess),
            Call::Module => Some(Self::Module {
                interpreter: interpreter.to_path_buf(),
            }),
            Call::Entrypoint => {
                entrypoint_for(interpreter).map(|program| Self::Entrypoint { program })
            }
        }
    }

    /// Program name used in logs and errors.
    #[must_use]
    pub fn program(&self) -> String {
        match self {
            Self::InProcess => MODULE.to_string(),
            Self::Module { interpreter } => {
                format!("{} -m {MODULE}", interpreter.display())
            }
            Self::Entrypoint { program } => program.display().to_string(),
        }
    }

    /// Builds `source` into `output`, running subprocesses inside `workdir`.
    ///
    /// `frontend` is only consulted for [`Invocation::InProcess`].
    ///
    /// # Errors
    ///
    /// - `BuildError::Frontend` if an in-process build has no frontend or
    ///   the frontend fails
    /// - `BuildError::Spawn` if the subprocess cannot start
    /// - `BuildError::Failed` if it exits unsuccessfully
    pub fn run(
        &self,
        frontend: Option<&dyn BuildFrontend>,
        source: &Path,
        output: &Path,
        options: &BuildOptions,
        workdir: &Path,
    ) -> Result<(), BuildError> {
        info!(
            program = %self.program(),
            source = %source.display(),
            isolation = options.isolation,
            "building"
        );

        let mut command = match self {
            Self::InProcess => {
                let frontend = frontend.ok_or_else(|| {
                    BuildError::Frontend("no in-process frontend configured".to_string())
                })?;
                return frontend.build(source, output, options);
            }
            Self::Module { interpreter } => {
                let mut command = Command::new(interpreter);
                command.arg("-m").arg(MODULE);
                command
            }
            Self::Entrypoint { program } => Command::new(program),
        };

        command
            .args(options.args(source, output))
            .current_dir(workdir)
            .env(PRETEND_VERSION_ENV, PRETEND_VERSION)
            .stdin(Stdio::null());

        debug!(?command, "spawning frontend");
        let result = command.output().map_err(|source| BuildError::Spawn {
            program: self.program(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&result.stdout);
        if !stdout.trim().is_empty() {
            debug!(stdout = %stdout.trim(), "frontend stdout");
        }

        if !result.status.success() {
            return Err(BuildError::Failed {
                program: self.program(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Returns the `pyproject-build` installed next to `interpreter`, if any.
#[must_use]
pub fn entrypoint_for(interpreter: &Path) -> Option<PathBuf> {
    let name = if cfg!(windows) {
        format!("{ENTRYPOINT}.exe")
    } else {
        ENTRYPOINT.to_string()
    };
    let candidate = interpreter.parent()?.join(name);
    candidate.is_file().then_some(candidate)
}
