//! The project x isolation x invocation scenario matrix.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use std::time::Instant;

use tracing::info;
use tracing::warn;

use crate::ArtifactSet;
use crate::BuildFrontend;
use crate::BuildOptions;
use crate::Call;
use crate::Fetcher;
use crate::Invocation;
use crate::Project;
use crate::ScenarioError;
use crate::SourceCache;

/// Directory, inside a scenario's work directory, that receives packages.
pub const OUTPUT_DIR: &str = "pkgs";

/// Facts about the interpreter that expected-failure rules depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Platform {
    /// Running on Windows.
    pub windows: bool,
    /// The interpreter is PyPy.
    pub pypy: bool,
}

impl Platform {
    /// The host platform, assuming a CPython interpreter.
    #[must_use]
    pub const fn host() -> Self {
        Self {
            windows: cfg!(windows),
            pypy: false,
        }
    }

    /// The host platform, asking `interpreter` which implementation it is.
    ///
    /// An interpreter that cannot be run is treated as CPython.
    #[must_use]
    pub fn probe(interpreter: &Path) -> Self {
        let implementation = Command::new(interpreter)
            .args([
                "-c",
                "import platform; print(platform.python_implementation())",
            ])
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string());

        Self {
            pypy: implementation.as_deref() == Some("PyPy"),
            ..Self::host()
        }
    }
}

/// Which scenarios to run, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixConfig {
    /// Projects to build.
    pub projects: Vec<Project>,
    /// Isolation settings to try.
    pub options: Vec<BuildOptions>,
    /// Invocation paths to try.
    pub calls: Vec<Call>,
    /// Interpreter used for module calls and for locating the entrypoint.
    pub interpreter: PathBuf,
    /// Parent of the per-scenario work directories.
    pub workdir: PathBuf,
    /// Platform facts for expected-failure rules.
    pub platform: Platform,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            projects: Project::reference(),
            options: vec![
                BuildOptions { isolation: true },
                BuildOptions { isolation: false },
            ],
            calls: Call::ALL.to_vec(),
            interpreter: PathBuf::from(if cfg!(windows) { "python" } else { "python3" }),
            workdir: std::env::temp_dir().join("buildprobe"),
            platform: Platform::host(),
        }
    }
}

impl MatrixConfig {
    /// Expands the cross product, project-major.
    #[must_use]
    pub fn scenarios(&self) -> Vec<Scenario> {
        let mut scenarios =
            Vec::with_capacity(self.projects.len() * self.options.len() * self.calls.len());
        for project in &self.projects {
            for options in &self.options {
                for call in &self.calls {
                    scenarios.push(Scenario {
                        project: project.clone(),
                        options: *options,
                        call: *call,
                    });
                }
            }
        }
        scenarios
    }
}

/// One cell of the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Project to build.
    pub project: Project,
    /// Frontend options.
    pub options: BuildOptions,
    /// How the frontend is reached.
    pub call: Call,
}

impl Scenario {
    /// Stable id, `{project}-{isolation}-{call}`.
    ///
    /// # Examples
    ///
    /// ```
    /// use buildprobe_core::BuildOptions;
    /// use buildprobe_core::Project;
    /// use buildprobe_core::Scenario;
    /// use buildprobe_core::Call;
    ///
    /// let scenario = Scenario {
    ///     project: Project::lookup("flit").unwrap(),
    ///     options: BuildOptions { isolation: false },
    ///     call: Call::Entrypoint,
    /// };
    /// assert_eq!(scenario.id(), "flit-no_isolation-entrypoint");
    /// ```
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}-{}-{}", self.project.name, self.options.id(), self.call)
    }

    /// Returns why this scenario is expected to fail on `platform`, if it is.
    #[must_use]
    pub fn expected_failure(&self, platform: Platform) -> Option<&'static str> {
        match self.project.name.as_str() {
            "flit" if !self.options.isolation => {
                Some("can't build flit without isolation due to missing dependencies")
            }
            "Solaar" if platform.windows && platform.pypy => {
                Some("Solaar fails building wheels via sdists on Windows on PyPy 3")
            }
            _ => None,
        }
    }
}

/// How a scenario ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An sdist and a wheel were produced.
    Passed,
    /// The scenario failed unexpectedly.
    Failed(String),
    /// The scenario failed, as its rule predicted.
    ExpectedFailure(String),
    /// The scenario passed although a rule predicted failure.
    UnexpectedPass(String),
    /// The scenario could not run.
    Skipped(String),
}

impl Outcome {
    /// Short label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed(_) => "failed",
            Self::ExpectedFailure(_) => "xfail",
            Self::UnexpectedPass(_) => "xpass",
            Self::Skipped(_) => "skipped",
        }
    }

    /// Explanation, when there is one.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Passed => None,
            Self::Failed(reason)
            | Self::ExpectedFailure(reason)
            | Self::UnexpectedPass(reason)
            | Self::Skipped(reason) => Some(reason),
        }
    }

    /// Returns `true` for outcomes that should fail a run.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::UnexpectedPass(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}: {reason}", self.label()),
            None => f.write_str(self.label()),
        }
    }
}

/// Result of one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioResult {
    /// Scenario id.
    pub id: String,
    /// How it ended.
    pub outcome: Outcome,
    /// Artifacts found in the output directory, on success.
    pub artifacts: Vec<String>,
    /// Wall time spent.
    pub duration: Duration,
}

/// Runs scenarios against a cache, a fetcher and, for in-process calls, a
/// frontend.
pub struct Runner<'a> {
    config: &'a MatrixConfig,
    cache: &'a SourceCache,
    fetcher: &'a dyn Fetcher,
    frontend: Option<&'a dyn BuildFrontend>,
}

impl<'a> Runner<'a> {
    /// Creates a runner without an in-process frontend.
    #[must_use]
    pub fn new(config: &'a MatrixConfig, cache: &'a SourceCache, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            config,
            cache,
            fetcher,
            frontend: None,
        }
    }

    /// Sets the frontend used for [`Call::Code`] scenarios.
    #[must_use]
    pub fn with_frontend(mut self, frontend: &'a dyn BuildFrontend) -> Self {
        self.frontend = Some(frontend);
        self
    }

    /// Runs every scenario in order, reporting each result to `on_result`
    /// as it completes.
    pub fn run(&self, mut on_result: impl FnMut(&ScenarioResult)) -> Vec<ScenarioResult> {
        self.config
            .scenarios()
            .iter()
            .map(|scenario| {
                let result = self.run_scenario(scenario);
                on_result(&result);
                result
            })
            .collect()
    }

    /// Runs one scenario in `<workdir>/<id>`.
    #[must_use]
    pub fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        let id = scenario.id();
        let expected = scenario.expected_failure(self.config.platform);

        let invocation = Invocation::resolve(scenario.call, &self.config.interpreter);
        let (outcome, artifacts) = match invocation {
            None => (
                Outcome::Skipped(format!(
                    "the {} entrypoint is not installed next to {}",
                    crate::frontend::ENTRYPOINT,
                    self.config.interpreter.display()
                )),
                Vec::new(),
            ),
            Some(invocation) => match (self.build(scenario, &invocation, &id), expected) {
                (Ok(set), None) => (Outcome::Passed, set.names().to_vec()),
                (Ok(set), Some(reason)) => {
                    (Outcome::UnexpectedPass(reason.to_string()), set.names().to_vec())
                }
                (Err(e), None) => (Outcome::Failed(e.to_string()), Vec::new()),
                (Err(e), Some(reason)) => {
                    info!(scenario = %id, error = %e, "expected failure");
                    (Outcome::ExpectedFailure(reason.to_string()), Vec::new())
                }
            },
        };

        if outcome.is_failure() {
            warn!(scenario = %id, outcome = %outcome, "scenario failed");
        } else {
            info!(scenario = %id, outcome = outcome.label(), "scenario finished");
        }

        ScenarioResult {
            id,
            outcome,
            artifacts,
            duration: start.elapsed(),
        }
    }

    fn build(
        &self,
        scenario: &Scenario,
        invocation: &Invocation,
        id: &str,
    ) -> Result<ArtifactSet, ScenarioError> {
        let workdir = self.config.workdir.join(id);
        if workdir.exists() {
            std::fs::remove_dir_all(&workdir).map_err(crate::BuildError::Io)?;
        }
        std::fs::create_dir_all(&workdir).map_err(crate::BuildError::Io)?;

        let source = scenario.project.prepare(self.cache, self.fetcher, &workdir)?;
        let output = workdir.join(OUTPUT_DIR);
        invocation.run(self.frontend, &source, &output, &scenario.options, &workdir)?;

        let artifacts = ArtifactSet::scan(&output)?;
        artifacts.verify()?;
        Ok(artifacts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::BuildError;
    use crate::FetchError;
    use crate::test_utils::TarTestBuilder;
    use crate::test_utils::gzip;
    use std::cell::Cell;
    use std::io::Write;
    use tempfile::TempDir;

    /// Serves `<name>-<version>/setup.py` for whichever reference project is
    /// requested.
    struct TarballFetcher;

    impl Fetcher for TarballFetcher {
        fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
            let project = Project::reference()
                .into_iter()
                .find(|p| p.url().as_deref() == Some(url))
                .expect("known project url");
            let root = project.root_dir_name().unwrap();
            let body = gzip(
                &TarTestBuilder::new()
                    .add_directory(&format!("{root}/"))
                    .add_file(&format!("{root}/setup.py"), b"")
                    .build(),
            );
            sink.write_all(&body)?;
            Ok(body.len() as u64)
        }
    }

    /// Writes the listed artifacts, or fails when `fail` is set.
    struct FakeFrontend {
        produce: &'static [&'static str],
        fail: bool,
        calls: Cell<usize>,
    }

    impl FakeFrontend {
        const fn new(produce: &'static [&'static str]) -> Self {
            Self {
                produce,
                fail: false,
                calls: Cell::new(0),
            }
        }
    }

    impl BuildFrontend for FakeFrontend {
        fn build(&self, source: &Path, output: &Path, _: &BuildOptions) -> Result<(), BuildError> {
            self.calls.set(self.calls.get() + 1);
            assert!(source.join("setup.py").is_file(), "sources should be prepared");
            if self.fail {
                return Err(BuildError::Frontend("backend unavailable".into()));
            }
            std::fs::create_dir_all(output)?;
            for name in self.produce {
                std::fs::write(output.join(name), b"")?;
            }
            Ok(())
        }
    }

    const BOTH: &[&str] = &["pkg-1.0.tar.gz", "pkg-1.0-py3-none-any.whl"];

    fn config(temp: &TempDir, projects: Vec<Project>, options: BuildOptions) -> MatrixConfig {
        MatrixConfig {
            projects,
            options: vec![options],
            calls: vec![Call::Code],
            interpreter: temp.path().join("bin/python"),
            workdir: temp.path().join("work"),
            platform: Platform::host(),
        }
    }

    #[test]
    fn test_default_matrix_ids() {
        let ids: Vec<_> = MatrixConfig::default()
            .scenarios()
            .iter()
            .map(Scenario::id)
            .collect();
        assert_eq!(ids.len(), 24);
        assert_eq!(ids[0], "dateutil-isolated-code");
        assert_eq!(ids[5], "dateutil-no_isolation-entrypoint");
        assert!(ids.contains(&"Solaar-isolated-module".to_string()));
    }

    #[test]
    fn test_expected_failure_rules() {
        let scenario = |name: &str, isolation| Scenario {
            project: Project::lookup(name).unwrap(),
            options: BuildOptions { isolation },
            call: Call::Module,
        };
        let windows_pypy = Platform {
            windows: true,
            pypy: true,
        };

        assert!(scenario("flit", false).expected_failure(Platform::default()).is_some());
        assert!(scenario("flit", true).expected_failure(Platform::default()).is_none());
        assert!(scenario("Solaar", true).expected_failure(windows_pypy).is_some());
        assert!(scenario("Solaar", true)
            .expected_failure(Platform { pypy: false, ..windows_pypy })
            .is_none());
        assert!(scenario("pip", false).expected_failure(windows_pypy).is_none());
    }

    #[test]
    fn test_passing_scenario() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp, vec![Project::lookup("pip").unwrap()], BuildOptions::default());
        let cache = SourceCache::new(temp.path().join("cache"));
        let frontend = FakeFrontend::new(BOTH);

        let results = Runner::new(&config, &cache, &TarballFetcher)
            .with_frontend(&frontend)
            .run(|_| {});

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "pip-isolated-code");
        assert_eq!(results[0].outcome, Outcome::Passed);
        assert_eq!(results[0].artifacts.len(), 2);
        assert!(temp.path().join("work/pip-isolated-code/pkgs/pkg-1.0.tar.gz").is_file());
    }

    #[test]
    fn test_missing_wheel_fails() {
        let temp = TempDir::new().unwrap();
        let config = config(
            &temp,
            vec![Project::lookup("dateutil").unwrap()],
            BuildOptions::default(),
        );
        let cache = SourceCache::new(temp.path().join("cache"));
        let frontend = FakeFrontend::new(&["pkg-1.0.tar.gz"]);

        let result = Runner::new(&config, &cache, &TarballFetcher)
            .with_frontend(&frontend)
            .run_scenario(&config.scenarios()[0]);

        assert!(result.outcome.is_failure());
        assert!(result.outcome.reason().unwrap().contains("no wheel found"));
    }

    #[test]
    fn test_flit_without_isolation() {
        let temp = TempDir::new().unwrap();
        let config = config(
            &temp,
            vec![Project::lookup("flit").unwrap()],
            BuildOptions { isolation: false },
        );
        let cache = SourceCache::new(temp.path().join("cache"));

        let failing = FakeFrontend {
            fail: true,
            ..FakeFrontend::new(BOTH)
        };
        let result = Runner::new(&config, &cache, &TarballFetcher)
            .with_frontend(&failing)
            .run_scenario(&config.scenarios()[0]);
        assert_eq!(result.outcome.label(), "xfail");
        assert!(!result.outcome.is_failure());

        let passing = FakeFrontend::new(BOTH);
        let result = Runner::new(&config, &cache, &TarballFetcher)
            .with_frontend(&passing)
            .run_scenario(&config.scenarios()[0]);
        assert_eq!(result.outcome.label(), "xpass");
        assert!(result.outcome.is_failure());
    }

    #[test]
    fn test_missing_entrypoint_skips() {
        let temp = TempDir::new().unwrap();
        let mut config = config(
            &temp,
            vec![Project::lookup("pip").unwrap()],
            BuildOptions::default(),
        );
        config.calls = vec![Call::Entrypoint];
        let cache = SourceCache::new(temp.path().join("cache"));
        let frontend = FakeFrontend::new(BOTH);

        let mut seen = Vec::new();
        let results = Runner::new(&config, &cache, &TarballFetcher)
            .with_frontend(&frontend)
            .run(|result| seen.push(result.id.clone()));

        assert_eq!(seen, ["pip-isolated-entrypoint"]);
        assert_eq!(results[0].outcome.label(), "skipped");
        assert_eq!(frontend.calls.get(), 0);
        assert!(!temp.path().join("cache").exists());
    }

    #[test]
    fn test_local_project_reruns_in_fresh_dir() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("checkout");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("setup.py"), b"").unwrap();

        let config = config(&temp, vec![Project::local("build", &src)], BuildOptions::default());
        let cache = SourceCache::new(temp.path().join("cache"));
        let frontend = FakeFrontend::new(BOTH);
        let runner = Runner::new(&config, &cache, &TarballFetcher).with_frontend(&frontend);

        let stale = temp.path().join("work/build-isolated-code/pkgs/stale.whl");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"").unwrap();

        let result = runner.run_scenario(&config.scenarios()[0]);
        assert_eq!(result.outcome, Outcome::Passed);
        assert!(!stale.exists());
    }

    #[test]
    fn test_probe_unrunnable_interpreter() {
        let temp = TempDir::new().unwrap();
        let platform = Platform::probe(&temp.path().join("no-such-python"));
        assert!(!platform.pypy);
        assert_eq!(platform.windows, cfg!(windows));
    }
}
