//! Run command implementation.

use crate::cli::RunArgs;
use crate::error::convert_project_error;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use buildprobe_core::BuildError;
use buildprobe_core::BuildFrontend;
use buildprobe_core::BuildOptions;
use buildprobe_core::HttpFetcher;
use buildprobe_core::Invocation;
use buildprobe_core::MatrixConfig;
use buildprobe_core::Platform;
use buildprobe_core::Project;
use buildprobe_core::Runner;
use buildprobe_core::SourceCache;
use std::path::Path;
use std::path::PathBuf;

/// Name given to a `--local` tree.
const LOCAL_PROJECT: &str = "build";

/// Stands in for an in-process call, which a standalone binary cannot make,
/// by running the module form.
struct ModuleFrontend {
    interpreter: PathBuf,
}

impl BuildFrontend for ModuleFrontend {
    fn build(
        &self,
        source: &Path,
        output: &Path,
        options: &BuildOptions,
    ) -> Result<(), BuildError> {
        let workdir = output.parent().unwrap_or_else(|| Path::new("."));
        Invocation::Module {
            interpreter: self.interpreter.clone(),
        }
        .run(None, source, output, options, workdir)
    }
}

pub fn execute(args: &RunArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let config = matrix_config(args)?;
    let cache = args
        .cache_dir
        .as_ref()
        .map_or_else(SourceCache::from_env, SourceCache::new);
    let fetcher = HttpFetcher::new().context("failed to initialize HTTP client")?;
    let frontend = ModuleFrontend {
        interpreter: config.interpreter.clone(),
    };

    let mut progress = Ok(());
    let results = Runner::new(&config, &cache, &fetcher)
        .with_frontend(&frontend)
        .run(|result| {
            if progress.is_ok() {
                progress = formatter.format_scenario(result);
            }
        });
    progress?;

    formatter.format_run_summary(&results)?;

    let failed = results.iter().filter(|r| r.outcome.is_failure()).count();
    if failed > 0 {
        bail!("{failed} of {} scenarios failed", results.len());
    }
    Ok(())
}

fn matrix_config(args: &RunArgs) -> Result<MatrixConfig> {
    let defaults = MatrixConfig::default();

    let mut projects = args
        .projects
        .iter()
        .map(|name| Project::lookup(name))
        .collect::<Result<Vec<_>, _>>()
        .map_err(convert_project_error)?;
    if let Some(local) = &args.local {
        let local = local
            .canonicalize()
            .with_context(|| format!("local project not found: {}", local.display()))?;
        projects.push(Project::local(LOCAL_PROJECT, local));
    }
    if projects.is_empty() {
        projects = defaults.projects;
    }

    let options = if args.isolation.is_empty() {
        defaults.options
    } else {
        args.isolation.iter().copied().map(BuildOptions::from).collect()
    };
    let calls = if args.call.is_empty() {
        defaults.calls
    } else {
        args.call.iter().copied().map(Into::into).collect()
    };

    let interpreter = args.python.clone().unwrap_or(defaults.interpreter);
    let workdir = match &args.workdir {
        Some(dir) => std::path::absolute(dir)
            .with_context(|| format!("invalid work directory: {}", dir.display()))?,
        None => defaults.workdir,
    };

    Ok(MatrixConfig {
        platform: Platform::probe(&interpreter),
        projects,
        options,
        calls,
        interpreter,
        workdir,
    })
}
