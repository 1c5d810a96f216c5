//! Fetch command implementation.

use crate::cli::FetchArgs;
use crate::error::convert_project_error;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use buildprobe_core::HttpFetcher;
use buildprobe_core::Project;
use buildprobe_core::SourceCache;

pub fn execute(args: &FetchArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let project = Project::lookup(&args.project).map_err(convert_project_error)?;
    let cache = args
        .cache_dir
        .as_ref()
        .map_or_else(SourceCache::from_env, SourceCache::new);
    let fetcher = HttpFetcher::new().context("failed to initialize HTTP client")?;

    let path = project
        .fetch(&cache, &fetcher)
        .map_err(convert_project_error)?;

    formatter.format_fetch_result(&project, &path)
}
