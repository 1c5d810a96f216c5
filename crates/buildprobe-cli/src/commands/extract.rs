//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use buildprobe_core::ExtractionConfig;
use buildprobe_core::extract_archive;
use std::env;

pub fn execute(args: &ExtractArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };

    let mut config = if args.strict {
        ExtractionConfig::strict()
    } else {
        ExtractionConfig::default()
    };
    config.preserve_permissions = !args.no_preserve_permissions;

    let report = add_archive_context(
        extract_archive(&args.archive, &output_dir, &config),
        &args.archive,
    )?;

    formatter.format_extraction_result(&report)
}
