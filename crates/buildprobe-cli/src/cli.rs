//! CLI argument parsing using clap.

use buildprobe_core::BuildOptions;
use buildprobe_core::Call;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "buildprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Safely extract an archive
    Extract(ExtractArgs),
    /// Download a reference project into the source cache
    Fetch(FetchArgs),
    /// List the reference projects
    Projects,
    /// Build reference projects with the frontend under test
    Run(RunArgs),
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Refuse symlinks and hardlinks
    #[arg(long)]
    pub strict: bool,

    /// Do not apply permission bits from the archive
    #[arg(long)]
    pub no_preserve_permissions: bool,
}

#[derive(clap::Args)]
pub struct FetchArgs {
    /// Reference project name
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// Source cache directory [default: $BUILDPROBE_CACHE_DIR or .integration-sources]
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Reference project to build (repeatable; default: all)
    #[arg(long = "project", short = 'p', value_name = "PROJECT")]
    pub projects: Vec<String>,

    /// Also build a local source tree, copied without VCS and build outputs
    #[arg(long, value_name = "DIR")]
    pub local: Option<PathBuf>,

    /// Isolation setting to try (repeatable; default: both)
    #[arg(long, value_enum)]
    pub isolation: Vec<IsolationArg>,

    /// Invocation path to try (repeatable; default: all)
    #[arg(long, value_enum)]
    pub call: Vec<CallArg>,

    /// Python interpreter used to run the frontend
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// Directory holding per-scenario work directories
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Source cache directory [default: $BUILDPROBE_CACHE_DIR or .integration-sources]
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IsolationArg {
    Isolated,
    NoIsolation,
}

impl From<IsolationArg> for BuildOptions {
    fn from(arg: IsolationArg) -> Self {
        Self {
            isolation: arg == IsolationArg::Isolated,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CallArg {
    Code,
    Module,
    Entrypoint,
}

impl From<CallArg> for Call {
    fn from(arg: CallArg) -> Self {
        match arg {
            CallArg::Code => Self::Code,
            CallArg::Module => Self::Module,
            CallArg::Entrypoint => Self::Entrypoint,
        }
    }
}
