//! Projects command implementation.

use crate::output::OutputFormatter;
use anyhow::Result;
use buildprobe_core::Project;

pub fn execute(formatter: &dyn OutputFormatter) -> Result<()> {
    formatter.format_projects(&Project::reference())
}
