//! Output formatter trait for CLI results.

use anyhow::Result;
use buildprobe_core::ExtractionReport;
use buildprobe_core::Project;
use buildprobe_core::ScenarioResult;
use serde::Serialize;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format extraction result
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()>;

    /// Format the cached tarball of a fetched project
    fn format_fetch_result(&self, project: &Project, path: &Path) -> Result<()>;

    /// Format the project registry
    fn format_projects(&self, projects: &[Project]) -> Result<()>;

    /// Format one finished scenario, as it completes
    fn format_scenario(&self, result: &ScenarioResult) -> Result<()>;

    /// Format the results of a whole run
    fn format_run_summary(&self, results: &[ScenarioResult]) -> Result<()>;
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }

    /// An error result that still carries its data.
    pub fn failure(operation: impl Into<String>, data: T, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: Some(data),
            error: Some(error.into()),
        }
    }
}
