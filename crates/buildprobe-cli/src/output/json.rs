//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use buildprobe_core::ExtractionReport;
use buildprobe_core::Project;
use buildprobe_core::ScenarioResult;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ProjectOutput {
    name: String,
    version: Option<String>,
    url: Option<String>,
    archive: Option<String>,
}

impl From<&Project> for ProjectOutput {
    fn from(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            version: project.version().map(str::to_string),
            url: project.url(),
            archive: project.archive_name(),
        }
    }
}

#[derive(Serialize)]
struct ScenarioOutput<'a> {
    id: &'a str,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    artifacts: &'a [String],
    duration_ms: u128,
}

impl<'a> From<&'a ScenarioResult> for ScenarioOutput<'a> {
    fn from(result: &'a ScenarioResult) -> Self {
        Self {
            id: &result.id,
            outcome: result.outcome.label(),
            reason: result.outcome.reason(),
            artifacts: &result.artifacts,
            duration_ms: result.duration.as_millis(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        #[derive(Serialize)]
        struct ExtractionOutput<'a> {
            files_extracted: usize,
            directories_created: usize,
            symlinks_created: usize,
            hardlinks_created: usize,
            bytes_written: u64,
            entries_skipped: usize,
            duration_ms: u128,
            warnings: &'a [String],
        }

        let data = ExtractionOutput {
            files_extracted: report.files_extracted,
            directories_created: report.directories_created,
            symlinks_created: report.symlinks_created,
            hardlinks_created: report.hardlinks_created,
            bytes_written: report.bytes_written,
            entries_skipped: report.entries_skipped,
            duration_ms: report.duration.as_millis(),
            warnings: &report.warnings,
        };

        Self::output(&JsonOutput::success("extract", data))
    }

    fn format_fetch_result(&self, project: &Project, path: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct FetchOutput {
            #[serde(flatten)]
            project: ProjectOutput,
            path: String,
        }

        let data = FetchOutput {
            project: project.into(),
            path: path.display().to_string(),
        };
        Self::output(&JsonOutput::success("fetch", data))
    }

    fn format_projects(&self, projects: &[Project]) -> Result<()> {
        let data: Vec<ProjectOutput> = projects.iter().map(ProjectOutput::from).collect();
        Self::output(&JsonOutput::success("projects", data))
    }

    fn format_scenario(&self, _result: &ScenarioResult) -> Result<()> {
        // Results are reported together in the summary.
        Ok(())
    }

    fn format_run_summary(&self, results: &[ScenarioResult]) -> Result<()> {
        let data: Vec<ScenarioOutput<'_>> = results.iter().map(ScenarioOutput::from).collect();
        let failed = results.iter().filter(|r| r.outcome.is_failure()).count();

        if failed == 0 {
            Self::output(&JsonOutput::success("run", data))
        } else {
            Self::output(&JsonOutput::failure(
                "run",
                data,
                format!("{failed} of {} scenarios failed", results.len()),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_project_output() {
        let pip = Project::lookup("pip").unwrap();
        let json = serde_json::to_value(ProjectOutput::from(&pip)).unwrap();
        assert_eq!(json["name"], "pip");
        assert_eq!(json["archive"], "pip-20.2.1.tar.gz");
        assert_eq!(
            json["url"],
            "https://github.com/pypa/pip/archive/20.2.1.tar.gz"
        );
    }

    #[test]
    fn test_failure_status() {
        let output = JsonOutput::failure("run", Vec::<u8>::new(), "1 of 1 scenarios failed");
        let json = serde_json::to_value(output).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "1 of 1 scenarios failed");
    }
}
