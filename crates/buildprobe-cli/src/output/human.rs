//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use buildprobe_core::ExtractionReport;
use buildprobe_core::Outcome;
use buildprobe_core::Project;
use buildprobe_core::ScenarioResult;
use console::Term;
use console::style;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn headline(&self, mark: &str, text: &str) -> Result<()> {
        if self.use_colors {
            self.term
                .write_line(&format!("{} {text}", style(mark).green().bold()))?;
        } else {
            self.term.write_line(text)?;
        }
        Ok(())
    }

    fn outcome_label(&self, outcome: &Outcome) -> String {
        let label = outcome.label().to_uppercase();
        if !self.use_colors {
            return label;
        }
        match outcome {
            Outcome::Passed => style(label).green().bold().to_string(),
            Outcome::Failed(_) | Outcome::UnexpectedPass(_) => {
                style(label).red().bold().to_string()
            }
            Outcome::ExpectedFailure(_) | Outcome::Skipped(_) => {
                style(label).yellow().to_string()
            }
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline("✓", "Extraction complete")?;
        self.term
            .write_line(&format!("  Files extracted: {}", report.files_extracted))?;
        self.term
            .write_line(&format!("  Directories: {}", report.directories_created))?;
        self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(report.bytes_written)
        ))?;

        if self.verbose {
            self.term
                .write_line(&format!("  Symlinks: {}", report.symlinks_created))?;
            self.term
                .write_line(&format!("  Hardlinks: {}", report.hardlinks_created))?;
            self.term
                .write_line(&format!("  Duration: {:?}", report.duration))?;
        }

        for warning in &report.warnings {
            let prefix = if self.use_colors {
                style("warning:").yellow().bold().to_string()
            } else {
                "warning:".to_string()
            };
            Term::stderr().write_line(&format!("{prefix} {warning}"))?;
        }

        Ok(())
    }

    fn format_fetch_result(&self, project: &Project, path: &Path) -> Result<()> {
        if self.quiet {
            self.term.write_line(&path.display().to_string())?;
            return Ok(());
        }

        self.headline("✓", &format!("Fetched {}", project.name))?;
        if let Some(url) = project.url() {
            self.term.write_line(&format!("  URL: {url}"))?;
        }
        self.term.write_line(&format!("  Path: {}", path.display()))?;
        Ok(())
    }

    fn format_projects(&self, projects: &[Project]) -> Result<()> {
        for project in projects {
            let version = project.version().unwrap_or("-");
            if self.verbose {
                self.term.write_line(&format!(
                    "{:<10} {:<8} {}",
                    project.name,
                    version,
                    project.url().unwrap_or_default()
                ))?;
            } else {
                self.term
                    .write_line(&format!("{:<10} {version}", project.name))?;
            }
        }
        Ok(())
    }

    fn format_scenario(&self, result: &ScenarioResult) -> Result<()> {
        if self.quiet && !result.outcome.is_failure() {
            return Ok(());
        }

        let mut line = format!("{:<8} {}", self.outcome_label(&result.outcome), result.id);
        if self.verbose {
            line.push_str(&format!(" ({:.1?})", result.duration));
        }
        self.term.write_line(&line)?;

        if let Some(reason) = result.outcome.reason() {
            self.term.write_line(&format!("         {reason}"))?;
        }
        if self.verbose {
            for artifact in &result.artifacts {
                self.term.write_line(&format!("         {artifact}"))?;
            }
        }
        Ok(())
    }

    fn format_run_summary(&self, results: &[ScenarioResult]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let count = |label: &str| {
            results
                .iter()
                .filter(|r| r.outcome.label() == label)
                .count()
        };
        self.term.write_line("")?;
        self.term.write_line(&format!(
            "{} passed, {} failed, {} xfail, {} xpass, {} skipped",
            count("passed"),
            count("failed"),
            count("xfail"),
            count("xpass"),
            count("skipped")
        ))?;
        Ok(())
    }
}
