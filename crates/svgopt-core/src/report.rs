//! Human-readable run summaries.
//!
//! Provides two renderings of a [`RunReport`] for users:
//! - [`RunSummary`]: a one-line classification of the run
//! - [`render_markdown`]: a per-file Markdown table (e.g. for a job summary)

use std::fmt;

use crate::pipeline::RunReport;
use crate::runner::FileStatus;

/// One-line classification of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSummary {
    /// The run stopped before any file was processed.
    Aborted { reason: String },

    /// The change contains no candidate files.
    NoEligibleFiles,

    /// Every candidate was handled without error.
    AllSucceeded { count: usize },

    /// Some candidates failed.
    Partial { succeeded: usize, failed: usize },
}

impl RunSummary {
    pub fn from_report(report: &RunReport) -> Self {
        if let Some(reason) = &report.aborted {
            return RunSummary::Aborted {
                reason: reason.to_string(),
            };
        }
        if report.outcomes.is_empty() {
            return RunSummary::NoEligibleFiles;
        }
        match report.failed_count() {
            0 => RunSummary::AllSucceeded {
                count: report.outcomes.len(),
            },
            failed => RunSummary::Partial {
                succeeded: report.succeeded_count(),
                failed,
            },
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSummary::Aborted { reason } => write!(f, "Aborted before processing: {reason}"),
            RunSummary::NoEligibleFiles => write!(f, "No eligible SVG files"),
            RunSummary::AllSucceeded { count } => write!(f, "All {count} SVG file(s) succeeded"),
            RunSummary::Partial { succeeded, failed } => {
                write!(f, "{succeeded} succeeded / {failed} failed")
            }
        }
    }
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_report(self)
    }
}

/// Render the report as Markdown.
pub fn render_markdown(report: &RunReport) -> String {
    let title = match report.change_id {
        Some(id) => format!("# SVG optimization for pull request {id}\n"),
        None => "# SVG optimization\n".to_string(),
    };
    let mut md = title;

    let status = if report.success { "✓" } else { "✗" };
    md.push_str(&format!("\n{} {}\n", status, report.summary()));
    if report.dry_run {
        md.push_str("\n_Dry run: nothing was committed._\n");
    }

    if report.outcomes.is_empty() {
        return md;
    }

    md.push_str("\n| File | Result |\n|---|---|\n");
    for outcome in &report.outcomes {
        let result = match &outcome.status {
            FileStatus::Committed { commit } => match &commit.url {
                Some(url) => format!("committed ([{}]({}))", short_sha(&commit.commit_sha), url),
                None => format!("committed ({})", short_sha(&commit.commit_sha)),
            },
            FileStatus::DryRun { .. } => "would commit".to_string(),
            FileStatus::Unchanged => "already optimized".to_string(),
            FileStatus::NotSmaller {
                original_len,
                optimized_len,
            } => format!("not smaller ({} -> {} bytes)", original_len, optimized_len),
            FileStatus::Failed { error } => format!("failed: {}", error),
        };
        md.push_str(&format!("| `{}` | {} |\n", outcome.path, result));
    }

    md
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
