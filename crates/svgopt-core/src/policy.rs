//! Run verdict from per-file outcomes.

use serde::{Deserialize, Serialize};

use crate::runner::FileOutcome;

/// Whether per-file failures fail the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed file fails the run. Remaining files are still processed.
    #[default]
    Strict,

    /// Failed files are reported but the run succeeds.
    Lenient,
}

/// Verdict over the outcomes of a run that was not aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunVerdict {
    /// Whether the run counts as successful.
    pub passed: bool,

    /// One line per failed file.
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

impl FailurePolicy {
    /// Evaluate the outcomes under this policy.
    ///
    /// Violations are listed under both policies; only `passed` differs.
    pub fn evaluate(&self, outcomes: &[FileOutcome]) -> RunVerdict {
        let violations: Vec<String> = outcomes
            .iter()
            .filter_map(|o| o.error().map(|e| format!("'{}': {}", o.path, e)))
            .collect();

        let passed = match self {
            FailurePolicy::Strict => violations.is_empty(),
            FailurePolicy::Lenient => true,
        };

        let message = if violations.is_empty() {
            "All files processed".to_string()
        } else if passed {
            format!("{} file(s) failed (ignored by policy)", violations.len())
        } else {
            format!("{} file(s) failed", violations.len())
        };

        RunVerdict {
            passed,
            violations,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FileError, OptimizeError};
    use crate::runner::FileStatus;

    fn ok(path: &str) -> FileOutcome {
        FileOutcome {
            path: path.to_string(),
            status: FileStatus::Unchanged,
            duration_ms: 1,
        }
    }

    fn failed(path: &str) -> FileOutcome {
        FileOutcome {
            path: path.to_string(),
            status: FileStatus::Failed {
                error: FileError::Optimize(OptimizeError::Engine("bad svg".to_string())),
            },
            duration_ms: 1,
        }
    }

    #[test]
    fn test_no_outcomes_passes() {
        assert!(FailurePolicy::Strict.evaluate(&[]).passed);
        assert!(FailurePolicy::Lenient.evaluate(&[]).passed);
    }

    #[test]
    fn test_strict_fails_on_any_file_error() {
        let verdict = FailurePolicy::Strict.evaluate(&[ok("a.svg"), failed("b.svg")]);
        assert!(!verdict.passed);
        assert_eq!(verdict.violations.len(), 1);
        assert!(verdict.violations[0].contains("b.svg"));
        assert!(verdict.violations[0].contains("bad svg"));
    }

    #[test]
    fn test_lenient_reports_but_passes() {
        let verdict = FailurePolicy::Lenient.evaluate(&[failed("a.svg"), failed("b.svg")]);
        assert!(verdict.passed);
        assert_eq!(verdict.violations.len(), 2);
        assert!(verdict.message.contains("ignored"));
    }

    #[test]
    fn test_default_is_strict() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Strict);
    }
}
