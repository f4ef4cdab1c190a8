//! Run configuration.
//!
//! [`RunOptions`] is built once, before the run starts, from whatever the
//! caller reads its settings from (CLI flags, action inputs). The optimizer
//! configuration may additionally live in a JSON file in the repository and
//! is loaded with [`load_optimization_config`].

use tracing::debug;

use crate::codec;
use crate::error::{ConfigError, RepositoryError};
use crate::filter::{ChangeFilter, IgnoreSet, SuffixMatch};
use crate::optimizer::OptimizationConfig;
use crate::policy::FailurePolicy;
use crate::repository::RepositoryContentService;

/// Default location of the optimizer configuration file in the repository.
pub const DEFAULT_OPTIMIZER_CONFIG_PATH: &str = ".svgo.json";

/// Commit message template with a `{path}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage(String);

impl CommitMessage {
    pub const PATH_PLACEHOLDER: &'static str = "{path}";

    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Message for the commit that rewrites `path`.
    ///
    /// A template without the placeholder gets the path appended, so every
    /// message identifies its file.
    pub fn for_path(&self, path: &str) -> String {
        if self.0.contains(Self::PATH_PLACEHOLDER) {
            self.0.replace(Self::PATH_PLACEHOLDER, path)
        } else {
            format!("{} ({})", self.0, path)
        }
    }
}

impl Default for CommitMessage {
    fn default() -> Self {
        Self::new("Optimize '{path}' with svgopt")
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Candidate selection.
    pub filter: ChangeFilter,

    /// Optimize but do not commit.
    pub dry_run: bool,

    /// Whether per-file failures fail the run.
    pub failure_policy: FailurePolicy,

    pub commit_message: CommitMessage,
}

impl RunOptions {
    /// Build options from raw ignore globs and flags.
    pub fn new<I, S>(
        ignore: I,
        suffix_match: SuffixMatch,
        dry_run: bool,
        failure_policy: FailurePolicy,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ignore = IgnoreSet::new(ignore)?;
        Ok(Self {
            filter: ChangeFilter::new(ignore, suffix_match),
            dry_run,
            failure_policy,
            commit_message: CommitMessage::default(),
        })
    }

    pub fn with_commit_message(mut self, message: CommitMessage) -> Self {
        self.commit_message = message;
        self
    }
}

/// Split an ignore input into globs. Entries are separated by commas or
/// newlines; blanks are dropped.
pub fn parse_ignore_list(input: &str) -> Vec<String> {
    input
        .split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load the optimizer configuration stored at `path` in the repository.
///
/// A missing file yields the engine defaults.
pub async fn load_optimization_config(
    service: &dyn RepositoryContentService,
    path: &str,
) -> Result<OptimizationConfig, ConfigError> {
    let file = match service.fetch_file_content(path).await {
        Ok(file) => file,
        Err(RepositoryError::NotFound(_)) => {
            debug!(path = %path, "no optimizer configuration found, using defaults");
            return Ok(OptimizationConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Unreadable {
                path: path.to_string(),
                source,
            })
        }
    };

    let invalid = |reason: String| ConfigError::InvalidOptimizerConfig {
        path: path.to_string(),
        reason,
    };

    let text = codec::decode(&file.raw_content, &file.encoding).map_err(|e| invalid(e.to_string()))?;
    let config = OptimizationConfig::from_json(&text).map_err(|e| invalid(e.to_string()))?;

    debug!(path = %path, fingerprint = %config.fingerprint(), "loaded optimizer configuration");
    Ok(config)
}
