//! Processing of a single candidate file.

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::change::{ChangeDescriptor, CommitResult, FileUpdate};
use crate::codec::Encoding;
use crate::config::RunOptions;
use crate::error::FileError;
use crate::optimizer::Optimizer;
use crate::repository::RepositoryContentService;

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Optimized content was committed.
    Committed { commit: CommitResult },

    /// Dry run: optimized content would have been committed.
    DryRun { encoded_len: usize },

    /// The optimizer produced identical content; nothing to commit.
    Unchanged,

    /// The optimized document is not smaller than the original; nothing to commit.
    NotSmaller {
        original_len: usize,
        optimized_len: usize,
    },

    /// One of the steps failed.
    Failed {
        #[serde(serialize_with = "serialize_display")]
        error: FileError,
    },
}

fn serialize_display<S: serde::Serializer>(error: &FileError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Result of processing one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Repository-relative path.
    pub path: String,

    #[serde(flatten)]
    pub status: FileStatus,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl FileOutcome {
    /// Whether the file was handled without error.
    pub fn succeeded(&self) -> bool {
        !self.failed()
    }

    pub fn failed(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }

    pub fn error(&self) -> Option<&FileError> {
        match &self.status {
            FileStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Runs fetch → decode → optimize → encode → commit for one candidate.
pub struct FileRunner;

impl FileRunner {
    /// Process `candidate`. Never fails: errors are captured in the outcome.
    pub async fn process(
        service: &dyn RepositoryContentService,
        optimizer: &Optimizer,
        options: &RunOptions,
        candidate: &ChangeDescriptor,
    ) -> FileOutcome {
        let start = Instant::now();
        let status = match Self::execute(service, optimizer, options, candidate).await {
            Ok(status) => status,
            Err(error) => FileStatus::Failed { error },
        };

        FileOutcome {
            path: candidate.path.clone(),
            status,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn execute(
        service: &dyn RepositoryContentService,
        optimizer: &Optimizer,
        options: &RunOptions,
        candidate: &ChangeDescriptor,
    ) -> Result<FileStatus, FileError> {
        let path = candidate.path.as_str();

        debug!(path = %path, "fetching file contents");
        let file = service
            .fetch_file_content(path)
            .await
            .map_err(FileError::Fetch)?;

        debug!(path = %path, encoding = %file.encoding, "decoding file contents");
        let encoding: Encoding = file.encoding.parse().map_err(FileError::Decode)?;
        let original = encoding.decode(&file.raw_content).map_err(FileError::Decode)?;

        debug!(path = %path, engine = optimizer.engine_name(), "optimizing");
        let optimized = optimizer
            .optimize(&original)
            .await
            .map_err(FileError::Optimize)?;

        if optimized == original {
            debug!(path = %path, "already optimized, nothing to commit");
            return Ok(FileStatus::Unchanged);
        }
        if optimized.len() >= original.len() {
            debug!(
                path = %path,
                original_len = original.len(),
                optimized_len = optimized.len(),
                "optimized file is not smaller, nothing to commit"
            );
            return Ok(FileStatus::NotSmaller {
                original_len: original.len(),
                optimized_len: optimized.len(),
            });
        }

        debug!(path = %path, encoding = %encoding, "encoding optimized contents");
        let content = encoding.encode(&optimized);

        if options.dry_run {
            debug!(path = %path, "dry run, skipping commit");
            return Ok(FileStatus::DryRun {
                encoded_len: content.len(),
            });
        }

        let update = FileUpdate {
            path: file.path.clone(),
            content,
            encoding,
            message: options.commit_message.for_path(&file.path),
            sha: file.sha,
        };

        debug!(path = %path, "committing optimized file");
        let commit = service
            .commit_file(&update)
            .await
            .map_err(FileError::Commit)?;
        debug!(path = %path, commit = %commit.commit_sha, "commit successful");

        Ok(FileStatus::Committed { commit })
    }
}
