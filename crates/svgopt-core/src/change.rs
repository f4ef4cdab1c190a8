//! Changed-file descriptors and the file payloads exchanged with the content service.

use serde::{Deserialize, Serialize};

use crate::codec::Encoding;

/// Identifier of the change being processed (e.g. a pull request number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId(pub u64);

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Status of a file within a change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ChangeStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    Copied,
    /// Changed in some other way (mode change, unknown status).
    Changed,
    Unchanged,
}

impl ChangeStatus {
    /// Get the status name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Removed => "removed",
            ChangeStatus::Renamed => "renamed",
            ChangeStatus::Copied => "copied",
            ChangeStatus::Changed => "changed",
            ChangeStatus::Unchanged => "unchanged",
        }
    }

    /// Whether the file exists after the change with new content.
    pub fn has_new_content(&self) -> bool {
        matches!(self, ChangeStatus::Added | ChangeStatus::Modified)
    }
}

impl From<String> for ChangeStatus {
    fn from(name: String) -> Self {
        match name.as_str() {
            "added" => ChangeStatus::Added,
            "modified" => ChangeStatus::Modified,
            "removed" => ChangeStatus::Removed,
            "renamed" => ChangeStatus::Renamed,
            "copied" => ChangeStatus::Copied,
            "unchanged" => ChangeStatus::Unchanged,
            _ => ChangeStatus::Changed,
        }
    }
}

/// A file touched by the change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeDescriptor {
    /// Repository-relative path.
    pub path: String,

    /// What happened to the file.
    pub status: ChangeStatus,
}

impl ChangeDescriptor {
    pub fn new(path: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// File content as reported by the content service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileContent {
    /// Repository-relative path.
    pub path: String,

    /// Transport encoding of `raw_content`.
    pub encoding: String,

    /// Content in `encoding`.
    pub raw_content: String,

    /// Blob identifier required by the service to update the file.
    pub sha: Option<String>,
}

/// New content to be committed for a single file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileUpdate {
    pub path: String,

    /// Content in `encoding`.
    pub content: String,

    pub encoding: Encoding,

    /// Commit message.
    pub message: String,

    /// Blob identifier of the version being replaced.
    pub sha: Option<String>,
}

/// Result of a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitResult {
    pub path: String,

    /// Identifier of the created commit.
    pub commit_sha: String,

    /// Link to the commit, when the service provides one.
    pub url: Option<String>,
}
