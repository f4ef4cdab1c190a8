//! Repository content service abstraction.
//!
//! The pipeline reads the change and its files, and writes commits, only
//! through [`RepositoryContentService`]. The GitHub implementation lives in
//! `svgopt-github`; an in-memory fake is provided by the `fakes` module.

use async_trait::async_trait;

use crate::change::{ChangeDescriptor, ChangeId, CommitResult, FileContent, FileUpdate};
use crate::error::RepositoryError;

/// Result type for content service operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Access to the files of a change and the branch it lives on.
///
/// Guarantees:
/// - `resolve_change_id` returns `Ok(None)` when the execution context does not
///   identify a change; errors are reserved for transport failures.
/// - `list_changed_files` returns descriptors in the service's order.
/// - `fetch_file_content` returns `RepositoryError::NotFound` for absent files.
/// - `commit_file` creates exactly one commit per successful call.
#[async_trait]
pub trait RepositoryContentService: Send + Sync {
    /// Identify the change this run is for.
    async fn resolve_change_id(&self) -> RepositoryResult<Option<ChangeId>>;

    /// All files touched by the change.
    async fn list_changed_files(&self, id: &ChangeId) -> RepositoryResult<Vec<ChangeDescriptor>>;

    /// Current content of `path` on the change's branch.
    async fn fetch_file_content(&self, path: &str) -> RepositoryResult<FileContent>;

    /// Commit new content for one file to the change's branch.
    async fn commit_file(&self, update: &FileUpdate) -> RepositoryResult<CommitResult>;
}
