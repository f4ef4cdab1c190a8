//! In-memory fakes for the pipeline collaborators (testing only)
//!
//! Provides `MemoryRepository` and `RecordingEngine`, which satisfy the
//! `RepositoryContentService` and `SvgEngine` contracts without any network
//! access or real SVG parsing, and count every call made to them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::change::{ChangeDescriptor, ChangeId, ChangeStatus, CommitResult, FileContent, FileUpdate};
use crate::codec::Encoding;
use crate::error::{OptimizeError, RepositoryError};
use crate::optimizer::{OptimizationConfig, SvgEngine};
use crate::repository::{RepositoryContentService, RepositoryResult};

// ---------------------------------------------------------------------------
// MemoryRepository
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Failures {
    resolve: bool,
    list: bool,
    fetch: HashSet<String>,
    commit: HashSet<String>,
}

#[derive(Debug, Default)]
struct Calls {
    resolve: AtomicUsize,
    list: AtomicUsize,
    fetch: AtomicUsize,
    commit: AtomicUsize,
}

/// In-memory content service for a single change.
///
/// Files are stored base64-encoded unless inserted with [`insert_raw`].
/// Commits replace the stored content, so a later fetch sees the new version.
///
/// [`insert_raw`]: MemoryRepository::insert_raw
#[derive(Debug)]
pub struct MemoryRepository {
    change_id: Mutex<Option<ChangeId>>,
    changes: Mutex<Vec<ChangeDescriptor>>,
    files: Mutex<HashMap<String, FileContent>>,
    commits: Mutex<Vec<FileUpdate>>,
    failures: Mutex<Failures>,
    calls: Calls,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self {
            change_id: Mutex::new(Some(ChangeId(1))),
            changes: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
            commits: Mutex::new(Vec::new()),
            failures: Mutex::new(Failures::default()),
            calls: Calls::default(),
        }
    }
}

impl MemoryRepository {
    /// Repository for change `#1` with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the change the execution context resolves to.
    pub fn set_change_id(&self, id: Option<ChangeId>) {
        *self.change_id.lock().unwrap() = id;
    }

    /// Record a changed file without content.
    pub fn add_change(&self, path: &str, status: ChangeStatus) {
        self.changes
            .lock()
            .unwrap()
            .push(ChangeDescriptor::new(path, status));
    }

    /// Record a changed SVG and store its content.
    pub fn add_svg_change(&self, path: &str, status: ChangeStatus, svg: &str) {
        self.add_change(path, status);
        self.insert_svg(path, svg);
    }

    /// Store `svg` base64-encoded at `path`.
    pub fn insert_svg(&self, path: &str, svg: &str) {
        self.insert_text_file(path, svg);
    }

    /// Store `text` base64-encoded at `path`.
    pub fn insert_text_file(&self, path: &str, text: &str) {
        self.insert_raw(path, Encoding::Base64.name(), &Encoding::Base64.encode(text));
    }

    /// Store `raw` as-is, reported with the given encoding name.
    pub fn insert_raw(&self, path: &str, encoding: &str, raw: &str) {
        let mut files = self.files.lock().unwrap();
        let version = files.len() + 1;
        files.insert(
            path.to_string(),
            FileContent {
                path: path.to_string(),
                encoding: encoding.to_string(),
                raw_content: raw.to_string(),
                sha: Some(format!("blob-{version}")),
            },
        );
    }

    /// Make `resolve_change_id` fail with a transport error.
    pub fn fail_resolve(&self) {
        self.failures.lock().unwrap().resolve = true;
    }

    /// Make `list_changed_files` fail with a transport error.
    pub fn fail_list(&self) {
        self.failures.lock().unwrap().list = true;
    }

    /// Make fetching `path` fail with a transport error.
    pub fn fail_fetch(&self, path: &str) {
        self.failures.lock().unwrap().fetch.insert(path.to_string());
    }

    /// Make committing `path` fail with a transport error.
    pub fn fail_commit(&self, path: &str) {
        self.failures.lock().unwrap().commit.insert(path.to_string());
    }

    pub fn resolve_calls(&self) -> usize {
        self.calls.resolve.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.calls.list.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls.fetch.load(Ordering::SeqCst)
    }

    pub fn commit_calls(&self) -> usize {
        self.calls.commit.load(Ordering::SeqCst)
    }

    /// Successful commits, in the order they were made.
    pub fn commits(&self) -> Vec<FileUpdate> {
        self.commits.lock().unwrap().clone()
    }

    /// Decoded text currently stored at `path`.
    pub fn text_of(&self, path: &str) -> Option<String> {
        let files = self.files.lock().unwrap();
        let file = files.get(path)?;
        crate::codec::decode(&file.raw_content, &file.encoding).ok()
    }
}

#[async_trait]
impl RepositoryContentService for MemoryRepository {
    async fn resolve_change_id(&self) -> RepositoryResult<Option<ChangeId>> {
        self.calls.resolve.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().unwrap().resolve {
            return Err(RepositoryError::Transport("context unavailable".to_string()));
        }
        Ok(*self.change_id.lock().unwrap())
    }

    async fn list_changed_files(&self, id: &ChangeId) -> RepositoryResult<Vec<ChangeDescriptor>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().unwrap().list {
            return Err(RepositoryError::Transport(format!(
                "failed to list files of {id}"
            )));
        }
        Ok(self.changes.lock().unwrap().clone())
    }

    async fn fetch_file_content(&self, path: &str) -> RepositoryResult<FileContent> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().unwrap().fetch.contains(path) {
            return Err(RepositoryError::Transport(format!("failed to fetch {path}")));
        }
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(path.to_string()))
    }

    async fn commit_file(&self, update: &FileUpdate) -> RepositoryResult<CommitResult> {
        self.calls.commit.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().unwrap().commit.contains(&update.path) {
            return Err(RepositoryError::Transport(format!(
                "failed to commit {}",
                update.path
            )));
        }

        let mut commits = self.commits.lock().unwrap();
        commits.push(update.clone());
        let commit_sha = format!("commit-{}", commits.len());

        self.files.lock().unwrap().insert(
            update.path.clone(),
            FileContent {
                path: update.path.clone(),
                encoding: update.encoding.name().to_string(),
                raw_content: update.content.clone(),
                sha: Some(format!("blob-{commit_sha}")),
            },
        );

        Ok(CommitResult {
            path: update.path.clone(),
            commit_sha,
            url: None,
        })
    }
}

// ---------------------------------------------------------------------------
// RecordingEngine
// ---------------------------------------------------------------------------

/// Deterministic engine that collapses whitespace between tags.
///
/// Inputs containing a registered failure marker are rejected with
/// `OptimizeError::Engine`. Every call is counted and its input recorded.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    inputs: Mutex<Vec<String>>,
    fail_markers: Mutex<Vec<String>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any input containing `marker`.
    pub fn fail_on(&self, marker: &str) {
        self.fail_markers.lock().unwrap().push(marker.to_string());
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    /// Inputs seen so far, in call order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

impl SvgEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn optimize(&self, svg: &str, _config: &OptimizationConfig) -> Result<String, OptimizeError> {
        self.inputs.lock().unwrap().push(svg.to_string());

        if let Some(marker) = self
            .fail_markers
            .lock()
            .unwrap()
            .iter()
            .find(|m| svg.contains(m.as_str()))
        {
            return Err(OptimizeError::Engine(format!("rejected input containing '{marker}'")));
        }

        Ok(svg
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .replace("> <", "><"))
    }
}
