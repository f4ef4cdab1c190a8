//! Pipeline orchestration for one pull request.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn, Instrument};

use crate::change::ChangeId;
use crate::config::RunOptions;
use crate::error::RunAbort;
use crate::obs;
use crate::optimizer::Optimizer;
use crate::policy::{FailurePolicy, RunVerdict};
use crate::repository::RepositoryContentService;
use crate::runner::{FileOutcome, FileRunner, FileStatus};
use crate::state::RunState;

/// Result of a complete pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Change the run was for, if it could be resolved.
    pub change_id: Option<ChangeId>,

    /// Final lifecycle state (`Done` or `Failed`).
    pub state: RunState,

    /// Whether the run counts as successful.
    pub success: bool,

    /// Number of changed files in the change.
    pub total_changes: usize,

    /// Number of candidates selected for optimization.
    pub candidates: usize,

    /// Per-candidate outcomes, in candidate order.
    pub outcomes: Vec<FileOutcome>,

    /// Why the run stopped before processing files.
    #[serde(serialize_with = "serialize_abort")]
    pub aborted: Option<RunAbort>,

    /// Policy verdict over the outcomes (absent for aborted runs).
    pub verdict: Option<RunVerdict>,

    /// Whether commits were suppressed.
    pub dry_run: bool,

    /// Fingerprint of the optimizer configuration used for every file.
    pub config_fingerprint: String,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

fn serialize_abort<S: serde::Serializer>(abort: &Option<RunAbort>, s: S) -> Result<S::Ok, S::Error> {
    match abort {
        Some(reason) => s.collect_str(reason),
        None => s.serialize_none(),
    }
}

impl RunReport {
    /// Number of files committed.
    pub fn committed_count(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Committed { .. }))
    }

    /// Number of files that would have been committed in a dry run.
    pub fn dry_run_count(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::DryRun { .. }))
    }

    /// Number of files that were already optimized.
    pub fn unchanged_count(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Unchanged))
    }

    /// Number of files left alone because optimizing would not shrink them.
    pub fn not_smaller_count(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::NotSmaller { .. }))
    }

    /// Number of files that failed.
    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. }))
    }

    /// Number of files handled without error.
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.len() - self.failed_count()
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Drives resolve → list → filter → per-file processing for one change.
pub struct SvgPipeline;

impl SvgPipeline {
    /// Run the pipeline against the change identified by `service`.
    ///
    /// Candidates are processed one at a time, in the order the service lists
    /// them; a file's commit completes before the next file is fetched.
    /// Run-level failures stop the run with `state = Failed`; per-file failures
    /// are recorded and processing continues.
    pub async fn run(
        service: &dyn RepositoryContentService,
        optimizer: &Optimizer,
        options: &RunOptions,
    ) -> RunReport {
        let mut run = RunTracker::new(optimizer, options);

        run.advance(RunState::ResolvingChange);
        let change_id = match service.resolve_change_id().await {
            Ok(Some(id)) => id,
            Ok(None) => return run.abort(RunAbort::ChangeNotFound),
            Err(e) => return run.abort(RunAbort::ResolveChange(e)),
        };
        run.change_id = Some(change_id);

        let span = obs::run_span(change_id);
        Self::run_change(run, service, optimizer, options, change_id)
            .instrument(span)
            .await
    }

    async fn run_change(
        mut run: RunTracker,
        service: &dyn RepositoryContentService,
        optimizer: &Optimizer,
        options: &RunOptions,
        change_id: ChangeId,
    ) -> RunReport {
        obs::emit_run_started(change_id, optimizer.engine_name(), &run.config_fingerprint);

        debug!("fetching changed files for pull request {}", change_id);
        let changes = match service.list_changed_files(&change_id).await {
            Ok(changes) => changes,
            Err(e) => return run.abort(RunAbort::ListFiles(e)),
        };
        debug!("the pull request contains {} file(s)", changes.len());
        run.total_changes = changes.len();

        run.advance(RunState::Filtering);
        let candidates = options.filter.select(&changes);
        run.candidates = candidates.len();
        obs::emit_candidates_selected(changes.len(), candidates.len());

        if candidates.is_empty() {
            debug!("no eligible SVG files in pull request {}", change_id);
            return run.finish(Vec::new());
        }

        run.advance(RunState::ProcessingFiles);
        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let outcome = FileRunner::process(service, optimizer, options, candidate).await;
            obs::emit_file_outcome(&outcome);
            outcomes.push(outcome);
        }

        run.finish(outcomes)
    }
}

/// Bookkeeping for a run in progress.
struct RunTracker {
    state: RunState,
    start: Instant,
    change_id: Option<ChangeId>,
    total_changes: usize,
    candidates: usize,
    dry_run: bool,
    policy: FailurePolicy,
    config_fingerprint: String,
}

impl RunTracker {
    fn new(optimizer: &Optimizer, options: &RunOptions) -> Self {
        Self {
            state: RunState::Start,
            start: Instant::now(),
            change_id: None,
            total_changes: 0,
            candidates: 0,
            dry_run: options.dry_run,
            policy: options.failure_policy,
            config_fingerprint: optimizer.config().fingerprint(),
        }
    }

    fn advance(&mut self, to: RunState) {
        match self.state.transition(to) {
            Ok(next) => {
                obs::emit_state_changed(self.state, next);
                self.state = next;
            }
            Err(e) => warn!(error = %e, "ignoring invalid state transition"),
        }
    }

    fn abort(mut self, reason: RunAbort) -> RunReport {
        obs::emit_run_aborted(&reason);
        self.advance(RunState::Failed);
        let duration_ms = self.start.elapsed().as_millis() as u64;
        obs::emit_run_finished(duration_ms, 0, 0, false);

        RunReport {
            change_id: self.change_id,
            state: self.state,
            success: false,
            total_changes: self.total_changes,
            candidates: self.candidates,
            outcomes: Vec::new(),
            aborted: Some(reason),
            verdict: None,
            dry_run: self.dry_run,
            config_fingerprint: self.config_fingerprint,
            duration_ms,
        }
    }

    fn finish(mut self, outcomes: Vec<FileOutcome>) -> RunReport {
        let verdict = self.policy.evaluate(&outcomes);
        self.advance(RunState::Done);
        let duration_ms = self.start.elapsed().as_millis() as u64;
        obs::emit_run_finished(
            duration_ms,
            outcomes.len(),
            verdict.violations.len(),
            verdict.passed,
        );

        RunReport {
            change_id: self.change_id,
            state: self.state,
            success: verdict.passed,
            total_changes: self.total_changes,
            candidates: self.candidates,
            outcomes,
            aborted: None,
            verdict: Some(verdict),
            dry_run: self.dry_run,
            config_fingerprint: self.config_fingerprint,
            duration_ms,
        }
    }
}
