//! Structured observability hooks for the pipeline run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via [`run_span`]
//! - Emission functions for key lifecycle events: start, state change, file
//!   outcome, abort, finish
//!
//! Events are emitted at `info!` level; per-step progress inside the runner is
//! `debug!`. Use `RUST_LOG` to tune verbosity.

use tracing::{info, warn};

use crate::change::ChangeId;
use crate::error::RunAbort;
use crate::runner::{FileOutcome, FileStatus};
use crate::state::RunState;

/// Span tagging every event of a run with its change id.
pub fn run_span(change_id: ChangeId) -> tracing::Span {
    tracing::info_span!("svgopt.run", change_id = change_id.0)
}

/// Emit event: run started for a change with the given optimizer configuration.
pub fn emit_run_started(change_id: ChangeId, engine: &str, config_fingerprint: &str) {
    let config = config_fingerprint.get(..12).unwrap_or(config_fingerprint);
    info!(
        event = "run.started",
        change_id = change_id.0,
        engine = %engine,
        config = %config,
    );
}

/// Emit event: run moved between lifecycle states.
pub fn emit_state_changed(from: RunState, to: RunState) {
    tracing::debug!(event = "run.state_changed", from = %from, to = %to);
}

/// Emit event: candidates selected from the changed files.
pub fn emit_candidates_selected(total_changes: usize, candidates: usize) {
    info!(
        event = "run.candidates_selected",
        total_changes = total_changes,
        candidates = candidates,
    );
}

/// Emit event: one file finished processing.
pub fn emit_file_outcome(outcome: &FileOutcome) {
    match &outcome.status {
        FileStatus::Committed { commit } => info!(
            event = "file.committed",
            path = %outcome.path,
            commit = %commit.commit_sha,
            duration_ms = outcome.duration_ms,
        ),
        FileStatus::DryRun { encoded_len } => info!(
            event = "file.dry_run",
            path = %outcome.path,
            encoded_len = encoded_len,
            duration_ms = outcome.duration_ms,
        ),
        FileStatus::Unchanged => info!(
            event = "file.unchanged",
            path = %outcome.path,
            duration_ms = outcome.duration_ms,
        ),
        FileStatus::NotSmaller {
            original_len,
            optimized_len,
        } => info!(
            event = "file.not_smaller",
            path = %outcome.path,
            original_len = original_len,
            optimized_len = optimized_len,
            duration_ms = outcome.duration_ms,
        ),
        FileStatus::Failed { error } => warn!(
            event = "file.failed",
            path = %outcome.path,
            step = error.step(),
            error = %error,
        ),
    }
}

/// Emit event: run aborted before processing any file.
pub fn emit_run_aborted(reason: &RunAbort) {
    tracing::error!(event = "run.aborted", reason = %reason);
}

/// Emit event: run finished with duration, outcome counts, and success status.
pub fn emit_run_finished(duration_ms: u64, processed: usize, failed: usize, success: bool) {
    info!(
        event = "run.finished",
        duration_ms = duration_ms,
        processed = processed,
        failed = failed,
        success = success,
    );
}
