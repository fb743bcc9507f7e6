//! Per-invocation reconciliation state.
//!
//! One `ReconciliationRun` exists per analyze call. It buffers at most one
//! in-flight result candidate — never the chunks themselves — and seals
//! once the underlying stream finishes or fails.

use crate::domain::entities::ReconciliationResult;

/// Aggregate root for one reconciliation invocation.
#[derive(Debug, Default)]
pub struct ReconciliationRun {
    candidate: Option<ReconciliationResult>,
    progress_forwarded: usize,
    sealed: bool,
}

impl ReconciliationRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a progress message forwarded to the caller. Progress is
    /// consumed immediately downstream and not retained here.
    pub fn note_progress(&mut self) {
        debug_assert!(!self.sealed, "progress after seal violates ordering");
        self.progress_forwarded += 1;
    }

    /// Capture a validated result candidate. Last valid candidate wins: a
    /// later candidate overwrites any earlier one.
    pub fn capture(&mut self, result: ReconciliationResult) {
        debug_assert!(!self.sealed, "capture after seal");
        self.candidate = Some(result);
    }

    /// Seal the run and take the final candidate, if any was captured.
    /// After sealing the run is immutable.
    pub fn seal(&mut self) -> Option<ReconciliationResult> {
        self.sealed = true;
        self.candidate.take()
    }

    /// Seal the run discarding any captured candidate (generation failure:
    /// no partial result is fabricated).
    pub fn seal_failed(&mut self) {
        self.sealed = true;
        self.candidate = None;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn progress_forwarded(&self) -> usize {
        self.progress_forwarded
    }
}
