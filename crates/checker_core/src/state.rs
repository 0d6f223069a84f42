use crate::view_model::ClientViewModel;
use crate::{
    CheckError, ImageFile, PayloadKind, ResultPayload, SubmissionId, BACKEND_FALLBACK_MESSAGE,
};

/// Default attempt ceiling for one polling flow.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

/// Lifecycle of the current (or last) submission flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl Phase {
    /// True while a flow owns the client.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Submitting | Phase::Polling)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Phase::Completed | Phase::Failed | Phase::TimedOut | Phase::Cancelled
        )
    }
}

/// The in-flight submission. Exists only between flow start and its terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub kind: PayloadKind,
    pub id: Option<SubmissionId>,
    /// Polls answered with a non-terminal status.
    pub attempts: u32,
    /// Poll responses observed, terminal or not.
    pub polls: u32,
}

/// A completed fact-check as delivered to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub claim: Option<String>,
    pub normalized_claim: Option<String>,
    /// Clamped into `[0, 1]`; a missing score is `0`.
    pub confidence: f64,
    pub explanation: Option<String>,
    pub status: String,
}

impl From<ResultPayload> for CheckResult {
    fn from(payload: ResultPayload) -> Self {
        let confidence = payload
            .confidence
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        Self {
            claim: payload.claim,
            normalized_claim: payload.normalized_claim,
            confidence,
            explanation: payload.explanation,
            status: payload.status.as_str().to_owned(),
        }
    }
}

/// Reason carried by a backend `error` status, with the generic fallback.
pub(crate) fn backend_failure_reason(payload: &ResultPayload) -> String {
    payload
        .explanation
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(BACKEND_FALLBACK_MESSAGE)
        .to_owned()
}

/// How a flow ended. `submission_id` is absent when the flow never got one.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowOutcome {
    pub submission_id: Option<SubmissionId>,
    pub kind: Option<PayloadKind>,
    pub polls: u32,
    pub result: Result<CheckResult, CheckError>,
}

impl FlowOutcome {
    /// Outcome of a request refused before a flow started.
    pub fn rejected(error: CheckError) -> Self {
        Self {
            submission_id: None,
            kind: None,
            polls: 0,
            result: Err(error),
        }
    }

    pub fn phase(&self) -> Phase {
        match &self.result {
            Ok(_) => Phase::Completed,
            Err(CheckError::Timeout { .. }) => Phase::TimedOut,
            Err(CheckError::Cancelled) => Phase::Cancelled,
            Err(_) => Phase::Failed,
        }
    }
}

/// Explicit UI state owned by the submission client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientState {
    phase: Phase,
    max_attempts: u32,
    selected_file: Option<ImageFile>,
    submission: Option<Submission>,
    last_outcome: Option<FlowOutcome>,
    dirty: bool,
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POLL_ATTEMPTS)
    }
}

impl ClientState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            phase: Phase::Idle,
            max_attempts: max_attempts.max(1),
            selected_file: None,
            submission: None,
            last_outcome: None,
            dirty: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_active()
    }

    pub fn selected_file(&self) -> Option<&ImageFile> {
        self.selected_file.as_ref()
    }

    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&FlowOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn view(&self) -> ClientViewModel {
        ClientViewModel {
            phase: self.phase,
            payload_kind: self.submission.as_ref().map(|s| s.kind),
            submission_id: self.submission.as_ref().and_then(|s| s.id.clone()),
            attempts: self.submission.as_ref().map_or(0, |s| s.attempts),
            max_attempts: self.max_attempts,
            selected_file: self.selected_file.as_ref().map(|f| f.name.clone()),
            input_enabled: !self.is_busy(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn select_file(&mut self, file: ImageFile) {
        self.selected_file = Some(file);
        self.mark_dirty();
    }

    pub(crate) fn clear_file(&mut self) {
        if self.selected_file.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn take_selected_file(&mut self) -> Option<ImageFile> {
        self.selected_file.take()
    }

    pub(crate) fn begin(&mut self, kind: PayloadKind) {
        self.phase = Phase::Submitting;
        self.submission = Some(Submission {
            kind,
            id: None,
            attempts: 0,
            polls: 0,
        });
        self.mark_dirty();
    }

    pub(crate) fn start_polling(&mut self, id: SubmissionId) -> Option<SubmissionId> {
        let submission = self.submission.as_mut()?;
        submission.id = Some(id.clone());
        submission.attempts = 0;
        self.phase = Phase::Polling;
        self.mark_dirty();
        Some(id)
    }

    pub(crate) fn record_poll_response(&mut self) {
        if let Some(submission) = self.submission.as_mut() {
            submission.polls += 1;
        }
    }

    /// Counts one unfinished poll; returns the new attempt count.
    pub(crate) fn record_pending_poll(&mut self) -> u32 {
        let attempts = match self.submission.as_mut() {
            Some(submission) => {
                submission.attempts += 1;
                submission.attempts
            }
            None => 0,
        };
        self.mark_dirty();
        attempts
    }

    /// Ends the flow, discarding the submission and its counter.
    pub(crate) fn finish(&mut self, result: Result<CheckResult, CheckError>) -> FlowOutcome {
        let submission = self.submission.take();
        let outcome = FlowOutcome {
            submission_id: submission.as_ref().and_then(|s| s.id.clone()),
            kind: submission.as_ref().map(|s| s.kind),
            polls: submission.as_ref().map_or(0, |s| s.polls),
            result,
        };
        self.phase = outcome.phase();
        self.selected_file = None;
        self.last_outcome = Some(outcome.clone());
        self.mark_dirty();
        outcome
    }
}
