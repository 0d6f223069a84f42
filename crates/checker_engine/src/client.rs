use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use checker_core::{
    update, CheckError, ClientState, ClientViewModel, Effect, FlowOutcome, ImageFile, Msg,
    Phase, ResultPayload, SubmissionId, TransportError,
};
use checker_logging::{checker_info, checker_warn};
use tokio_util::sync::CancellationToken;

use crate::{CheckApi, ClientSettings};

/// Receives a fresh view whenever the client state changes.
pub trait FlowObserver: Send + Sync {
    fn on_change(&self, view: &ClientViewModel);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FlowObserver for NoopObserver {
    fn on_change(&self, _view: &ClientViewModel) {}
}

/// Drives the pure submission state machine against a backend.
///
/// The client owns its [`ClientState`]; effects returned by
/// [`checker_core::update`] are executed one at a time, so poll attempts are
/// strictly sequential. Timeout is count-based: the flow ends after
/// `max_poll_attempts` unfinished polls, each preceded by `poll_interval` and
/// bounded by the HTTP request timeout.
pub struct SubmissionClient<A> {
    api: A,
    settings: ClientSettings,
    state: ClientState,
    observer: Arc<dyn FlowObserver>,
}

impl<A: CheckApi> SubmissionClient<A> {
    pub fn new(api: A, settings: ClientSettings) -> Self {
        let state = ClientState::new(settings.max_poll_attempts);
        Self {
            api,
            settings,
            state,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FlowObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Validates and keeps an image for the next check.
    pub fn select_file(&mut self, file: ImageFile) -> Result<(), CheckError> {
        match self.dispatch(Msg::FileSelected(file)).into_iter().next() {
            Some(Effect::Rejected(err)) => Err(err),
            _ => Ok(()),
        }
    }

    pub fn clear_file(&mut self) {
        self.dispatch(Msg::FileCleared);
    }

    /// Runs one full flow: submit, poll until a terminal state, return the outcome.
    ///
    /// Firing `cancel` ends the flow at its next suspension point with
    /// [`CheckError::Cancelled`]; no further requests are issued.
    pub async fn check(&mut self, text: &str, cancel: &CancellationToken) -> FlowOutcome {
        let mut pending: VecDeque<Effect> = self
            .dispatch(Msg::CheckRequested {
                text: text.to_string(),
            })
            .into();

        while let Some(effect) = pending.pop_front() {
            let msg = match effect {
                Effect::Rejected(err) => return FlowOutcome::rejected(err),
                Effect::FlowFinished(outcome) => {
                    log_outcome(&outcome);
                    return outcome;
                }
                Effect::CreateSubmission { payload } => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Msg::CancelRequested,
                        result = self.api.create_submission(&payload) => {
                            Msg::SubmissionCreated(result)
                        }
                    }
                }
                Effect::PollAfterDelay {
                    submission_id,
                    attempt,
                } => {
                    checker_info!(
                        "Polling submission {} attempt {}/{}",
                        submission_id,
                        attempt,
                        self.state.max_attempts()
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Msg::CancelRequested,
                        result = poll_once(&self.api, &submission_id, self.settings.poll_interval) => {
                            Msg::PollCompleted(result)
                        }
                    }
                }
            };
            pending.extend(self.dispatch(msg));
        }

        // The state machine always finishes a started flow; reaching here means
        // it stopped emitting effects, so release the guard explicitly.
        checker_warn!("Flow ended without a terminal effect; cancelling");
        self.abandon()
            .unwrap_or_else(|| FlowOutcome::rejected(CheckError::Cancelled))
    }

    /// Ends an active flow whose future was dropped, releasing the single-flight guard.
    pub fn abandon(&mut self) -> Option<FlowOutcome> {
        if !self.state.is_busy() {
            return None;
        }
        self.dispatch(Msg::CancelRequested)
            .into_iter()
            .find_map(|effect| match effect {
                Effect::FlowFinished(outcome) => Some(outcome),
                _ => None,
            })
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.observer.on_change(&state.view());
        }
        self.state = state;
        effects
    }
}

async fn poll_once<A: CheckApi>(
    api: &A,
    submission_id: &SubmissionId,
    delay: Duration,
) -> Result<ResultPayload, TransportError> {
    tokio::time::sleep(delay).await;
    api.fetch_result(submission_id).await
}

fn log_outcome(outcome: &FlowOutcome) {
    let id = outcome
        .submission_id
        .as_ref()
        .map(SubmissionId::to_string)
        .unwrap_or_else(|| "-".to_string());
    match &outcome.result {
        Ok(result) => checker_info!(
            "Submission {} completed after {} polls confidence={:.2}",
            id,
            outcome.polls,
            result.confidence
        ),
        Err(err) => checker_warn!(
            "Submission {} ended {:?} after {} polls: {}",
            id,
            outcome.phase(),
            outcome.polls,
            err
        ),
    }
}
