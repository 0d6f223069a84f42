use checker_logging::{checker_debug, checker_info};

use crate::input::{choose_payload, validate_image};
use crate::state::backend_failure_reason;
use crate::{CheckError, CheckResult, ClientState, Effect, Msg, Phase, SubmissionStatus};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every flow started by `CheckRequested` ends with exactly one
/// `Effect::FlowFinished`; messages that arrive for a phase that does not
/// expect them are dropped without effects.
pub fn update(mut state: ClientState, msg: Msg) -> (ClientState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            if state.is_busy() {
                return (state, vec![Effect::Rejected(CheckError::Busy)]);
            }
            match validate_image(&file.mime_type, file.size()) {
                Ok(()) => {
                    state.select_file(file);
                    Vec::new()
                }
                Err(err) => vec![Effect::Rejected(err.into())],
            }
        }
        Msg::FileCleared => {
            if !state.is_busy() {
                state.clear_file();
            }
            Vec::new()
        }
        Msg::CheckRequested { text } => {
            // Single-flight guard: the active flow keeps its state untouched.
            if state.is_busy() {
                return (state, vec![Effect::Rejected(CheckError::Busy)]);
            }
            if text.trim().is_empty() && state.selected_file().is_none() {
                return (
                    state,
                    vec![Effect::Rejected(crate::ValidationError::EmptyInput.into())],
                );
            }
            let file = state.take_selected_file();
            match choose_payload(&text, file) {
                Ok(payload) => {
                    checker_info!("Starting submission kind={}", payload.kind());
                    state.begin(payload.kind());
                    vec![Effect::CreateSubmission { payload }]
                }
                Err(err) => {
                    state.mark_dirty();
                    vec![Effect::Rejected(err.into())]
                }
            }
        }
        Msg::SubmissionCreated(result) => {
            if state.phase() != Phase::Submitting {
                checker_debug!("Ignoring submission response in phase {:?}", state.phase());
                return (state, Vec::new());
            }
            match result {
                Ok(id) => match state.start_polling(id) {
                    Some(submission_id) => vec![Effect::PollAfterDelay {
                        submission_id,
                        attempt: 1,
                    }],
                    None => Vec::new(),
                },
                Err(err) => vec![Effect::FlowFinished(state.finish(Err(err.into())))],
            }
        }
        Msg::PollCompleted(result) => {
            if state.phase() != Phase::Polling {
                checker_debug!("Ignoring poll response in phase {:?}", state.phase());
                return (state, Vec::new());
            }
            state.record_poll_response();
            match result {
                Err(err) => vec![Effect::FlowFinished(state.finish(Err(err.into())))],
                Ok(payload) => match payload.status {
                    SubmissionStatus::Completed => {
                        let result = CheckResult::from(payload);
                        vec![Effect::FlowFinished(state.finish(Ok(result)))]
                    }
                    SubmissionStatus::Error => {
                        let reason = backend_failure_reason(&payload);
                        vec![Effect::FlowFinished(
                            state.finish(Err(CheckError::Backend(reason))),
                        )]
                    }
                    SubmissionStatus::Pending(ref status) => {
                        checker_debug!("Submission still pending status={}", status);
                        let attempts = state.record_pending_poll();
                        if attempts >= state.max_attempts() {
                            vec![Effect::FlowFinished(
                                state.finish(Err(CheckError::Timeout { attempts })),
                            )]
                        } else {
                            match state.submission().and_then(|s| s.id.clone()) {
                                Some(submission_id) => vec![Effect::PollAfterDelay {
                                    submission_id,
                                    attempt: attempts + 1,
                                }],
                                None => Vec::new(),
                            }
                        }
                    }
                },
            }
        }
        Msg::CancelRequested => {
            if state.is_busy() {
                vec![Effect::FlowFinished(state.finish(Err(CheckError::Cancelled)))]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}
