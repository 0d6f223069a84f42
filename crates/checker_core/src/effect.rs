use crate::{CheckError, FlowOutcome, Payload, SubmissionId};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Issue exactly one `POST /check` with this payload.
    CreateSubmission { payload: Payload },
    /// Wait the poll interval, then issue one `GET /result/{id}`.
    PollAfterDelay {
        submission_id: SubmissionId,
        attempt: u32,
    },
    /// The flow reached a terminal state.
    FlowFinished(FlowOutcome),
    /// The message was refused locally; no flow was started or changed.
    Rejected(CheckError),
}
