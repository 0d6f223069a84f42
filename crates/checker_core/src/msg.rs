use crate::{ImageFile, ResultPayload, SubmissionId, TransportError};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked an image to upload. Validated before it is kept.
    FileSelected(ImageFile),
    /// User removed the selected image.
    FileCleared,
    /// User asked to check the current input box (plus the selected file, if any).
    CheckRequested { text: String },
    /// Backend answered the create-submission request.
    SubmissionCreated(Result<SubmissionId, TransportError>),
    /// One status poll finished.
    PollCompleted(Result<ResultPayload, TransportError>),
    /// Caller or teardown cancelled the active flow.
    CancelRequested,
}
