//! Fact-check client core: pure submission state machine, input rules and view-model helpers.
mod dashboard;
mod effect;
mod error;
mod input;
mod msg;
mod state;
mod update;
mod view_model;
mod wire;

pub use dashboard::{
    narrative_bars, narrative_label, ActivityView, DashboardState, DashboardUpdate,
    DashboardView, NarrativeBar, Section, SectionKind, StatsView, ThreatView, TopClaimView,
    ACTIVITY_FEED_LIMIT, EMPTY_ACTIVITY, EMPTY_NARRATIVES, EMPTY_THREATS, EMPTY_TOP_CLAIMS,
};
pub use effect::Effect;
pub use error::{
    CheckError, TransportError, TransportKind, ValidationError, BACKEND_FALLBACK_MESSAGE,
    TIMEOUT_MESSAGE,
};
pub use input::{
    choose_payload, classify_input, validate_image, ImageFile, Payload, PayloadKind,
    MAX_IMAGE_BYTES,
};
pub use msg::Msg;
pub use state::{
    CheckResult, ClientState, FlowOutcome, Phase, Submission, DEFAULT_MAX_POLL_ATTEMPTS,
};
pub use update::update;
pub use view_model::{
    confidence_percent, report_file_name, ClientViewModel, ConfidenceBand, ResultView,
    CLAIM_PLACEHOLDER, EXPLANATION_PLACEHOLDER,
};
pub use wire::{
    ActivityEvent, CreateSubmissionResponse, DashboardStats, NarrativeCounts, ResultPayload,
    SubmissionId, SubmissionStatus, Threat, TopClaim,
};
