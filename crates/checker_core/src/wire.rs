//! JSON bodies exchanged with the fact-check backend.
//!
//! Every field the backend may omit is optional; defaults are applied by the
//! view-model builders rather than at decode time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the backend on create-submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /check`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateSubmissionResponse {
    pub submission_id: SubmissionId,
}

/// Status tag of `GET /result/{id}`. Anything other than `completed` or `error`
/// means the backend is still working, including a missing or null status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum SubmissionStatus {
    Completed,
    Error,
    Pending(String),
}

impl From<String> for SubmissionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "completed" => SubmissionStatus::Completed,
            "error" => SubmissionStatus::Error,
            _ => SubmissionStatus::Pending(raw),
        }
    }
}

impl From<Option<String>> for SubmissionStatus {
    fn from(raw: Option<String>) -> Self {
        raw.map(SubmissionStatus::from).unwrap_or_default()
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        SubmissionStatus::Pending(String::new())
    }
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Error => "error",
            SubmissionStatus::Pending(raw) => raw,
        }
    }
}

/// Body of `GET /result/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultPayload {
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub claim: Option<String>,
    #[serde(default)]
    pub normalized_claim: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl ResultPayload {
    pub fn pending(status: impl Into<String>) -> Self {
        Self {
            status: SubmissionStatus::from(status.into()),
            claim: None,
            normalized_claim: None,
            confidence: None,
            explanation: None,
        }
    }
}

/// Body of `GET /dashboard/stats`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_submissions: Option<u64>,
    #[serde(default)]
    pub processing: Option<u64>,
    #[serde(default)]
    pub recent_24h: Option<u64>,
    #[serde(default)]
    pub average_confidence: Option<f64>,
}

/// One entry of `GET /dashboard/threats`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Threat {
    #[serde(default)]
    pub claim: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub narrative_type: Option<String>,
}

/// One entry of `GET /dashboard/top-claims`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopClaim {
    #[serde(default)]
    pub claim: Option<String>,
    #[serde(default)]
    pub input_ref: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `GET /dashboard/narratives`: narrative type to claim count.
/// Counts are taken as plain numbers; the backend is not guaranteed to send integers.
pub type NarrativeCounts = BTreeMap<String, f64>;

/// One entry of `GET /dashboard/recent-events`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivityEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}
