use crate::{CheckResult, PayloadKind, Phase, SubmissionId};

pub const CLAIM_PLACEHOLDER: &str = "N/A";
pub const EXPLANATION_PLACEHOLDER: &str = "Analysis not available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientViewModel {
    pub phase: Phase,
    pub payload_kind: Option<PayloadKind>,
    pub submission_id: Option<SubmissionId>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub selected_file: Option<String>,
    /// False while a flow is active; input controls should be disabled.
    pub input_enabled: bool,
    pub dirty: bool,
}

impl ClientViewModel {
    /// Short status label for the status indicator.
    pub fn status_text(&self) -> &'static str {
        match self.phase {
            Phase::Idle | Phase::Completed => "Ready",
            Phase::Submitting => "Submitting...",
            Phase::Polling => "Processing...",
            Phase::Failed => "Error",
            Phase::TimedOut => "Timed out",
            Phase::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            ConfidenceBand::High
        } else if score >= 0.4 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
        }
    }
}

/// Whole-percent rendering of a `[0, 1]` score. Non-finite input counts as 0.
pub fn confidence_percent(score: f64) -> u32 {
    if !score.is_finite() {
        return 0;
    }
    (score.clamp(0.0, 1.0) * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub claim: String,
    /// Present only when it adds information over `claim`.
    pub normalized_claim: Option<String>,
    pub confidence_percent: u32,
    pub band: ConfidenceBand,
    pub explanation: String,
    pub report_file_name: Option<String>,
}

impl ResultView {
    pub fn build(result: &CheckResult, submission_id: Option<&SubmissionId>) -> Self {
        let normalized_claim = result
            .normalized_claim
            .as_deref()
            .filter(|normalized| !normalized.is_empty())
            .filter(|normalized| Some(*normalized) != result.claim.as_deref())
            .map(ToOwned::to_owned);

        Self {
            claim: non_empty_or(result.claim.as_deref(), CLAIM_PLACEHOLDER),
            normalized_claim,
            confidence_percent: confidence_percent(result.confidence),
            band: ConfidenceBand::from_score(result.confidence),
            explanation: non_empty_or(result.explanation.as_deref(), EXPLANATION_PLACEHOLDER),
            report_file_name: submission_id.map(report_file_name),
        }
    }
}

/// File name used when saving the downloadable report.
pub fn report_file_name(submission_id: &SubmissionId) -> String {
    format!("fact-check-report-{submission_id}.html")
}

pub(crate) fn non_empty_or(value: Option<&str>, fallback: &str) -> String {
    value
        .filter(|text| !text.is_empty())
        .unwrap_or(fallback)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(claim: Option<&str>, normalized: Option<&str>, confidence: f64) -> CheckResult {
        CheckResult {
            claim: claim.map(ToOwned::to_owned),
            normalized_claim: normalized.map(ToOwned::to_owned),
            confidence,
            explanation: None,
            status: "completed".to_string(),
        }
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ConfidenceBand::from_score(0.7), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(0.69), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(0.4), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(0.39), ConfidenceBand::Low);
    }

    #[test]
    fn normalized_claim_hidden_when_identical() {
        let view = ResultView::build(&result(Some("same"), Some("same"), 0.5), None);
        assert_eq!(view.normalized_claim, None);

        let view = ResultView::build(&result(Some("raw"), Some("clean"), 0.5), None);
        assert_eq!(view.normalized_claim.as_deref(), Some("clean"));
    }

    #[test]
    fn placeholders_fill_missing_text() {
        let view = ResultView::build(&result(None, None, 0.834), None);
        assert_eq!(view.claim, CLAIM_PLACEHOLDER);
        assert_eq!(view.explanation, EXPLANATION_PLACEHOLDER);
        assert_eq!(view.confidence_percent, 83);
        assert_eq!(view.band, ConfidenceBand::High);
    }

    #[test]
    fn report_name_uses_submission_id() {
        let id = SubmissionId::new("691f3260");
        let view = ResultView::build(&result(Some("x"), None, 0.1), Some(&id));
        assert_eq!(
            view.report_file_name.as_deref(),
            Some("fact-check-report-691f3260.html")
        );
    }
}
