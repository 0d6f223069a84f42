//! Dashboard data contract: per-section state that survives failed refreshes,
//! and the display rows derived from it.

use chrono::{DateTime, Local, NaiveDateTime};
use checker_logging::checker_warn;

use crate::view_model::{confidence_percent, non_empty_or, ConfidenceBand};
use crate::{
    ActivityEvent, DashboardStats, NarrativeCounts, Threat, TopClaim, TransportError,
};

pub const EMPTY_THREATS: &str = "No high-risk claims detected";
pub const EMPTY_TOP_CLAIMS: &str = "No claims yet";
pub const EMPTY_NARRATIVES: &str = "No narrative data yet";
pub const EMPTY_ACTIVITY: &str = "Waiting for activity...";

const CLAIM_PREVIEW_CHARS: usize = 100;
const EVENT_DATA_PREVIEW_CHARS: usize = 50;
/// Most events shown in the activity feed.
pub const ACTIVITY_FEED_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Stats,
    Threats,
    TopClaims,
    Narratives,
    RecentEvents,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Stats,
        SectionKind::Threats,
        SectionKind::TopClaims,
        SectionKind::Narratives,
        SectionKind::RecentEvents,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Stats => "stats",
            SectionKind::Threats => "threats",
            SectionKind::TopClaims => "top-claims",
            SectionKind::Narratives => "narratives",
            SectionKind::RecentEvents => "recent-events",
        }
    }
}

/// Last good value of one section plus the error of the latest refresh, if it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<T> {
    value: Option<T>,
    last_error: Option<String>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            value: None,
            last_error: None,
        }
    }
}

impl<T> Section<T> {
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    /// Replaces the value on success; on failure keeps the previous value visible.
    fn apply(&mut self, kind: SectionKind, result: Result<T, TransportError>) {
        match result {
            Ok(value) => {
                self.value = Some(value);
                self.last_error = None;
            }
            Err(err) => {
                checker_warn!("Dashboard section {} failed: {}", kind.label(), err);
                self.last_error = Some(err.to_string());
            }
        }
    }
}

/// Raw results of one refresh cycle, one per endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardUpdate {
    pub stats: Result<DashboardStats, TransportError>,
    pub threats: Result<Vec<Threat>, TransportError>,
    pub top_claims: Result<Vec<TopClaim>, TransportError>,
    pub narratives: Result<NarrativeCounts, TransportError>,
    pub recent_events: Result<Vec<ActivityEvent>, TransportError>,
}

impl DashboardUpdate {
    pub fn failed_sections(&self) -> Vec<SectionKind> {
        let flags = [
            self.stats.is_err(),
            self.threats.is_err(),
            self.top_claims.is_err(),
            self.narratives.is_err(),
            self.recent_events.is_err(),
        ];
        SectionKind::ALL
            .into_iter()
            .zip(flags)
            .filter_map(|(kind, failed)| failed.then_some(kind))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    cycles: u64,
    stats: Section<DashboardStats>,
    threats: Section<Vec<Threat>>,
    top_claims: Section<Vec<TopClaim>>,
    narratives: Section<NarrativeCounts>,
    recent_events: Section<Vec<ActivityEvent>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn stats(&self) -> &Section<DashboardStats> {
        &self.stats
    }

    pub fn threats(&self) -> &Section<Vec<Threat>> {
        &self.threats
    }

    pub fn top_claims(&self) -> &Section<Vec<TopClaim>> {
        &self.top_claims
    }

    pub fn narratives(&self) -> &Section<NarrativeCounts> {
        &self.narratives
    }

    pub fn recent_events(&self) -> &Section<Vec<ActivityEvent>> {
        &self.recent_events
    }

    /// Applies one cycle. Each section is updated independently of the others.
    pub fn apply(&mut self, update: DashboardUpdate) {
        self.cycles += 1;
        self.stats.apply(SectionKind::Stats, update.stats);
        self.threats.apply(SectionKind::Threats, update.threats);
        self.top_claims.apply(SectionKind::TopClaims, update.top_claims);
        self.narratives.apply(SectionKind::Narratives, update.narratives);
        self.recent_events
            .apply(SectionKind::RecentEvents, update.recent_events);
    }

    pub fn view(&self) -> DashboardView {
        let stale_sections = [
            self.stats.is_stale(),
            self.threats.is_stale(),
            self.top_claims.is_stale(),
            self.narratives.is_stale(),
            self.recent_events.is_stale(),
        ];
        DashboardView {
            cycle: self.cycles,
            stats: self.stats.value().map(StatsView::build),
            threats: self
                .threats
                .value()
                .map(|threats| threats.iter().map(ThreatView::build).collect()),
            top_claims: self
                .top_claims
                .value()
                .map(|claims| claims.iter().map(TopClaimView::build).collect()),
            narratives: self.narratives.value().map(narrative_bars),
            activity: self.recent_events.value().map(|events| {
                events
                    .iter()
                    .take(ACTIVITY_FEED_LIMIT)
                    .map(ActivityView::build)
                    .collect()
            }),
            stale_sections: SectionKind::ALL
                .into_iter()
                .zip(stale_sections)
                .filter_map(|(kind, stale)| stale.then_some(kind))
                .collect(),
        }
    }
}

/// Display rows for every section; `None` means the section never loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub cycle: u64,
    pub stats: Option<StatsView>,
    pub threats: Option<Vec<ThreatView>>,
    pub top_claims: Option<Vec<TopClaimView>>,
    pub narratives: Option<Vec<NarrativeBar>>,
    pub activity: Option<Vec<ActivityView>>,
    pub stale_sections: Vec<SectionKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub total_submissions: u64,
    pub processing: u64,
    pub recent_24h: u64,
    pub average_confidence_percent: u32,
}

impl StatsView {
    pub fn build(stats: &DashboardStats) -> Self {
        Self {
            total_submissions: stats.total_submissions.unwrap_or(0),
            processing: stats.processing.unwrap_or(0),
            recent_24h: stats.recent_24h.unwrap_or(0),
            average_confidence_percent: confidence_percent(
                stats.average_confidence.unwrap_or(0.0),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatView {
    pub claim: String,
    pub risk_level: String,
    /// Two decimals.
    pub risk_score: String,
    pub narrative_type: String,
}

impl ThreatView {
    pub fn build(threat: &Threat) -> Self {
        Self {
            claim: non_empty_or(threat.claim.as_deref(), "Unknown claim"),
            risk_level: non_empty_or(threat.risk_level.as_deref(), "MEDIUM").to_uppercase(),
            risk_score: format!("{:.2}", threat.risk_score.unwrap_or(0.0)),
            narrative_type: non_empty_or(threat.narrative_type.as_deref(), "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopClaimView {
    pub text: String,
    pub confidence_percent: u32,
    pub band: ConfidenceBand,
    pub created_at: Option<String>,
}

impl TopClaimView {
    pub fn build(claim: &TopClaim) -> Self {
        let text = claim
            .claim
            .as_deref()
            .filter(|text| !text.is_empty())
            .or(claim.input_ref.as_deref().filter(|text| !text.is_empty()))
            .unwrap_or("Unknown claim");
        let confidence = claim.confidence.unwrap_or(0.0);
        Self {
            text: truncate_chars(text, CLAIM_PREVIEW_CHARS, "..."),
            confidence_percent: confidence_percent(confidence),
            band: ConfidenceBand::from_score(confidence),
            created_at: claim.created_at.as_deref().map(format_date_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeBar {
    pub key: String,
    pub label: String,
    pub count: f64,
    /// One decimal, share of all counted claims.
    pub percentage: String,
}

/// Human label for a narrative type; unknown keys are shown as-is.
pub fn narrative_label(key: &str) -> &str {
    match key {
        "fear_health" => "Fear - Health",
        "conspiracy_control" => "Conspiracy",
        "blame_scapegoat" => "Blame",
        "hope_miracle" => "Hope/Miracle",
        "political_partisan" => "Political",
        other => other,
    }
}

/// Bars sorted by count, largest first. Non-finite counts are dropped.
pub fn narrative_bars(counts: &NarrativeCounts) -> Vec<NarrativeBar> {
    let finite = || counts.iter().filter(|(_, count)| count.is_finite());
    let total: f64 = finite().map(|(_, &count)| count).sum();
    let mut bars: Vec<NarrativeBar> = finite()
        .map(|(key, &count)| {
            let share = if total > 0.0 {
                count / total * 100.0
            } else {
                0.0
            };
            NarrativeBar {
                key: key.clone(),
                label: narrative_label(key).to_owned(),
                count,
                percentage: format!("{share:.1}"),
            }
        })
        .collect();
    bars.sort_by(|a, b| b.count.total_cmp(&a.count));
    bars
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityView {
    pub time: String,
    pub event_type: String,
    pub summary: String,
}

impl ActivityView {
    pub fn build(event: &ActivityEvent) -> Self {
        let event_type = non_empty_or(event.event_type.as_deref(), "unknown");
        let empty = serde_json::Value::Object(serde_json::Map::new());
        let data = event.data.as_ref().unwrap_or(&empty);

        let summary = match event_type.as_str() {
            "submission_created" => {
                let input_type = data
                    .get("input_type")
                    .and_then(|value| value.as_str())
                    .filter(|text| !text.is_empty())
                    .unwrap_or("submission");
                format!("New {input_type}")
            }
            "fact_check_completed" => {
                let confidence = data
                    .get("confidence")
                    .and_then(|value| value.as_f64())
                    .unwrap_or(0.0);
                format!("Completed: {}% confidence", confidence_percent(confidence))
            }
            "mutation_detected" => {
                let score = data
                    .get("viral_score")
                    .filter(|value| !value.is_null())
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "0".to_string());
                format!("Viral score: {score}")
            }
            _ => truncate_chars(&data.to_string(), EVENT_DATA_PREVIEW_CHARS, ""),
        };

        Self {
            time: event
                .timestamp
                .as_deref()
                .map(format_time_of_day)
                .unwrap_or_default(),
            event_type,
            summary,
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize, ellipsis: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ellipsis),
        None => text.to_owned(),
    }
}

/// Parses RFC 3339 or naive ISO 8601 timestamps (naive ones are taken as local time).
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn format_time_of_day(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_owned())
}

fn format_date_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_owned())
}
