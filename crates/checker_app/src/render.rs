//! Plain-text rendering of the core view models.

use std::io::{self, Write};

use checker_core::{
    CheckError, ClientViewModel, DashboardState, DashboardView, Phase, ResultView,
    EMPTY_ACTIVITY, EMPTY_NARRATIVES, EMPTY_THREATS, EMPTY_TOP_CLAIMS,
};
use checker_engine::{DashboardSink, FlowObserver};

pub fn render_progress(view: &ClientViewModel) -> String {
    match (view.phase, view.payload_kind) {
        (Phase::Submitting, Some(kind)) => format!("{} ({kind})", view.status_text()),
        (Phase::Polling, _) => {
            let id = view
                .submission_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default();
            format!(
                "{} {} [{}/{}]",
                view.status_text(),
                id,
                view.attempts,
                view.max_attempts
            )
        }
        _ => view.status_text().to_string(),
    }
}

pub fn render_result(view: &ResultView) -> Vec<String> {
    let mut lines = vec![format!("Claim: {}", view.claim)];
    if let Some(normalized) = &view.normalized_claim {
        lines.push(format!("Normalized: {normalized}"));
    }
    lines.push(format!(
        "Confidence: {}% ({})",
        view.confidence_percent,
        view.band.label()
    ));
    lines.push(format!("Explanation: {}", view.explanation));
    if let Some(name) = &view.report_file_name {
        lines.push(format!("Report: available as {name}"));
    }
    lines
}

pub fn render_failure(err: &CheckError) -> String {
    match err {
        CheckError::Transport(transport) => format!("Error: {}", transport.message),
        other => format!("Error: {other}"),
    }
}

pub fn render_dashboard(view: &DashboardView) -> Vec<String> {
    let mut lines = vec![format!("== Dashboard (refresh #{}) ==", view.cycle)];

    match &view.stats {
        Some(stats) => lines.push(format!(
            "Total: {} | Processing: {} | Last 24h: {} | Avg confidence: {}%",
            stats.total_submissions,
            stats.processing,
            stats.recent_24h,
            stats.average_confidence_percent
        )),
        None => lines.push("Stats: -".to_string()),
    }

    lines.push("-- High-risk claims --".to_string());
    match view.threats.as_deref() {
        Some([]) | None => lines.push(format!("  {EMPTY_THREATS}")),
        Some(threats) => lines.extend(threats.iter().map(|threat| {
            format!(
                "  [{}] {} (risk {}, {})",
                threat.risk_level, threat.claim, threat.risk_score, threat.narrative_type
            )
        })),
    }

    lines.push("-- Top claims --".to_string());
    match view.top_claims.as_deref() {
        Some([]) | None => lines.push(format!("  {EMPTY_TOP_CLAIMS}")),
        Some(claims) => lines.extend(claims.iter().map(|claim| {
            let when = claim.created_at.as_deref().unwrap_or("");
            format!(
                "  {:>3}% {} {}",
                claim.confidence_percent, claim.text, when
            )
            .trim_end()
            .to_string()
        })),
    }

    lines.push("-- Narratives --".to_string());
    match view.narratives.as_deref() {
        Some([]) | None => lines.push(format!("  {EMPTY_NARRATIVES}")),
        Some(bars) => lines.extend(bars.iter().map(|bar| {
            format!("  {}: {} ({}%)", bar.label, bar.count, bar.percentage)
        })),
    }

    lines.push("-- Activity --".to_string());
    match view.activity.as_deref() {
        Some([]) | None => lines.push(format!("  {EMPTY_ACTIVITY}")),
        Some(events) => lines.extend(events.iter().map(|event| {
            format!("  {} {} {}", event.time, event.event_type, event.summary)
        })),
    }

    if !view.stale_sections.is_empty() {
        let labels: Vec<&str> = view.stale_sections.iter().map(|kind| kind.label()).collect();
        lines.push(format!("(stale: {})", labels.join(", ")));
    }
    lines
}

/// Prints phase changes to stderr so stdout only carries results.
#[derive(Debug, Default)]
pub struct TerminalObserver;

impl FlowObserver for TerminalObserver {
    fn on_change(&self, view: &ClientViewModel) {
        if !view.phase.is_active() {
            return;
        }
        eprintln!("{}", render_progress(view));
    }
}

#[derive(Debug, Default)]
pub struct TerminalDashboard;

impl DashboardSink for TerminalDashboard {
    fn publish(&self, state: &DashboardState) {
        let mut out = io::stdout().lock();
        for line in render_dashboard(&state.view()) {
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out);
    }
}
