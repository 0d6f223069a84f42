use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use checker_core::{FlowOutcome, Phase, SubmissionId};
use checker_engine::{ensure_output_dir, AtomicFileWriter};
use checker_logging::{checker_info, checker_warn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".checker_state.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastSubmission {
    pub id: String,
    pub kind: String,
    pub outcome: String,
    pub saved_at: DateTime<Utc>,
}

impl LastSubmission {
    pub fn submission_id(&self) -> SubmissionId {
        SubmissionId::new(self.id.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedState {
    last_submission: Option<LastSubmission>,
}

/// Reads the last submission; a missing or unreadable state file means none.
pub fn load_last_submission(output_dir: &Path) -> Option<LastSubmission> {
    let path = output_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            checker_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<PersistedState>(&content) {
        Ok(state) => state.last_submission,
        Err(err) => {
            checker_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            None
        }
    }
}

/// Remembers a flow that reached the backend. Outcomes without an id are skipped.
pub fn save_outcome(output_dir: &Path, outcome: &FlowOutcome) -> Result<Option<PathBuf>> {
    let (Some(id), Some(kind)) = (&outcome.submission_id, outcome.kind) else {
        return Ok(None);
    };
    let last = LastSubmission {
        id: id.to_string(),
        kind: kind.to_string(),
        outcome: phase_label(outcome.phase()).to_string(),
        saved_at: Utc::now(),
    };
    save_last_submission(output_dir, last).map(Some)
}

fn save_last_submission(output_dir: &Path, last: LastSubmission) -> Result<PathBuf> {
    ensure_output_dir(output_dir)
        .with_context(|| format!("preparing output dir {}", output_dir.display()))?;

    let state = PersistedState {
        last_submission: Some(last),
    };
    let pretty = ron::ser::PrettyConfig::new();
    let content =
        ron::ser::to_string_pretty(&state, pretty).context("serializing persisted state")?;

    let writer = AtomicFileWriter::new(PathBuf::from(output_dir));
    let path = writer
        .write(STATE_FILENAME, content.as_bytes())
        .with_context(|| format!("writing persisted state to {}", output_dir.display()))?;
    checker_info!("Saved last submission to {:?}", path);
    Ok(path)
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Submitting => "submitting",
        Phase::Polling => "polling",
        Phase::Completed => "completed",
        Phase::Failed => "failed",
        Phase::TimedOut => "timed_out",
        Phase::Cancelled => "cancelled",
    }
}
