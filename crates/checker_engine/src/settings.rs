use std::time::Duration;

use checker_core::DEFAULT_MAX_POLL_ATTEMPTS;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Delay before every status poll.
    pub poll_interval: Duration,
    /// Attempt ceiling; the flow times out after this many unfinished polls.
    pub max_poll_attempts: u32,
    pub connect_timeout: Duration,
    /// Bounds each individual request, so one slow poll cannot stall the flow forever.
    pub request_timeout: Duration,
    pub max_report_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(3000),
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_report_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ClientSettings {
    /// Upper bound on a flow's wall-clock time under the count-based timeout.
    pub fn worst_case_flow_duration(&self) -> Duration {
        let per_attempt = self.poll_interval + self.request_timeout;
        self.request_timeout + per_attempt * self.max_poll_attempts
    }
}

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub refresh_interval: Duration,
    pub recent_events_count: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(10_000),
            recent_events_count: 20,
        }
    }
}
