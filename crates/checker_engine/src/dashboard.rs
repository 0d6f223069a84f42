use checker_core::{DashboardState, DashboardUpdate};
use checker_logging::{checker_debug, checker_info, checker_warn};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{DashboardApi, DashboardSettings};

/// Receives the dashboard state after every refresh cycle.
pub trait DashboardSink: Send + Sync {
    fn publish(&self, state: &DashboardState);
}

/// Fetches all five sections concurrently; each result is independent.
pub async fn fetch_cycle<A: DashboardApi + ?Sized>(
    api: &A,
    settings: &DashboardSettings,
) -> DashboardUpdate {
    let (stats, threats, top_claims, narratives, recent_events) = tokio::join!(
        api.stats(),
        api.threats(),
        api.top_claims(),
        api.narratives(),
        api.recent_events(settings.recent_events_count),
    );
    DashboardUpdate {
        stats,
        threats,
        top_claims,
        narratives,
        recent_events,
    }
}

/// Periodic dashboard refresher: one cycle immediately, then one per interval.
pub struct DashboardPoller<A> {
    api: A,
    settings: DashboardSettings,
    state: DashboardState,
}

impl<A: DashboardApi> DashboardPoller<A> {
    pub fn new(api: A, settings: DashboardSettings) -> Self {
        Self {
            api,
            settings,
            state: DashboardState::new(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Runs one refresh cycle and publishes the result.
    pub async fn refresh(&mut self, sink: &dyn DashboardSink) {
        let update = fetch_cycle(&self.api, &self.settings).await;
        let failed = update.failed_sections();
        if failed.is_empty() {
            checker_debug!("Dashboard cycle {} ok", self.state.cycles() + 1);
        } else {
            checker_warn!(
                "Dashboard cycle {} had {} failed section(s)",
                self.state.cycles() + 1,
                failed.len()
            );
        }
        self.state.apply(update);
        sink.publish(&self.state);
    }

    /// Refreshes until `cancel` fires, or until `max_cycles` cycles have run.
    pub async fn run(
        &mut self,
        sink: &dyn DashboardSink,
        cancel: &CancellationToken,
        max_cycles: Option<u64>,
    ) {
        let mut ticker = tokio::time::interval(self.settings.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ran = 0u64;

        loop {
            if max_cycles.is_some_and(|max| ran >= max) {
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    checker_info!("Dashboard poller shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            checker_info!("Dashboard poller cancelled mid-cycle");
                            break;
                        }
                        _ = self.refresh(sink) => {}
                    }
                    ran += 1;
                }
            }
        }
    }
}
