//! Fact-check engine: HTTP access to the backend and async drivers for the core state machine.
mod api;
mod client;
mod dashboard;
mod persist;
mod report;
mod settings;

pub use api::{CheckApi, DashboardApi, ReportApi, ReqwestApi};
pub use client::{FlowObserver, NoopObserver, SubmissionClient};
pub use dashboard::{fetch_cycle, DashboardPoller, DashboardSink};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use report::{download_report, ReportError};
pub use settings::{ClientSettings, DashboardSettings, DEFAULT_BASE_URL};
