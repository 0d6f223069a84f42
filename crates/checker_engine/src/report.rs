use std::path::PathBuf;

use checker_core::{report_file_name, SubmissionId, TransportError};
use checker_logging::checker_info;
use thiserror::Error;

use crate::{AtomicFileWriter, PersistError, ReportApi};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report not available: {0}")]
    Unavailable(#[from] TransportError),
    #[error("failed to save report: {0}")]
    Save(#[from] PersistError),
}

/// Downloads the report for `id` and saves it as `fact-check-report-{id}.html`.
pub async fn download_report<A: ReportApi + ?Sized>(
    api: &A,
    id: &SubmissionId,
    max_bytes: u64,
    writer: &AtomicFileWriter,
) -> Result<PathBuf, ReportError> {
    let body = api.fetch_report(id, max_bytes).await?;
    let path = writer.write(&report_file_name(id), &body)?;
    checker_info!("Saved report for {} ({} bytes) to {:?}", id, body.len(), path);
    Ok(path)
}
