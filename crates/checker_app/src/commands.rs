use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use checker_core::{validate_image, ImageFile, ResultView, SubmissionId};
use checker_engine::{
    download_report, AtomicFileWriter, DashboardPoller, ReqwestApi, SubmissionClient,
};
use checker_logging::{checker_info, checker_warn};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::persistence;
use crate::render::{render_failure, render_result, TerminalDashboard, TerminalObserver};

/// Runs one check. Returns whether it completed successfully.
pub async fn run_check(
    config: &AppConfig,
    text: &str,
    file: Option<&Path>,
    download: bool,
    cancel: &CancellationToken,
) -> Result<bool> {
    let settings = config.client_settings();
    let api = ReqwestApi::new(&settings).context("configuring the backend client")?;
    let max_report_bytes = settings.max_report_bytes;
    checker_info!(
        "Checking against {} (worst case {:?})",
        api.base_url(),
        settings.worst_case_flow_duration()
    );
    let mut client = SubmissionClient::new(api, settings).with_observer(Arc::new(TerminalObserver));

    if let Some(path) = file {
        let image = match load_image(path)? {
            Ok(image) => image,
            Err(err) => {
                println!("{}", render_failure(&err.into()));
                return Ok(false);
            }
        };
        if let Err(err) = client.select_file(image) {
            println!("{}", render_failure(&err));
            return Ok(false);
        }
    }

    let outcome = client.check(text, cancel).await;
    if let Err(err) = persistence::save_outcome(&config.output_dir, &outcome) {
        checker_warn!("Could not remember submission: {:#}", err);
    }

    let result = match &outcome.result {
        Ok(result) => result,
        Err(err) => {
            println!("{}", render_failure(err));
            return Ok(false);
        }
    };
    for line in render_result(&ResultView::build(result, outcome.submission_id.as_ref())) {
        println!("{line}");
    }

    if let (true, Some(id)) = (download, &outcome.submission_id) {
        let writer = AtomicFileWriter::new(config.output_dir.clone());
        match download_report(client.api(), id, max_report_bytes, &writer).await {
            Ok(path) => println!("Report saved to {}", path.display()),
            Err(err) => println!("{err}"),
        }
    }
    Ok(true)
}

/// Saves the report of `id`, or of the last remembered submission.
pub async fn run_report(config: &AppConfig, id: Option<String>) -> Result<PathBuf> {
    let id = match id {
        Some(id) => SubmissionId::new(id),
        None => match persistence::load_last_submission(&config.output_dir) {
            Some(last) => last.submission_id(),
            None => bail!(
                "no submission id given and none remembered in {}",
                config.output_dir.display()
            ),
        },
    };
    let settings = config.client_settings();
    let api = ReqwestApi::new(&settings).context("configuring the backend client")?;
    let writer = AtomicFileWriter::new(config.output_dir.clone());
    let path = download_report(&api, &id, settings.max_report_bytes, &writer).await?;
    println!("Report saved to {}", path.display());
    Ok(path)
}

pub async fn run_dashboard(
    config: &AppConfig,
    cycles: Option<u64>,
    cancel: &CancellationToken,
) -> Result<()> {
    let api = ReqwestApi::new(&config.client_settings())
        .context("configuring the backend client")?;
    let mut poller = DashboardPoller::new(api, config.dashboard_settings());
    poller.run(&TerminalDashboard, cancel, cycles).await;
    checker_info!("Dashboard stopped after {} refreshes", poller.state().cycles());
    Ok(())
}

/// Reads an image from disk. The outer error is I/O; the inner one is a validation failure.
fn load_image(path: &Path) -> Result<Result<ImageFile, checker_core::ValidationError>> {
    let mime_type = mime_for_path(path);
    let size = fs::metadata(path)
        .with_context(|| format!("reading {}", path.display()))?
        .len();
    // Reject before reading so oversized files never land in memory.
    if let Err(err) = validate_image(mime_type, size) {
        return Ok(Err(err));
    }
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Ok(ImageFile::new(name, mime_type, bytes)))
}

/// MIME type guessed from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checker_core::{ValidationError, MAX_IMAGE_BYTES};
    use tempfile::TempDir;

    #[test]
    fn mime_guess_is_case_insensitive() {
        assert_eq!(mime_for_path(Path::new("a/B.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("doc.pdf")), "application/octet-stream");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn non_image_is_rejected_without_reading() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();
        let err = load_image(&path).unwrap().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotAnImage {
                mime_type: "application/octet-stream".to_string()
            }
        );
    }

    #[test]
    fn oversized_image_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.png");
        let file = fs::File::create(&path).unwrap();
        file.set_len(MAX_IMAGE_BYTES + 1).unwrap();
        let err = load_image(&path).unwrap().unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn image_keeps_name_and_type() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meme.gif");
        fs::write(&path, b"GIF89a").unwrap();
        let image = load_image(&path).unwrap().unwrap();
        assert_eq!(image.name, "meme.gif");
        assert_eq!(image.mime_type, "image/gif");
        assert_eq!(image.size(), 6);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let temp = TempDir::new().unwrap();
        assert!(load_image(&temp.path().join("gone.png")).is_err());
    }
}
