//! Screenshot evidence capture.

use anyhow::{Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page;
use std::fs::{create_dir_all, write};
use std::path::Path;

/// Captures a full-page PNG screenshot of the current page state.
///
/// # Errors
///
/// Returns an error if capture or decoding fails.
pub async fn screenshot_png(page: &Page) -> Result<Vec<u8>> {
    let params = CaptureScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .from_surface(true)
        .capture_beyond_viewport(true)
        .build();
    let response = page.execute(params).await?;
    let base64_str: &str = response.data.as_ref();
    let bytes = BASE64_STANDARD
        .decode(base64_str)
        .map_err(|err| anyhow!("Failed to decode base64 screenshot: {err}"))?;
    Ok(bytes)
}

/// Captures a screenshot and writes it to `path`, creating the parent
/// directory and overwriting any existing file.
///
/// This is a point-in-time, best-effort capture: nothing asserts what the
/// frame shows, the image is for manual inspection.
///
/// # Errors
///
/// Returns an error if capture or the filesystem write fails.
pub async fn save_screenshot(page: &Page, path: &Path) -> Result<()> {
    let bytes = screenshot_png(page).await?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    write(path, &bytes)?;
    log::info!("Wrote {} byte screenshot to {}", bytes.len(), path.display());
    Ok(())
}
