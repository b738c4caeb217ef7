//! Headless Chromium session lifecycle.

use anyhow::{Result, anyhow};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt as _;
use std::env;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Viewport used for every run.
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 900;

/// Finds the Chrome executable on the system.
///
/// Checks the `CHROME_BIN` environment variable first, then probes the usual
/// candidates on `PATH`.
///
/// # Errors
///
/// Returns an error if Chrome cannot be found.
pub fn find_chrome_executable() -> Result<PathBuf> {
    if let Ok(chrome_bin) = env::var("CHROME_BIN") {
        let path = PathBuf::from(&chrome_bin);
        if path.exists() {
            return Ok(path);
        }
    }

    let path_candidates = ["google-chrome", "chromium", "chromium-browser"];

    for candidate in path_candidates {
        if let Ok(output) = Command::new(candidate).arg("--version").output() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);

            // Snap stubs don't output version info and may have snap messages
            if (stdout.contains("Chrome") || stdout.contains("Chromium"))
                && !stderr.contains("snap")
            {
                return Ok(PathBuf::from(candidate));
            }
        }
    }

    Err(anyhow!(
        "Chrome/Chromium executable not found. Please install Chrome or set CHROME_BIN environment variable."
    ))
}

/// Headless browser with its background event handler and profile directory.
///
/// Owns the whole session: the Chrome process, the CDP event-drain task and a
/// throwaway user-data directory. `shutdown` releases everything; dropping the
/// session without calling it still kills the process and removes the profile.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    _user_data_dir: TempDir,
}

impl BrowserSession {
    /// Launches a headless Chrome instance and connects to it.
    ///
    /// # Errors
    ///
    /// Returns an error if Chrome cannot be found or fails to start. Launch
    /// failures are fatal; there are no retries.
    pub async fn launch() -> Result<Self> {
        let chrome_bin = find_chrome_executable()?;
        let user_data_dir = tempfile::tempdir()?;

        let config = BrowserConfig::builder()
            .chrome_executable(&chrome_bin)
            .no_sandbox()
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .user_data_dir(user_data_dir.path())
            .arg("--force-device-scale-factor=1")
            .arg("--hide-scrollbars")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .build()
            .map_err(|err| anyhow!("Browser config error: {err}"))?;

        log::info!("Starting Chrome: {}", chrome_bin.display());

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| anyhow!("Failed to launch Chrome at {}: {err}", chrome_bin.display()))?;

        let handler_task = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    log::debug!("Browser handler error: {err}");
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            _user_data_dir: user_data_dir,
        })
    }

    /// Create a new page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be created.
    pub async fn new_page(&self) -> Result<Page> {
        Ok(self.browser.new_page("about:blank").await?)
    }

    /// Closes the browser and stops the event handler.
    ///
    /// Called on both the success and the failure path of a run.
    pub async fn shutdown(mut self) {
        if let Err(err) = self.browser.close().await {
            log::warn!("Browser close failed: {err}");
        }
        self.handler_task.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
