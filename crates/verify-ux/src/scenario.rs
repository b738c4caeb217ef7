//! The fixed add-story verification flow.
//!
//! Every parameter of the scenario is a literal here: the served page, the
//! selectors, the form values, the timing bounds and the evidence path.

use crate::{capture, driver};
use anyhow::Result;
use chromiumoxide::page::Page;
use std::path::Path;
use std::time::Duration;

/// Page under verification, served by a collaborating local HTTP server.
/// The runner consumes it, it never starts the server.
pub const TARGET_URL: &str = "http://localhost:8000/index.html";

/// CDN pattern of the real backend SDK; matching loads are aborted.
pub const BLOCKED_SCRIPT_PATTERN: &str = "*firebase*.js";

/// Where the loading-state evidence is written.
pub const SCREENSHOT_PATH: &str = "verification/verification_loading.png";

/// Storage key the page reads to decide which project is selected.
pub const SELECTED_PROJECT_KEY: &str = "selectedProject";
/// Project the mock store serves.
pub const SELECTED_PROJECT_ID: &str = "test-project";

pub const ADD_STORY_BUTTON: &str = "#addStoryBtn";
pub const MODAL_VISIBLE: &str = "#addStoryModal.visible";
pub const SAVE_BUTTON: &str = "#saveNewStoryBtn";
pub const STORY_TEXT_INPUT: &str = "#newStoryText";
pub const STORY_EPIC_INPUT: &str = "#newStoryEpic";

/// Values that satisfy the form's client-side validation.
pub const STORY_TEXT: &str = "Test Story";
pub const STORY_EPIC: &str = "Test Epic";

/// Bound for the modal's class-based visibility signal.
pub const MODAL_TIMEOUT: Duration = Duration::from_millis(5000);

/// How long to wait after save before capturing. Must stay below the mock's
/// update latency so the frame falls inside the saving window.
pub const CAPTURE_DELAY: Duration = Duration::from_millis(500);

/// Drives the add-story flow on a prepared page (interceptor, mock and
/// dialog guard already installed) and captures the loading-state screenshot.
///
/// # Errors
///
/// Returns an error on any navigation failure or selector-wait timeout. No
/// step retries; the first failure aborts the run.
pub async fn run(page: &Page, url: &str, screenshot_path: &Path) -> Result<()> {
    log::info!("Navigating to {url}");
    driver::navigate(page, url).await?;

    driver::set_local_storage(page, SELECTED_PROJECT_KEY, SELECTED_PROJECT_ID).await?;
    log::info!("Selected project {SELECTED_PROJECT_ID}, reloading");
    driver::reload(page).await?;

    log::info!("Opening add-story modal");
    driver::click(page, ADD_STORY_BUTTON).await?;
    driver::wait_for_selector(page, MODAL_VISIBLE, MODAL_TIMEOUT).await?;

    driver::fill(page, STORY_TEXT_INPUT, STORY_TEXT).await?;
    driver::fill(page, STORY_EPIC_INPUT, STORY_EPIC).await?;

    log::info!("Saving story");
    driver::click(page, SAVE_BUTTON).await?;

    tokio::time::sleep(CAPTURE_DELAY).await;
    capture::save_screenshot(page, screenshot_path).await
}
