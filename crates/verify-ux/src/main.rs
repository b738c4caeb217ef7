use anyhow::Result;
use std::path::Path;
use tokio::runtime::Runtime;
use verify_ux::chrome::BrowserSession;
use verify_ux::mock::MockFirestore;
use verify_ux::{driver, intercept, scenario};

fn main() -> Result<()> {
    env_logger::init();
    let runtime = Runtime::new()?;
    runtime.block_on(run())
}

async fn run() -> Result<()> {
    let session = BrowserSession::launch().await?;

    // Teardown is unconditional: hold the outcome while the session closes.
    let outcome = drive(&session).await;
    session.shutdown().await;
    outcome
}

async fn drive(session: &BrowserSession) -> Result<()> {
    let page = session.new_page().await?;

    // Interceptor, mock and guards all go in before the first navigation.
    let _blocker = intercept::block_url_pattern(&page, scenario::BLOCKED_SCRIPT_PATTERN).await?;
    MockFirestore::default().install(&page).await?;
    let _dialog_guard = driver::install_dialog_autoaccept(&page).await?;
    let _console = driver::forward_console(&page).await?;

    scenario::run(&page, scenario::TARGET_URL, Path::new(scenario::SCREENSHOT_PATH)).await
}
