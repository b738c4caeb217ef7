//! End-to-end runs of the verification flow against a served fixture page.

mod common;

use common::FixtureServer;
use verify_ux::chrome::BrowserSession;
use verify_ux::mock::{MockFirestore, UPDATE_LOG_MESSAGE};
use verify_ux::{driver, intercept, scenario};

const FIXTURE_INDEX: &str = include_str!("fixtures/index.html");
const FIXTURE_NO_BUTTON: &str = include_str!("fixtures/no_add_button.html");

#[tokio::test]
async fn add_story_flow_captures_loading_screenshot() {
    common::skip_if_no_chrome!();
    let _ = env_logger::builder().is_test(true).try_init();

    let server = FixtureServer::serve(FIXTURE_INDEX).await.expect("fixture server");
    let session = BrowserSession::launch().await.expect("browser launch");
    let page = session.new_page().await.expect("new page");

    let _blocker = intercept::block_url_pattern(&page, scenario::BLOCKED_SCRIPT_PATTERN)
        .await
        .expect("interceptor");
    MockFirestore::default().install(&page).await.expect("mock install");
    let _dialog_guard = driver::install_dialog_autoaccept(&page).await.expect("dialog guard");
    let console = common::collect_console(&page).await.expect("console capture");

    let out_dir = tempfile::tempdir().expect("temp output dir");
    let out_path = out_dir.path().join("verification_loading.png");

    scenario::run(&page, &server.url(), &out_path).await.expect("flow should complete");

    let bytes = std::fs::read(&out_path).expect("screenshot file should exist");
    assert!(!bytes.is_empty(), "screenshot must not be empty");
    image::load_from_memory(&bytes).expect("screenshot must decode as PNG");

    // The reload picked up selectedProject, so no project-selection prompt
    let prompt_shown: bool = page
        .evaluate("document.getElementById('projectPrompt').style.display === 'block'")
        .await
        .expect("evaluate prompt state")
        .into_value()
        .expect("prompt state is a bool");
    assert!(!prompt_shown, "a project should be treated as selected after reload");

    let lines = console.lock().expect("console buffer").clone();
    let update_calls = lines.iter().filter(|line| line.contains(UPDATE_LOG_MESSAGE)).count();
    assert_eq!(update_calls, 1, "save must hit the mock update path exactly once: {lines:?}");

    session.shutdown().await;
}

#[tokio::test]
async fn missing_add_story_button_fails_without_screenshot() {
    common::skip_if_no_chrome!();
    let _ = env_logger::builder().is_test(true).try_init();

    let server = FixtureServer::serve(FIXTURE_NO_BUTTON).await.expect("fixture server");
    let session = BrowserSession::launch().await.expect("browser launch");
    let page = session.new_page().await.expect("new page");

    let _blocker = intercept::block_url_pattern(&page, scenario::BLOCKED_SCRIPT_PATTERN)
        .await
        .expect("interceptor");
    MockFirestore::default().install(&page).await.expect("mock install");
    let _dialog_guard = driver::install_dialog_autoaccept(&page).await.expect("dialog guard");

    let out_dir = tempfile::tempdir().expect("temp output dir");
    let out_path = out_dir.path().join("verification_loading.png");

    let result = scenario::run(&page, &server.url(), &out_path).await;
    session.shutdown().await;

    let err = result.expect_err("flow must fail when #addStoryBtn is missing");
    let message = err.to_string();
    assert!(message.contains("Timed out"), "expected a timeout-class error: {message}");
    assert!(message.contains("#addStoryBtn"), "error should name the selector: {message}");
    assert!(!out_path.exists(), "no screenshot may be written on failure");
}
