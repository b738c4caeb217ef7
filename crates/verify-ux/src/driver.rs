//! Page-level interaction: navigation, bounded selector waits, clicks, fills
//! and session-long guards.

use anyhow::{Result, anyhow};
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams, ReloadParams,
};
use chromiumoxide::cdp::js_protocol::runtime;
use chromiumoxide::page::Page;
use futures::StreamExt as _;
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use url::Url;

/// Poll interval for selector waits.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound for a single navigation.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound for waiting on a selector before interacting with it.
pub const SELECTOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Navigates to `url` and blocks until the document is parsed.
///
/// # Errors
///
/// Returns an error if the URL is invalid or navigation fails or times out.
pub async fn navigate(page: &Page, url: &str) -> Result<()> {
    let url = Url::parse(url).map_err(|err| anyhow!("Invalid target URL {url}: {err}"))?;

    match timeout(NAVIGATION_TIMEOUT, page.goto(url.as_str())).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => return Err(anyhow!("Navigation failed for {url}: {err}")),
        Err(_) => return Err(anyhow!("Navigation timed out for {url}")),
    }

    match timeout(NAVIGATION_TIMEOUT, page.wait_for_navigation()).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => Err(anyhow!("Wait for navigation failed for {url}: {err}")),
        Err(_) => Err(anyhow!("Wait for navigation timed out for {url}")),
    }
}

/// Reloads the page so code on it reads freshly written storage.
///
/// # Errors
///
/// Returns an error if the reload fails or times out.
pub async fn reload(page: &Page) -> Result<()> {
    page.execute(ReloadParams::default()).await?;
    match timeout(NAVIGATION_TIMEOUT, page.wait_for_navigation()).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => Err(anyhow!("Wait for navigation after reload failed: {err}")),
        Err(_) => Err(anyhow!("Reload timed out")),
    }
}

/// Writes a key/value pair into the page's `localStorage`.
///
/// The storage API only exists once a page context does, so this must run
/// after the first successful navigation.
///
/// # Errors
///
/// Returns an error if script evaluation fails.
pub async fn set_local_storage(page: &Page, key: &str, value: &str) -> Result<()> {
    let expression = format!(
        "localStorage.setItem({}, {})",
        Value::from(key),
        Value::from(value)
    );
    page.evaluate(expression).await?;
    Ok(())
}

/// Waits until `selector` matches an element, polling every 100ms.
///
/// # Errors
///
/// Returns an error naming the selector if nothing matches within `wait`.
pub async fn wait_for_selector(page: &Page, selector: &str, wait: Duration) -> Result<()> {
    let expression = format!("document.querySelector({}) !== null", Value::from(selector));
    let deadline = Instant::now() + wait;

    loop {
        let found = page
            .evaluate(expression.as_str())
            .await?
            .into_value::<bool>()
            .unwrap_or(false);
        if found {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(anyhow!("Timed out after {wait:?} waiting for selector {selector}"));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Waits for `selector` and clicks the matching element.
///
/// # Errors
///
/// Returns an error if the selector never matches or the click fails.
pub async fn click(page: &Page, selector: &str) -> Result<()> {
    wait_for_selector(page, selector, SELECTOR_TIMEOUT).await?;
    page.find_element(selector)
        .await
        .map_err(|err| anyhow!("Element {selector} not found: {err}"))?
        .click()
        .await
        .map_err(|err| anyhow!("Click on {selector} failed: {err}"))?;
    Ok(())
}

/// Waits for `selector`, focuses the element and types `text` as keystrokes,
/// so client-side validation sees real input.
///
/// # Errors
///
/// Returns an error if the selector never matches or typing fails.
pub async fn fill(page: &Page, selector: &str, text: &str) -> Result<()> {
    wait_for_selector(page, selector, SELECTOR_TIMEOUT).await?;
    let element = page
        .find_element(selector)
        .await
        .map_err(|err| anyhow!("Element {selector} not found: {err}"))?;
    element
        .click()
        .await
        .map_err(|err| anyhow!("Focus on {selector} failed: {err}"))?;
    element
        .type_str(text)
        .await
        .map_err(|err| anyhow!("Typing into {selector} failed: {err}"))?;
    Ok(())
}

/// Accepts every native dialog (alert/confirm) raised for the remainder of
/// the session, so a stray dialog can never hang the run.
///
/// # Errors
///
/// Returns an error if the event listener cannot be registered.
pub async fn install_dialog_autoaccept(page: &Page) -> Result<JoinHandle<()>> {
    let mut dialogs = page.event_listener::<EventJavascriptDialogOpening>().await?;
    let page = page.clone();
    Ok(tokio::task::spawn(async move {
        while let Some(dialog) = dialogs.next().await {
            log::debug!("Auto-accepting {:?} dialog: {}", dialog.r#type, dialog.message);
            let params = match HandleJavaScriptDialogParams::builder().accept(true).build() {
                Ok(params) => params,
                Err(err) => {
                    log::debug!("Failed to build dialog params: {err}");
                    continue;
                }
            };
            if let Err(err) = page.execute(params).await {
                log::debug!("Dialog accept failed: {err}");
            }
        }
    }))
}

/// Forwards page console output to the process logger. The mock's update log
/// and the page's own errors surface here.
///
/// # Errors
///
/// Returns an error if the Runtime domain cannot be enabled.
pub async fn forward_console(page: &Page) -> Result<JoinHandle<()>> {
    page.execute(runtime::EnableParams::default()).await?;
    let mut events = page.event_listener::<runtime::EventConsoleApiCalled>().await?;
    Ok(tokio::task::spawn(async move {
        while let Some(event) = events.next().await {
            log::debug!("console.{:?}: {}", event.r#type, console_text(&event.args));
        }
    }))
}

fn console_text(args: &[runtime::RemoteObject]) -> String {
    args.iter()
        .filter_map(|arg| arg.value.as_ref())
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
