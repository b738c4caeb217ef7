//! Request blocking via the CDP Fetch domain.

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::page::Page;
use futures::StreamExt as _;
use tokio::task::JoinHandle;

/// Aborts every outgoing request whose URL matches `pattern` (Chrome URL
/// glob) before it reaches the network. The page sees the resource as failed
/// to load, so a stand-in global must be injected for anything the blocked
/// script would have defined.
///
/// With a pattern installed only matching requests are paused, so every
/// paused request is failed. The returned task stays active until the page
/// goes away.
///
/// # Errors
///
/// Returns an error if the Fetch domain cannot be enabled.
pub async fn block_url_pattern(page: &Page, pattern: &str) -> Result<JoinHandle<()>> {
    // Listener first so no early request slips through
    let mut paused = page.event_listener::<EventRequestPaused>().await?;

    let params = EnableParams::builder()
        .pattern(RequestPattern::builder().url_pattern(pattern).build())
        .build();
    page.execute(params).await?;
    log::debug!("Blocking requests matching {pattern}");

    let page = page.clone();
    Ok(tokio::task::spawn(async move {
        while let Some(event) = paused.next().await {
            log::debug!("Aborting blocked request: {}", event.request.url);
            let fail = match FailRequestParams::builder()
                .request_id(event.request_id.clone())
                .error_reason(ErrorReason::BlockedByClient)
                .build()
            {
                Ok(params) => params,
                Err(err) => {
                    log::debug!("Failed to build abort params: {err}");
                    continue;
                }
            };
            if let Err(err) = page.execute(fail).await {
                log::debug!("Failed to abort request: {err}");
            }
        }
    }))
}
