//! Shared test support: fixture server, console capture, chrome gating.

#![allow(dead_code)]

use anyhow::Result;
use axum::Router;
use axum::response::Html;
use axum::routing::get;
use chromiumoxide::cdp::js_protocol::runtime;
use chromiumoxide::page::Page;
use futures::StreamExt as _;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Skips the calling test when no Chrome/Chromium executable is available,
/// so the suite passes on machines without a browser.
macro_rules! skip_if_no_chrome {
    () => {
        if verify_ux::chrome::find_chrome_executable().is_err() {
            eprintln!("Skipping test: no Chrome/Chromium executable found");
            return;
        }
    };
}

pub(crate) use skip_if_no_chrome;

/// Ephemeral-port static server for one fixture page.
pub struct FixtureServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl FixtureServer {
    /// Serves `html` at `/index.html` on an ephemeral localhost port.
    pub async fn serve(html: &'static str) -> Result<Self> {
        let app = Router::new().route("/index.html", get(move || async move { Html(html) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// URL of the served page.
    pub fn url(&self) -> String {
        format!("http://{}/index.html", self.addr)
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.task.abort();
    }
}

/// Captures page console output into a shared buffer for assertions.
pub async fn collect_console(page: &Page) -> Result<Arc<Mutex<Vec<String>>>> {
    page.execute(runtime::EnableParams::default()).await?;
    let mut events = page.event_listener::<runtime::EventConsoleApiCalled>().await?;
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buffer);
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let text = event
                .args
                .iter()
                .filter_map(|arg| arg.value.as_ref())
                .map(|value| match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            if let Ok(mut lines) = sink.lock() {
                lines.push(text);
            }
        }
    });
    Ok(buffer)
}
