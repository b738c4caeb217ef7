//! Capability-scoped stand-in for the remote document-database client.
//!
//! The real page loads the Firestore SDK from a CDN; that load is aborted by
//! the interceptor and this mock supplies a same-named global before any page
//! script runs. Every query returns the same canned values regardless of
//! arguments; the only side effects are a console log and an artificial delay
//! on the `update` path.

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use serde_json::{Value, json};
use std::time::Duration;

// Externalized mock script template (editable JS)
const FIRESTORE_MOCK_JS: &str = include_str!("js/firestore_mock.js");

/// Message the mock logs when its `update` path runs. Tests count this to
/// verify the save control reached the backend exactly once.
pub const UPDATE_LOG_MESSAGE: &str = "Mock update called";

/// Simulated latency of the `update` call.
pub const UPDATE_DELAY: Duration = Duration::from_millis(2000);

/// In-memory document store served to the page, built fresh per run.
#[derive(Debug, Clone)]
pub struct MockFirestore {
    /// Id of the single project record every collection query returns.
    pub project_id: String,
    /// Display name stored in that record's `config`.
    pub project_name: String,
    /// Canned document returned by every `doc(id).get()`.
    pub document: Value,
    /// How long `update` waits before resolving. `get` resolves immediately.
    pub update_delay: Duration,
}

impl Default for MockFirestore {
    fn default() -> Self {
        Self {
            project_id: "test-project".to_string(),
            project_name: "Test Project".to_string(),
            document: json!({
                "userStories": [],
                "sprintData": [{"Sprint": 1, "Theme": "Theme"}],
            }),
            update_delay: UPDATE_DELAY,
        }
    }
}

impl MockFirestore {
    /// Renders the script that defines the `window.firebase` global.
    ///
    /// Data literals are serialized through `serde_json`, so the rendered
    /// script is valid JS for any field values.
    pub fn init_script(&self) -> String {
        let project_record = json!({ "config": { "name": self.project_name } });
        FIRESTORE_MOCK_JS
            .replace("__PROJECT_ID__", &Value::from(self.project_id.as_str()).to_string())
            .replace("__PROJECT_RECORD__", &project_record.to_string())
            .replace("__DOCUMENT__", &self.document.to_string())
            .replace("__UPDATE_LOG__", &Value::from(UPDATE_LOG_MESSAGE).to_string())
            .replace("__UPDATE_DELAY_MS__", &self.update_delay.as_millis().to_string())
    }

    /// Registers the mock so it executes before any page script on every
    /// subsequent navigation and reload.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be registered.
    pub async fn install(&self, page: &Page) -> Result<()> {
        let params = AddScriptToEvaluateOnNewDocumentParams::new(self.init_script());
        page.execute(params).await?;
        log::debug!("Installed Firestore mock for project {}", self.project_id);
        Ok(())
    }
}
