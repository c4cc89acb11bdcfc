use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Tool descriptor exposed to the content-strategist agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserTool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One WebDriver session per process, owned by `AppState` and created on
/// first use. The `OnceCell` serializes concurrent first-time callers, so
/// two racing requests can never start two browsers. When the session cannot
/// be established the adapter degrades to an empty tool list; failures are
/// logged, never surfaced.
pub struct BrowserAutomation {
    client: Client,
    webdriver_url: Option<String>,
    session: OnceCell<Option<String>>,
}

impl BrowserAutomation {
    pub fn new(webdriver_url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            webdriver_url,
            session: OnceCell::new(),
        }
    }

    pub async fn tools(&self) -> Vec<BrowserTool> {
        match self.session_id().await {
            Some(_) => tool_catalog(),
            None => Vec::new(),
        }
    }

    async fn session_id(&self) -> Option<String> {
        self.session
            .get_or_init(|| async {
                let base = self.webdriver_url.as_deref()?;
                match self.start_session(base).await {
                    Ok(id) => {
                        info!(session_id = %id, "browser session started");
                        Some(id)
                    }
                    Err(err) => {
                        warn!(error = %err, "browser session unavailable, exposing no tools");
                        None
                    }
                }
            })
            .await
            .clone()
    }

    async fn start_session(&self, base: &str) -> Result<String> {
        // Visible window: the agent drives a browser the operator can watch.
        let payload = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": ["--start-maximized"]
                    }
                }
            }
        });

        let response = self
            .client
            .post(format!("{base}/session"))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        body["value"]["sessionId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("webdriver response missing session id"))
    }
}

fn tool_catalog() -> Vec<BrowserTool> {
    vec![
        BrowserTool {
            name: "navigate".to_string(),
            description: "Open a URL in the browser".to_string(),
            parameters: json!({
                "type": "object",
                "properties": { "url": { "type": "string" } },
                "required": ["url"]
            }),
        },
        BrowserTool {
            name: "click".to_string(),
            description: "Click the element matching a CSS selector".to_string(),
            parameters: json!({
                "type": "object",
                "properties": { "selector": { "type": "string" } },
                "required": ["selector"]
            }),
        },
        BrowserTool {
            name: "type_text".to_string(),
            description: "Type text into the element matching a CSS selector".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "selector": { "type": "string" },
                    "text": { "type": "string" }
                },
                "required": ["selector", "text"]
            }),
        },
        BrowserTool {
            name: "extract_text".to_string(),
            description: "Read the visible text of the current page".to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        },
        BrowserTool {
            name: "screenshot".to_string(),
            description: "Capture a screenshot of the current page".to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        },
    ]
}
