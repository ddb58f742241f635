//! Webhook hook: POSTs each transcription as JSON to a configured URL.

use crate::error::{HearsayError, Result};
use crate::hooks::{Hook, HookContext, HookKind, HookResult};
use async_trait::async_trait;
use std::time::Duration;

/// Issues `POST <url>` with body
/// `{"text": …, "confidence": …, "chunk_index": …, "timestamp": …}`.
///
/// Success is any 2xx response within the timeout. Non-2xx responses and
/// network failures become failed `HookResult`s carrying the status or error.
pub struct WebhookHook {
    name: String,
    url: String,
    headers: Vec<(String, String)>,
    timeout: Duration,
    client: reqwest::Client,
}

impl WebhookHook {
    pub fn new(
        name: String,
        url: String,
        headers: Vec<(String, String)>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HearsayError::HookConfig {
                hook: name.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            name,
            url,
            headers,
            timeout,
            client,
        })
    }
}

#[async_trait]
impl Hook for WebhookHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> HookKind {
        HookKind::Webhook
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn execute(&self, ctx: &HookContext) -> HookResult {
        let payload = serde_json::json!({
            "text": ctx.text(),
            "confidence": ctx.confidence(),
            "chunk_index": ctx.chunk_index,
            "timestamp": ctx.timestamp_secs,
        });

        let mut request = self.client.post(&self.url).json(&payload);
        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return HookResult::failure(format!("webhook request failed: {}", e)),
        };

        let status = response.status();
        if status.is_success() {
            HookResult::ok(format!("webhook returned {}", status.as_u16()))
        } else {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            if body.is_empty() {
                HookResult::failure(format!("webhook returned {}", status.as_u16()))
            } else {
                let shortened: String = body.chars().take(200).collect();
                HookResult::failure(format!(
                    "webhook returned {}: {}",
                    status.as_u16(),
                    shortened
                ))
            }
        }
    }
}
