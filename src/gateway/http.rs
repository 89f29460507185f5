use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::config::ProviderConfig;
use crate::error::VersusError;
use crate::gateway::{PROVIDER_TIMEOUT, Provider, ProviderReply, TokenUsage};

const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// OpenAI-compatible chat-completions gateway (OpenRouter by default).
pub struct HttpProvider {
    client: Client,
    provider: String,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    permits: Semaphore,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl HttpProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            provider: config.provider_name.clone(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: PROVIDER_TIMEOUT,
            permits: Semaphore::new(config.max_concurrent.max(1)),
        }
    }

    /// Override the per-call budget (tests use a short one).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the number of free request permits (for testing).
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    fn timeout_error(&self, start: Instant) -> VersusError {
        VersusError::Timeout(start.elapsed().as_millis() as u64)
    }
}

impl Provider for HttpProvider {
    async fn invoke(&self, model_id: &str, prompt: &str) -> Result<ProviderReply, VersusError> {
        let start = Instant::now();
        let deadline = start + self.timeout;

        let Some(api_key) = self.api_key.as_deref() else {
            return Err(VersusError::AuthFailed {
                provider: self.provider.clone(),
                message: "API key not configured".to_string(),
            });
        };

        // Waiting for a permit counts against the same budget as the call.
        let _permit = tokio::time::timeout(self.timeout, self.permits.acquire())
            .await
            .map_err(|_| self.timeout_error(start))?
            .map_err(|_| VersusError::Other("request semaphore closed".to_string()))?;

        let remaining = deadline
            .checked_duration_since(Instant::now())
            .filter(|d| *d > Duration::from_millis(100))
            .ok_or_else(|| self.timeout_error(start))?;

        let body = serde_json::json!({
            "model": model_id,
            "messages": [{"role": "user", "content": prompt}]
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .timeout(remaining)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.timeout_error(start)
                } else {
                    VersusError::Request(e)
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(VersusError::RateLimited {
                provider: self.provider.clone(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(VersusError::AuthFailed {
                provider: self.provider.clone(),
                message: format!("{status}"),
            });
        }

        // Cap error body reads to MAX_RESPONSE_BYTES to prevent memory exhaustion
        if !status.is_success() {
            let error_bytes = response.bytes().await.unwrap_or_default();
            let truncated = &error_bytes[..error_bytes.len().min(MAX_RESPONSE_BYTES)];
            let text = String::from_utf8_lossy(truncated);
            return Err(VersusError::Upstream {
                provider: self.provider.clone(),
                message: format!("{status}: {text}"),
                status: Some(status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error(start)
            } else {
                VersusError::Upstream {
                    provider: self.provider.clone(),
                    message: format!("failed to read response body: {e}"),
                    status: None,
                }
            }
        })?;

        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(VersusError::Upstream {
                provider: self.provider.clone(),
                message: format!(
                    "response too large: {} bytes (max {MAX_RESPONSE_BYTES})",
                    bytes.len()
                ),
                status: None,
            });
        }

        let completion: ChatCompletion = serde_json::from_slice(&bytes)
            .map_err(|e| VersusError::SchemaParse(format!("failed to parse response: {e}")))?;

        let usage = completion
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| VersusError::Upstream {
                provider: self.provider.clone(),
                message: "empty choices or null content".to_string(),
                status: None,
            })?;

        tracing::debug!(
            model = model_id,
            latency_ms = start.elapsed().as_millis() as u64,
            "provider call completed"
        );

        Ok(ProviderReply { text, usage })
    }
}
