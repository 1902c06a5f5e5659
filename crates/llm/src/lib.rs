// crates/llm/src/lib.rs

use std::time::Duration;

use async_trait::async_trait;
use maitre_core::{MaitreError, MaitreResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

pub mod prompt;

pub use prompt::PromptBuilder;

/// LLM backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "LlmConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "LlmConfig::default_model")]
    pub model: String,
    #[serde(default = "LlmConfig::default_timeout_s")]
    pub timeout_s: u64,
    #[serde(default = "LlmConfig::default_health_timeout_s")]
    pub health_timeout_s: u64,
}

impl LlmConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:11434".to_string()
    }

    fn default_model() -> String {
        "llama2".to_string()
    }

    fn default_timeout_s() -> u64 {
        30
    }

    fn default_health_timeout_s() -> u64 {
        2
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_s)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            timeout_s: Self::default_timeout_s(),
            health_timeout_s: Self::default_health_timeout_s(),
        }
    }
}

/// Reachability of the model backend as seen by the health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    Running,
    Error,
    Offline,
}

/// Text-generation call contract.
///
/// A single bounded round-trip per invocation, no retries. The backend being
/// unreachable or slow is an expected outcome, not an error: it surfaces as
/// `Ok` with an empty string so callers fall through to their deterministic
/// paths. Only a response that arrives but cannot be decoded at all is an
/// `Err`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> MaitreResult<String>;
    fn model(&self) -> &str;
}

/// Client for a locally hosted Ollama instance.
pub struct OllamaClient {
    client: Client,
    config: LlmConfig,
}

impl OllamaClient {
    pub fn new(config: LlmConfig) -> MaitreResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| MaitreError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Short-timeout probe against the model listing endpoint. Never fails;
    /// any transport problem classifies as `Offline`.
    pub async fn probe(&self) -> BackendStatus {
        let url = format!("{}/api/tags", self.config.base_url);

        match self
            .client
            .get(&url)
            .timeout(self.config.health_timeout())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => BackendStatus::Running,
            Ok(response) => {
                warn!("Ollama probe returned status {}", response.status());
                BackendStatus::Error
            }
            Err(err) => {
                debug!("Ollama probe failed: {}", err);
                BackendStatus::Offline
            }
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> MaitreResult<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let payload = json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = match self.client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("Ollama request failed: {}", err);
                return Ok(String::new());
            }
        };

        if !response.status().is_success() {
            warn!("Ollama responded with status {}", response.status());
            return Ok(String::new());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MaitreError::Llm(format!("Malformed Ollama response: {}", e)))?;

        Ok(completion_text(&body))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn completion_text(body: &Value) -> String {
    body.get("response")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_local_ollama() {
        let config = LlmConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.model, "llama2");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.health_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn backend_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(BackendStatus::Running).unwrap(),
            serde_json::json!("running")
        );
        assert_eq!(
            serde_json::to_value(BackendStatus::Offline).unwrap(),
            serde_json::json!("offline")
        );
    }

    #[test]
    fn completion_text_reads_the_response_field() {
        let body = serde_json::json!({"response": "  {\"intent\": \"book_table\"}\n"});
        assert_eq!(completion_text(&body), "{\"intent\": \"book_table\"}");
    }

    #[test]
    fn completion_text_tolerates_missing_field() {
        let body = serde_json::json!({"done": true});
        assert_eq!(completion_text(&body), "");
    }
}
