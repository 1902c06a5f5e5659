// crates/config/src/lib.rs

use serde::{Deserialize, Serialize};

use maitre_llm::LlmConfig;
use maitre_stt::SpeechConfig;

pub mod loader;
pub mod validator;

pub use loader::ConfigLoader;
pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaitreConfig {
    pub app: AppSettings,
    pub llm: LlmConfig,
    pub stt: SpeechConfig,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            cors_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_the_local_service() {
        let config = MaitreConfig::default();

        assert_eq!(config.server.port, 5001);
        assert_eq!(config.llm.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.llm.model, "llama2");
        assert_eq!(config.stt.language, "en");
        assert!(config.server.cors_enabled);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: MaitreConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [llm]
            model = "llama3"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.timeout_s, 30);
    }
}
