// crates/config/src/validator.rs

use maitre_core::{MaitreError, MaitreResult};
use tracing::warn;

use crate::MaitreConfig;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &MaitreConfig) -> MaitreResult<()> {
        // Server settings
        if config.server.port == 0 {
            return Err(MaitreError::Config("Invalid API port".to_string()));
        }

        // LLM settings
        if config.llm.model.trim().is_empty() {
            return Err(MaitreError::Config("LLM model must not be empty".to_string()));
        }
        if config.llm.timeout_s == 0 {
            return Err(MaitreError::Config(
                "LLM timeout must be greater than zero".to_string(),
            ));
        }
        if config.llm.health_timeout_s == 0 {
            return Err(MaitreError::Config(
                "LLM health timeout must be greater than zero".to_string(),
            ));
        }

        // STT settings
        config.stt.validate()?;
        if !config.stt.model.model_path.exists() {
            warn!(
                "STT model path does not exist: {:?}",
                config.stt.model.model_path
            );
        }
        if config.stt.request_timeout_ms == 0 {
            return Err(MaitreError::Config(
                "STT request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ConfigValidator::validate(&MaitreConfig::default()).unwrap();
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = MaitreConfig::default();
        config.server.port = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn empty_model_name_is_rejected() {
        let mut config = MaitreConfig::default();
        config.llm.model = "  ".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn unsupported_stt_language_is_rejected() {
        let mut config = MaitreConfig::default();
        config.stt.language = "klingon".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
