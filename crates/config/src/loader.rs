// crates/config/src/loader.rs

use std::path::Path;

use maitre_core::{MaitreError, MaitreResult};

use crate::MaitreConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_from_file(path: &Path) -> MaitreResult<MaitreConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MaitreError::Config(format!("Failed to read config: {}", e)))?;

        let config: MaitreConfig = toml::from_str(&content)
            .map_err(|e| MaitreError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    pub fn save_to_file(path: &Path, config: &MaitreConfig) -> MaitreResult<()> {
        let content = toml::to_string_pretty(config)
            .map_err(|e| MaitreError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| MaitreError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Environment variables override whatever the file (or the defaults)
    /// provided.
    pub fn apply_env_overrides(config: &mut MaitreConfig) -> MaitreResult<()> {
        if let Ok(port) = std::env::var("MAITRE_API_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| MaitreError::Config("Invalid API port".to_string()))?;
        }
        if let Ok(url) = std::env::var("MAITRE_LLM_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("MAITRE_LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(language) = std::env::var("MAITRE_STT_LANGUAGE") {
            config.stt.language = language;
        }

        Ok(())
    }

    /// Loads the config file when one exists, falls back to defaults
    /// otherwise, and applies env overrides either way. Runs before the
    /// logging subscriber is installed, so it stays silent.
    pub fn load(path: Option<impl AsRef<Path>>) -> MaitreResult<MaitreConfig> {
        let mut config = match path {
            Some(path) if path.as_ref().exists() => Self::load_from_file(path.as_ref())?,
            _ => MaitreConfig::default(),
        };

        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }
}
