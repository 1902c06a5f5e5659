// src/app.rs

use std::sync::Arc;

use maitre_api::{ApiConfig, ApiServer};
use maitre_api::handlers::ApiHandlers;
use maitre_config::MaitreConfig;
use maitre_core::{MaitreError, MaitreResult};
use maitre_llm::OllamaClient;
use maitre_nlu::{Interpreter, RequestValidator};
use maitre_observability::MetricsCollector;
use maitre_stt::SpeechEngine;
use tokio::signal;
use tokio::sync::Mutex;
use tracing::{error, info};

pub struct MaitreApp {
    config: MaitreConfig,
    api_server: Option<ApiServer>,
    speech: Arc<Mutex<SpeechEngine>>,
    metrics: Arc<MetricsCollector>,
}

impl MaitreApp {
    pub async fn new(config: MaitreConfig) -> MaitreResult<Self> {
        info!("Initializing Maitre components...");

        let metrics = Arc::new(MetricsCollector::new());

        let llm = Arc::new(OllamaClient::new(config.llm.clone())?);

        // The Whisper worker loads once, before serving begins, and lives
        // for the process lifetime. Handlers receive the handle; nothing is
        // loaded lazily per request.
        info!("Loading Whisper model (this may take a moment on first run)...");
        let speech = Arc::new(Mutex::new(SpeechEngine::new(config.stt.clone()).await?));
        info!("Whisper model loaded");

        let interpreter = Interpreter::new(llm.clone());
        let validator = RequestValidator::new(llm.clone());

        let handlers = Arc::new(ApiHandlers::new(
            interpreter,
            validator,
            speech.clone(),
            llm.clone(),
            metrics.clone(),
        ));

        let api_config = ApiConfig {
            host: config.server.host.clone(),
            port: config.server.port,
            cors_enabled: config.server.cors_enabled,
        };
        let api_server = Some(ApiServer::new(api_config, handlers));

        Ok(Self {
            config,
            api_server,
            speech,
            metrics,
        })
    }

    pub async fn run(mut self) -> MaitreResult<()> {
        info!(
            "Serving on {}:{} (model backend: {})",
            self.config.server.host, self.config.server.port, self.config.llm.base_url
        );

        if let Some(server) = self.api_server.take() {
            tokio::spawn(async move {
                if let Err(e) = server.serve().await {
                    error!("API server error: {}", e);
                }
            });
        }

        self.wait_for_shutdown().await?;

        info!(
            "Shutting down after {}s uptime",
            self.metrics.uptime_seconds()
        );
        self.speech.lock().await.shutdown();

        Ok(())
    }

    async fn wait_for_shutdown(&self) -> MaitreResult<()> {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                Ok(())
            }
            Err(e) => {
                error!("Failed to listen for shutdown signal: {}", e);
                Err(MaitreError::Unknown(e.to_string()))
            }
        }
    }
}
