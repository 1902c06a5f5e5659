// crates/api/src/lib.rs

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use maitre_core::{BookingSlots, ConversationTurn, Intent, MaitreError, ValidationOutcome};
use maitre_llm::BackendStatus;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub mod handlers;

use handlers::ApiHandlers;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            cors_enabled: true,
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiConfig,
    handlers: Arc<ApiHandlers>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, handlers: Arc<ApiHandlers>) -> Self {
        Self { config, handlers }
    }

    pub async fn serve(self) -> maitre_core::MaitreResult<()> {
        let app = self.create_router();

        let addr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| MaitreError::Network(format!("Invalid address: {}", e)))?;

        info!("API server listening on {}", addr);

        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .await
            .map_err(|e| MaitreError::Network(e.to_string()))?;

        Ok(())
    }

    fn create_router(&self) -> Router {
        let mut app = Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/interpret", post(interpret_handler))
            .route("/transcribe", post(transcribe_handler))
            .route("/validate_request", post(validate_handler))
            .with_state(self.handlers.clone());

        if self.config.cors_enabled {
            app = app.layer(CorsLayer::permissive());
        }

        app
    }
}

#[derive(Debug, Deserialize)]
pub struct InterpretRequest {
    pub history: Vec<ConversationTurn>,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en".to_string()
}

#[derive(Debug, Serialize)]
pub struct InterpretResponse {
    pub reply: String,
    pub intent: Intent,
    pub slots: BookingSlots,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
    pub language: String,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ollama: BackendStatus,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Understanding failures never surface as HTTP errors; the resolver always
// produces a result.
async fn interpret_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Json(request): Json<InterpretRequest>,
) -> Json<InterpretResponse> {
    Json(handlers.interpret(request).await)
}

// Transcription has no fallback transcript, so failures are explicit.
async fn transcribe_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    multipart: Multipart,
) -> Result<Json<TranscribeResponse>, (StatusCode, Json<ErrorResponse>)> {
    handlers.transcribe(multipart).await.map(Json).map_err(|err| {
        error!("Transcription failed: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Transcription failed: {}", err),
            }),
        )
    })
}

// Fail-open: validation always answers 200.
async fn validate_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidationOutcome> {
    Json(handlers.validate(&request.text).await)
}

async fn health_handler(State(handlers): State<Arc<ApiHandlers>>) -> Json<HealthResponse> {
    Json(handlers.health().await)
}

async fn metrics_handler(State(handlers): State<Arc<ApiHandlers>>) -> impl IntoResponse {
    match handlers.metrics_text() {
        Ok(body) => (StatusCode::OK, body),
        Err(err) => {
            error!("Failed to render metrics: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpret_request_defaults_the_locale() {
        let request: InterpretRequest = serde_json::from_str(
            r#"{"history": [{"role": "user", "content": "book a table"}]}"#,
        )
        .unwrap();

        assert_eq!(request.locale, "en");
        assert_eq!(request.history.len(), 1);
    }

    #[test]
    fn validate_request_tolerates_a_missing_text_field() {
        let request: ValidateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.text, "");
    }

    #[test]
    fn health_response_uses_the_original_wire_keys() {
        let response = HealthResponse {
            status: "online",
            ollama: BackendStatus::Running,
            model: "llama2".to_string(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "online");
        assert_eq!(value["ollama"], "running");
        assert_eq!(value["model"], "llama2");
    }
}
