// crates/api/src/handlers.rs

use std::sync::Arc;

use axum::extract::Multipart;
use bytes::Bytes;
use maitre_core::{MaitreError, MaitreResult, ValidationOutcome};
use maitre_llm::OllamaClient;
use maitre_nlu::{booking_reply, Interpreter, RequestValidator};
use maitre_observability::{MetricType, MetricsCollector};
use maitre_stt::SpeechEngine;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{HealthResponse, InterpretRequest, InterpretResponse, TranscribeResponse};

/// Request handlers over the engines constructed at startup. Everything here
/// is injected; nothing is loaded lazily or held in ambient globals.
pub struct ApiHandlers {
    interpreter: Interpreter,
    validator: RequestValidator,
    speech: Arc<Mutex<SpeechEngine>>,
    llm: Arc<OllamaClient>,
    metrics: Arc<MetricsCollector>,
}

impl ApiHandlers {
    pub fn new(
        interpreter: Interpreter,
        validator: RequestValidator,
        speech: Arc<Mutex<SpeechEngine>>,
        llm: Arc<OllamaClient>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            interpreter,
            validator,
            speech,
            llm,
            metrics,
        }
    }

    pub async fn interpret(&self, request: InterpretRequest) -> InterpretResponse {
        debug!(
            turns = request.history.len(),
            locale = %request.locale,
            "Interpreting conversation"
        );

        let interpretation = self.interpreter.interpret(&request.history).await;
        self.metrics.increment(MetricType::InterpretRequests);

        InterpretResponse {
            reply: booking_reply().to_string(),
            intent: interpretation.intent,
            slots: interpretation.slots,
        }
    }

    pub async fn transcribe(&self, multipart: Multipart) -> MaitreResult<TranscribeResponse> {
        let audio = read_audio_field(multipart).await;

        let transcript = match audio {
            Ok(audio) => self.speech.lock().await.transcribe(&audio).await,
            Err(err) => Err(err),
        };

        match transcript {
            Ok(transcript) => {
                self.metrics.increment(MetricType::TranscriptionsCompleted);
                Ok(TranscribeResponse {
                    text: transcript.full_text,
                    language: transcript.language,
                    confidence: transcript.language_confidence,
                })
            }
            Err(err) => {
                self.metrics.increment(MetricType::TranscriptionsFailed);
                Err(err)
            }
        }
    }

    pub async fn validate(&self, text: &str) -> ValidationOutcome {
        let outcome = self.validator.validate(text).await;

        self.metrics.increment(if outcome.valid {
            MetricType::ValidationsAccepted
        } else {
            MetricType::ValidationsRejected
        });

        outcome
    }

    pub async fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "online",
            ollama: self.llm.probe().await,
            model: self.llm.config().model.clone(),
        }
    }

    pub fn metrics_text(&self) -> MaitreResult<String> {
        self.metrics.render()
    }
}

/// Pulls the uploaded audio out of the multipart body. The bytes pass
/// through to the transcription worker untouched.
async fn read_audio_field(mut multipart: Multipart) -> MaitreResult<Bytes> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MaitreError::Stt(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() == Some("file") {
            return field
                .bytes()
                .await
                .map_err(|e| MaitreError::Stt(format!("Failed to read audio payload: {}", e)));
        }
    }

    Err(MaitreError::Stt("No audio file provided".to_string()))
}
