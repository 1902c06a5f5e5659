// crates/stt/src/lib.rs

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use maitre_core::{MaitreError, MaitreResult, Transcript, TranscriptSegment};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{sleep, timeout};
use tracing::warn;

const SUPPORTED_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "as", "az", "be", "bg", "bn", "bo", "br", "bs", "ca", "cs", "cy", "da", "de",
    "el", "en", "es", "et", "fa", "fi", "fr", "fy", "ga", "gd", "gl", "gu", "haw", "he", "hi",
    "hr", "ht", "hu", "hy", "id", "is", "it", "ja", "jv", "ka", "kk", "km", "kn", "ko", "la", "lb",
    "ln", "lo", "lt", "lv", "mg", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "ne", "nl", "nn",
    "no", "oc", "pa", "pl", "ps", "pt", "ro", "ru", "sa", "sd", "si", "sk", "sl", "sn", "so", "sq",
    "sr", "sv", "sw", "ta", "te", "th", "tl", "tr", "uk", "ur", "uz", "vi", "yi", "yo", "zh",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperModelConfig {
    pub model_path: PathBuf,
    #[serde(default = "WhisperModelConfig::default_device")]
    pub device: String,
    #[serde(default = "WhisperModelConfig::default_compute_type")]
    pub compute_type: String,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl WhisperModelConfig {
    fn default_device() -> String {
        "cpu".to_string()
    }

    fn default_compute_type() -> String {
        "int8".to_string()
    }
}

impl Default for WhisperModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/whisper-base"),
            device: Self::default_device(),
            compute_type: Self::default_compute_type(),
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonWorkerConfig {
    #[serde(default = "PythonWorkerConfig::default_executable")]
    pub executable: PathBuf,
    #[serde(default = "PythonWorkerConfig::default_script")]
    pub script: PathBuf,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub env: Vec<(String, String)>,
}

impl PythonWorkerConfig {
    fn default_executable() -> PathBuf {
        PathBuf::from("python3")
    }

    fn default_script() -> PathBuf {
        PathBuf::from("scripts/whisper_worker.py")
    }
}

impl Default for PythonWorkerConfig {
    fn default() -> Self {
        Self {
            executable: Self::default_executable(),
            script: Self::default_script(),
            extra_args: Vec::new(),
            env: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeechBackendConfig {
    Python(PythonWorkerConfig),
    Native,
}

impl Default for SpeechBackendConfig {
    fn default() -> Self {
        Self::Python(PythonWorkerConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "SpeechConfig::default_language")]
    pub language: String,
    #[serde(default)]
    pub model: WhisperModelConfig,
    #[serde(default)]
    pub backend: SpeechBackendConfig,
    #[serde(default = "SpeechConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "SpeechConfig::default_initialization_timeout_ms")]
    pub initialization_timeout_ms: u64,
    #[serde(default = "SpeechConfig::default_retry_attempts")]
    pub retry_attempts: usize,
    #[serde(default = "SpeechConfig::default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl SpeechConfig {
    fn default_language() -> String {
        "en".to_string()
    }

    fn default_request_timeout_ms() -> u64 {
        30_000
    }

    fn default_initialization_timeout_ms() -> u64 {
        120_000
    }

    fn default_retry_attempts() -> usize {
        2
    }

    fn default_retry_backoff_ms() -> u64 {
        500
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn initialization_timeout(&self) -> Duration {
        Duration::from_millis(self.initialization_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn validate(&self) -> MaitreResult<()> {
        if self.language.trim().is_empty() {
            return Err(MaitreError::Config(
                "Whisper language must not be empty".to_string(),
            ));
        }

        if !SUPPORTED_LANGUAGES
            .iter()
            .any(|lang| lang.eq_ignore_ascii_case(&self.language))
        {
            return Err(MaitreError::Config(format!(
                "Unsupported Whisper language: {}",
                self.language
            )));
        }

        Ok(())
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: Self::default_language(),
            model: WhisperModelConfig::default(),
            backend: SpeechBackendConfig::default(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            initialization_timeout_ms: Self::default_initialization_timeout_ms(),
            retry_attempts: Self::default_retry_attempts(),
            retry_backoff_ms: Self::default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpeechMetrics {
    pub total_processed: u64,
    pub total_errors: u64,
    pub total_timeouts: u64,
    pub total_retries: u64,
    pub total_restarts: u64,
    pub cumulative_processing_time: Duration,
    pub last_processing_time: Option<Duration>,
}

impl SpeechMetrics {
    pub fn average_processing_time(&self) -> Option<Duration> {
        if self.total_processed == 0 {
            return None;
        }

        Some(self.cumulative_processing_time / self.total_processed as u32)
    }
}

type BackendHandle = Box<dyn SpeechBackend + Send>;

/// Supervised speech-to-text engine over an out-of-process Whisper worker.
///
/// Constructed once before serving begins and handed to the HTTP handlers;
/// the worker lives for the process lifetime. Transcription failures are
/// surfaced to the caller — there is no fallback transcript.
pub struct SpeechEngine {
    config: SpeechConfig,
    backend: BackendHandle,
    metrics: SpeechMetrics,
}

impl SpeechEngine {
    pub async fn new(config: SpeechConfig) -> MaitreResult<Self> {
        config.validate()?;

        let mut backend: BackendHandle = match config.backend.clone() {
            SpeechBackendConfig::Python(python) => {
                Box::new(PythonWhisperWorker::new(python)) as BackendHandle
            }
            SpeechBackendConfig::Native => Box::new(NativeWhisper::default()) as BackendHandle,
        };

        timeout(config.initialization_timeout(), backend.initialize(&config))
            .await
            .map_err(|_| MaitreError::Stt("Whisper backend initialization timed out".to_string()))??;

        Ok(Self {
            config,
            backend,
            metrics: SpeechMetrics::default(),
        })
    }

    #[cfg(test)]
    async fn with_backend(config: SpeechConfig, mut backend: BackendHandle) -> MaitreResult<Self> {
        config.validate()?;
        backend.initialize(&config).await?;
        Ok(Self {
            config,
            backend,
            metrics: SpeechMetrics::default(),
        })
    }

    /// Transcribes one uploaded audio payload (any container format the
    /// worker's decoder accepts — the bytes pass through untouched).
    pub async fn transcribe(&mut self, audio: &[u8]) -> MaitreResult<Transcript> {
        let mut attempt = 0usize;

        loop {
            let start = Instant::now();
            let response = timeout(
                self.config.request_timeout(),
                self.backend.transcribe(audio, &self.config),
            )
            .await;

            match response {
                Ok(Ok(result)) => {
                    let elapsed = start.elapsed();
                    let transcript = self.build_transcript(result, elapsed);
                    self.metrics.total_processed += 1;
                    self.metrics.last_processing_time = Some(elapsed);
                    self.metrics.cumulative_processing_time += elapsed;
                    self.metrics.total_retries += attempt as u64;
                    return Ok(transcript);
                }
                Ok(Err(err)) => {
                    self.metrics.total_errors += 1;
                    if attempt >= self.config.retry_attempts {
                        self.metrics.total_retries += attempt as u64;
                        return Err(err);
                    }
                    attempt += 1;
                    self.restart_backend().await?;
                    sleep(self.config.retry_backoff()).await;
                }
                Err(_) => {
                    self.metrics.total_timeouts += 1;
                    if attempt >= self.config.retry_attempts {
                        self.metrics.total_retries += attempt as u64;
                        return Err(MaitreError::Stt(
                            "Whisper transcription timed out".to_string(),
                        ));
                    }
                    attempt += 1;
                    self.restart_backend().await?;
                    sleep(self.config.retry_backoff()).await;
                }
            }
        }
    }

    pub fn get_metrics(&self) -> SpeechMetrics {
        self.metrics.clone()
    }

    pub fn shutdown(&mut self) {
        self.backend.shutdown();
    }

    async fn restart_backend(&mut self) -> MaitreResult<()> {
        self.metrics.total_restarts += 1;
        warn!("Restarting Whisper backend");
        self.backend.restart(&self.config).await.map_err(|err| {
            self.metrics.total_errors += 1;
            err
        })
    }

    fn build_transcript(&self, response: WorkerResponse, elapsed: Duration) -> Transcript {
        let segments: Vec<TranscriptSegment> = response
            .segments
            .into_iter()
            .map(|segment| TranscriptSegment {
                start: segment.start,
                end: segment.end,
                text: segment.text,
            })
            .collect();

        let full_text = segments
            .iter()
            .map(|segment| segment.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Transcript {
            id: uuid::Uuid::new_v4(),
            language: response
                .language
                .unwrap_or_else(|| self.config.language.clone()),
            language_confidence: response.language_probability.unwrap_or(0.0).clamp(0.0, 1.0),
            segments,
            full_text,
            processing_time: elapsed,
        }
    }
}

#[async_trait]
trait SpeechBackend {
    async fn initialize(&mut self, config: &SpeechConfig) -> MaitreResult<()>;
    async fn transcribe(&mut self, audio: &[u8], config: &SpeechConfig)
        -> MaitreResult<WorkerResponse>;
    async fn restart(&mut self, config: &SpeechConfig) -> MaitreResult<()> {
        self.shutdown();
        self.initialize(config).await
    }
    fn shutdown(&mut self);
}

/// Whisper worker process speaking a length-prefixed byte protocol on
/// stdin and one JSON line per result on stdout.
struct PythonWhisperWorker {
    config: PythonWorkerConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
}

impl PythonWhisperWorker {
    fn new(config: PythonWorkerConfig) -> Self {
        Self {
            config,
            child: None,
            stdin: None,
            stdout: None,
        }
    }

    async fn spawn_child(&mut self, config: &SpeechConfig) -> MaitreResult<()> {
        if let Some(cache_dir) = config.model.cache_dir.as_ref() {
            fs::create_dir_all(cache_dir)
                .await
                .map_err(|err| MaitreError::Stt(err.to_string()))?;
        }

        let mut command = Command::new(&self.config.executable);
        command
            .arg("-u")
            .arg(&self.config.script)
            .arg("--model-path")
            .arg(config.model.model_path.to_string_lossy().to_string())
            .arg("--language")
            .arg(&config.language)
            .arg("--compute-type")
            .arg(&config.model.compute_type)
            .arg("--device")
            .arg(&config.model.device)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        for extra in &self.config.extra_args {
            command.arg(extra);
        }

        if let Some(cache_dir) = config.model.cache_dir.as_ref() {
            command.env("CT2_CACHE_DIR", cache_dir);
        }

        for (key, value) in &self.config.env {
            command.env(key, value);
        }

        let mut child = command
            .spawn()
            .map_err(|err| MaitreError::Stt(format!("Failed to spawn Whisper worker: {err}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MaitreError::Stt("Whisper worker stdin unavailable".to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MaitreError::Stt("Whisper worker stdout unavailable".to_string()))?;

        self.stdin = Some(stdin);
        self.stdout = Some(BufReader::new(stdout));
        self.child = Some(child);
        Ok(())
    }

    async fn ensure_running(&mut self, config: &SpeechConfig) -> MaitreResult<()> {
        let should_restart = if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(Some(_)) => true,
                Ok(None) => false,
                Err(err) => {
                    return Err(MaitreError::Stt(format!(
                        "Failed to poll Whisper worker: {err}"
                    )))
                }
            }
        } else {
            true
        };

        if should_restart {
            self.shutdown();
            self.spawn_child(config).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl SpeechBackend for PythonWhisperWorker {
    async fn initialize(&mut self, config: &SpeechConfig) -> MaitreResult<()> {
        self.spawn_child(config).await
    }

    async fn transcribe(
        &mut self,
        audio: &[u8],
        config: &SpeechConfig,
    ) -> MaitreResult<WorkerResponse> {
        self.ensure_running(config).await?;

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MaitreError::Stt("Whisper worker stdin not available".to_string()))?;
        let stdout = self
            .stdout
            .as_mut()
            .ok_or_else(|| MaitreError::Stt("Whisper worker stdout not available".to_string()))?;

        let byte_count = audio.len() as u32;
        stdin
            .write_all(&byte_count.to_le_bytes())
            .await
            .map_err(|err| MaitreError::Stt(format!("Failed to write payload size: {err}")))?;
        stdin
            .write_all(audio)
            .await
            .map_err(|err| MaitreError::Stt(format!("Failed to write audio payload: {err}")))?;
        stdin
            .flush()
            .await
            .map_err(|err| MaitreError::Stt(format!("Failed to flush worker stdin: {err}")))?;

        let mut response = String::new();
        let read = stdout
            .read_line(&mut response)
            .await
            .map_err(|err| MaitreError::Stt(format!("Failed to read worker response: {err}")))?;

        if read == 0 {
            return Err(MaitreError::Stt("Whisper worker closed stdout".to_string()));
        }

        let trimmed = response.trim();
        if trimmed.is_empty() {
            return Err(MaitreError::Stt(
                "Whisper worker returned empty response".to_string(),
            ));
        }

        let parsed: WorkerResponse = serde_json::from_str(trimmed)?;
        Ok(parsed)
    }

    fn shutdown(&mut self) {
        self.stdin.take();
        self.stdout.take();

        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
        }
    }
}

impl Drop for PythonWhisperWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Default)]
struct NativeWhisper;

#[async_trait]
impl SpeechBackend for NativeWhisper {
    async fn initialize(&mut self, _config: &SpeechConfig) -> MaitreResult<()> {
        Err(MaitreError::Stt(
            "Native Whisper backend is not implemented".to_string(),
        ))
    }

    async fn transcribe(
        &mut self,
        _audio: &[u8],
        _config: &SpeechConfig,
    ) -> MaitreResult<WorkerResponse> {
        Err(MaitreError::Stt(
            "Native Whisper backend is not implemented".to_string(),
        ))
    }

    fn shutdown(&mut self) {}
}

#[derive(Debug, Deserialize)]
struct WorkerResponse {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    language_probability: Option<f32>,
    #[serde(default)]
    segments: Vec<WorkerSegment>,
}

#[derive(Debug, Deserialize)]
struct WorkerSegment {
    start: f64,
    end: f64,
    text: String,
}
