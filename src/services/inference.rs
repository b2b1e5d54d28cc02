// Remote Inference Service
// Calls hosted classification models and normalizes their labels into a realness score

use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::AnalysisSubject;
use crate::services::config_store::EngineConfig;

/// Score reported when a model answers but none of its labels are recognized.
pub const UNCERTAIN_SCORE: i32 = 50;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("API credential not provided")]
    MissingCredential,
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Whole label tokens that mean "real/human" under the authenticity schema.
const AUTHENTIC_TOKENS: &[&str] = &["real", "realism", "human", "authentic"];

/// How a model's labels map onto "this content is real/human".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSchema {
    /// Image authenticity and AI-authorship detectors.
    Authenticity,
    /// Fake-news style classifiers where `LABEL_1` is the reliable class.
    News,
}

impl LabelSchema {
    pub fn matches(&self, label: &str) -> bool {
        let label = label.trim().to_lowercase();
        let mut tokens = label.split(|c: char| !c.is_alphanumeric());
        match self {
            Self::Authenticity => tokens.any(|token| AUTHENTIC_TOKENS.contains(&token)),
            Self::News => label == "label_1" || tokens.any(|token| token == "real"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferencePayload {
    /// Sent as `{"inputs": ...}`.
    Text(String),
    Binary { bytes: Vec<u8>, content_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    pub url: String,
    pub credential: String,
    pub payload: InferencePayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one inference request over the wire.
pub trait InferenceTransport: Send + Sync + 'static {
    fn post(
        &self,
        request: &InferenceRequest,
    ) -> impl Future<Output = Result<TransportResponse, InferenceError>> + Send;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

impl InferenceTransport for HttpTransport {
    async fn post(&self, request: &InferenceRequest) -> Result<TransportResponse, InferenceError> {
        let builder = self
            .client
            .post(&request.url)
            .header("Authorization", format!("Bearer {}", request.credential));

        let builder = match &request.payload {
            InferencePayload::Text(text) => builder.json(&serde_json::json!({ "inputs": text })),
            InferencePayload::Binary { bytes, content_type } => builder
                .header("Content-Type", content_type.as_str())
                .body(bytes.clone()),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(TransportResponse { status, body })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelPayload {
    Flat(Vec<LabelScore>),
    Nested(Vec<Vec<LabelScore>>),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    estimated_time: Option<f64>,
}

pub struct RemoteInferenceClient<T: InferenceTransport = HttpTransport> {
    transport: T,
    base_url: String,
    retry_delay: Duration,
    text_char_budget: usize,
}

impl RemoteInferenceClient<HttpTransport> {
    pub fn new(config: &EngineConfig) -> Self {
        let transport = HttpTransport::new(Duration::from_secs(config.request_timeout_secs));
        Self::with_transport(transport, config)
    }
}

impl<T: InferenceTransport> RemoteInferenceClient<T> {
    pub fn with_transport(transport: T, config: &EngineConfig) -> Self {
        Self {
            transport,
            base_url: config.inference_base_url.trim_end_matches('/').to_string(),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            text_char_budget: config.text_char_budget,
        }
    }

    /// Override the wait between "model loading" retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_request(
        &self,
        subject: &AnalysisSubject,
        model: &str,
        credential: &str,
    ) -> InferenceRequest {
        let payload = match subject {
            AnalysisSubject::Text(t) => {
                InferencePayload::Text(t.content.chars().take(self.text_char_budget).collect())
            }
            AnalysisSubject::Image(img) => InferencePayload::Binary {
                bytes: img.bytes.clone(),
                content_type: if img.declared_mime_type.is_empty() {
                    "application/octet-stream".to_string()
                } else {
                    img.declared_mime_type.clone()
                },
            },
        };
        InferenceRequest {
            url: format!("{}/{}", self.base_url, model),
            credential: credential.to_string(),
            payload,
        }
    }

    /// Run `model` on the subject and return its 0-100 realness score.
    ///
    /// A "loading" error from the service waits `retry_delay` and resends the
    /// identical request. There is no cap on these retries; callers that need a
    /// deadline wrap this future in `tokio::time::timeout`.
    pub async fn infer(
        &self,
        subject: &AnalysisSubject,
        model: &str,
        schema: LabelSchema,
        credential: &str,
    ) -> Result<i32, InferenceError> {
        if credential.trim().is_empty() {
            return Err(InferenceError::MissingCredential);
        }

        let request = self.build_request(subject, model, credential);
        let mut attempt = 1u32;

        loop {
            let start = Instant::now();
            let response = self.transport.post(&request).await?;
            let latency_ms = start.elapsed().as_millis();

            if response.is_success() {
                let score = parse_realness(&response.body, schema)?;
                debug!(model, attempt, latency_ms, score, "inference.ok");
                return Ok(score);
            }

            match serde_json::from_str::<ErrorBody>(&response.body) {
                Ok(err) if err.error.contains("loading") => {
                    warn!(
                        model,
                        attempt,
                        estimated_time = err.estimated_time.unwrap_or(-1.0),
                        "Model is loading, retrying in {}s",
                        self.retry_delay.as_secs()
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Ok(err) => {
                    return Err(InferenceError::Api {
                        status: response.status,
                        message: err.error,
                    })
                }
                Err(_) => {
                    return Err(InferenceError::Api {
                        status: response.status,
                        message: response.body,
                    })
                }
            }
        }
    }
}

/// Interpret a `[{label, score}]` (or one-level nested) body under `schema`.
pub fn parse_realness(body: &str, schema: LabelSchema) -> Result<i32, InferenceError> {
    let payload: LabelPayload =
        serde_json::from_str(body).map_err(|e| InferenceError::Malformed(e.to_string()))?;

    let labels = match payload {
        LabelPayload::Flat(items) => items,
        LabelPayload::Nested(groups) => groups.into_iter().flatten().collect(),
    };

    let best = labels
        .iter()
        .filter(|l| schema.matches(&l.label))
        .map(|l| l.score)
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));

    Ok(best
        .map(|s| (s * 100.0).round() as i32)
        .unwrap_or(UNCERTAIN_SCORE)
        .clamp(0, 100))
}
