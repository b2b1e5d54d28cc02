// Analysis Pipelines
// Fans a subject out to its signal sources concurrently, waits for every one of them,
// substitutes fallbacks for failures and hands the rest to aggregation.
// - Text: AI detector + fact-check model + linguistic diversity + pattern rules
// - Image: AI-image model + deepfake model + pixel heuristics + metadata

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::models::{
    AnalysisStatus, AnalysisSubject, ImageAnalysisReport, ImageSubject, SignalResult,
    TextAnalysisReport,
};
use crate::services::config_store::{EngineConfig, ModelConfig};
use crate::services::inference::{HttpTransport, InferenceTransport, RemoteInferenceClient};

use super::aggregation::{aggregate, find_score};
use super::image_heuristics::PIXEL_SIGNAL;
use super::metadata::{resolve_dimensions, INTEGRITY_SIGNAL};
use super::signals::{
    heuristic_name, RemoteRole, SignalError, SignalSource, AI_DETECTION_SIGNAL, AI_IMAGE_SIGNAL,
    DEEPFAKE_SIGNAL,
};
use super::text_heuristics::TextStatistics;
use super::SignalOutput;

const FLAG_THRESHOLD: i32 = 50;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Text is empty")]
    EmptyText,
    #[error("Image payload is empty")]
    EmptyImage,
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
}

/// Lifecycle of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    Dispatched,
    Collecting,
    Aggregated,
    AggregatedWithFallback,
}

impl AnalysisPhase {
    pub fn status(&self) -> AnalysisStatus {
        match self {
            Self::AggregatedWithFallback => AnalysisStatus::Degraded,
            _ => AnalysisStatus::Complete,
        }
    }
}

/// Everything the sources produced, in dispatch order.
#[derive(Debug, Clone)]
pub struct Collected {
    pub breakdown: Vec<SignalResult>,
    pub warnings: Vec<String>,
    pub phase: AnalysisPhase,
}

pub struct AnalysisEngine<T: InferenceTransport = HttpTransport> {
    client: Arc<RemoteInferenceClient<T>>,
    models: ModelConfig,
}

impl AnalysisEngine<HttpTransport> {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(RemoteInferenceClient::new(config), config.models.clone())
    }
}

impl<T: InferenceTransport> AnalysisEngine<T> {
    pub fn new(client: RemoteInferenceClient<T>, models: ModelConfig) -> Self {
        Self {
            client: Arc::new(client),
            models,
        }
    }

    pub fn client(&self) -> &RemoteInferenceClient<T> {
        &self.client
    }

    pub fn text_sources(&self) -> Vec<SignalSource> {
        vec![
            SignalSource::remote(RemoteRole::TextAuthorship, &self.models),
            SignalSource::remote(RemoteRole::NewsReliability, &self.models),
            SignalSource::LinguisticDiversity,
            SignalSource::PatternAnalysis,
        ]
    }

    pub fn image_sources(&self) -> Vec<SignalSource> {
        vec![
            SignalSource::remote(RemoteRole::ImageGeneration, &self.models),
            SignalSource::remote(RemoteRole::Deepfake, &self.models),
            SignalSource::PixelAnalysis,
            SignalSource::Metadata,
        ]
    }

    pub async fn analyze_text(
        &self,
        content: &str,
        credential: &str,
    ) -> Result<TextAnalysisReport, AnalysisError> {
        if content.trim().is_empty() {
            return Err(AnalysisError::EmptyText);
        }

        let request_id = Uuid::new_v4();
        let span = info_span!("analysis", %request_id, pipeline = "text");
        async move {
            let start = Instant::now();
            info!(chars = content.chars().count(), "[PIPELINE] text analysis started");

            let subject = Arc::new(AnalysisSubject::text(content));
            let collected = self.collect(Arc::clone(&subject), self.text_sources(), credential).await;

            let stats = TextStatistics::compute(content);
            let ai_score = find_score(&collected.breakdown, AI_DETECTION_SIGNAL)
                .or_else(|| find_score(&collected.breakdown, &heuristic_name(AI_DETECTION_SIGNAL)));

            let status = collected.phase.status();
            let agg = aggregate(collected.breakdown, collected.warnings);

            info!(
                score = agg.overall_score,
                verdict = ?agg.verdict,
                ?status,
                elapsed_ms = start.elapsed().as_millis(),
                "[PIPELINE] text analysis finished"
            );

            Ok(TextAnalysisReport {
                overall_score: agg.overall_score,
                verdict: agg.verdict,
                status,
                breakdown: agg.breakdown,
                warnings: agg.warnings,
                word_count: stats.word_count,
                sentence_count: stats.sentence_count,
                perplexity: stats.perplexity_level(),
                burstiness: stats.burstiness_level(),
                is_ai_generated: ai_score.map_or(false, |s| s < FLAG_THRESHOLD),
            })
        }
        .instrument(span)
        .await
    }

    pub async fn analyze_image(
        &self,
        subject: ImageSubject,
        credential: &str,
    ) -> Result<ImageAnalysisReport, AnalysisError> {
        validate_image(&subject)?;

        let request_id = Uuid::new_v4();
        let span = info_span!("analysis", %request_id, pipeline = "image");
        async move {
            let start = Instant::now();
            info!(
                bytes = subject.payload_size(),
                mime = %subject.declared_mime_type,
                "[PIPELINE] image analysis started"
            );

            let format = image_format(&subject);
            let subject = attach_dimensions(subject);
            let dimensions = subject.decoded_dimensions;
            let subject = Arc::new(AnalysisSubject::Image(subject));
            let collected = self.collect(subject, self.image_sources(), credential).await;

            let below = |name: &str| {
                find_score(&collected.breakdown, name).map_or(false, |s| s < FLAG_THRESHOLD)
            };
            let is_ai_generated = below(AI_IMAGE_SIGNAL);
            let is_deepfake = below(DEEPFAKE_SIGNAL);
            let has_manipulation = below(INTEGRITY_SIGNAL) || below(PIXEL_SIGNAL);

            let status = collected.phase.status();
            let agg = aggregate(collected.breakdown, collected.warnings);

            info!(
                score = agg.overall_score,
                verdict = ?agg.verdict,
                ?status,
                elapsed_ms = start.elapsed().as_millis(),
                "[PIPELINE] image analysis finished"
            );

            Ok(ImageAnalysisReport {
                overall_score: agg.overall_score,
                verdict: agg.verdict,
                status,
                breakdown: agg.breakdown,
                warnings: agg.warnings,
                format,
                dimensions,
                is_ai_generated,
                is_deepfake,
                has_manipulation,
            })
        }
        .instrument(span)
        .await
    }

    /// Run every source as its own task and wait for all of them.
    /// A failing or panicking source never affects the others. Dropping the
    /// returned future aborts every task still running.
    pub async fn collect(
        &self,
        subject: Arc<AnalysisSubject>,
        sources: Vec<SignalSource>,
        credential: &str,
    ) -> Collected {
        let credential: Arc<str> = Arc::from(credential);
        let mut phase = AnalysisPhase::Dispatched;
        debug!(?phase, sources = sources.len(), "[PIPELINE] dispatching");

        let mut tasks: JoinSet<(usize, Result<SignalOutput, SignalError>)> = JoinSet::new();
        for (index, source) in sources.iter().enumerate() {
            let source = source.clone();
            let subject = Arc::clone(&subject);
            let client = Arc::clone(&self.client);
            let credential = Arc::clone(&credential);
            tasks.spawn(
                async move { (index, source.run(&subject, &client, &credential).await) }
                    .in_current_span(),
            );
        }

        phase = AnalysisPhase::Collecting;
        debug!(?phase, "[PIPELINE] collecting");

        // Completion order varies; slots keep dispatch order.
        let mut slots: Vec<Option<Result<SignalOutput, SignalError>>> =
            std::iter::repeat_with(|| None).take(sources.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!("[PIPELINE] source task aborted: {}", e),
            }
        }

        let mut breakdown = Vec::new();
        let mut warnings = Vec::new();
        let mut degraded = false;

        for (source, slot) in sources.iter().zip(slots) {
            let outcome = slot.unwrap_or_else(|| {
                Err(SignalError::Aborted(format!("{} did not complete", source.name())))
            });

            let output: Option<SignalOutput> = match outcome {
                Ok(output) => {
                    debug!(source = source.name(), results = ?output.results, "[PIPELINE] source ok");
                    Some(output)
                }
                Err(e) => {
                    degraded = true;
                    let substitute = source.fallback(&subject);
                    warn!(
                        source = source.name(),
                        fallback = substitute.is_some(),
                        "[PIPELINE] source failed: {}",
                        e
                    );
                    substitute
                }
            };

            if let Some(output) = output {
                breakdown.extend(output.results);
                warnings.extend(output.warnings);
            }
        }

        phase = if degraded {
            AnalysisPhase::AggregatedWithFallback
        } else {
            AnalysisPhase::Aggregated
        };
        debug!(?phase, entries = breakdown.len(), "[PIPELINE] collected");

        Collected {
            breakdown,
            warnings,
            phase,
        }
    }
}

fn validate_image(subject: &ImageSubject) -> Result<(), AnalysisError> {
    if subject.bytes.is_empty() {
        return Err(AnalysisError::EmptyImage);
    }
    let mime = subject.declared_mime_type.trim();
    if !mime.is_empty() && !mime.to_ascii_lowercase().starts_with("image/") {
        return Err(AnalysisError::UnsupportedMediaType(mime.to_string()));
    }
    Ok(())
}

/// Probe the header once so every source sees the same dimensions.
pub fn attach_dimensions(mut subject: ImageSubject) -> ImageSubject {
    if subject.decoded_dimensions.is_none() {
        subject.decoded_dimensions = resolve_dimensions(&subject);
    }
    subject
}

/// "PNG" from "image/png"; sniffed from the bytes when nothing was declared.
pub fn image_format(subject: &ImageSubject) -> String {
    let declared = subject.declared_mime_type.trim().to_ascii_lowercase();
    if let Some(kind) = declared.strip_prefix("image/").filter(|k| !k.is_empty()) {
        let kind = kind.split(['+', ';']).next().unwrap_or(kind);
        return kind.trim_start_matches("x-").to_uppercase();
    }
    image::guess_format(&subject.bytes)
        .ok()
        .and_then(|f| f.extensions_str().first().map(|ext| ext.to_uppercase()))
        .unwrap_or_else(|| "UNKNOWN".to_string())
}
