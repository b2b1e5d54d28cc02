// Signal Sources
// Uniform wrapper over every measurement the pipelines can dispatch

use thiserror::Error;

use crate::models::{AnalysisSubject, SignalResult};
use crate::services::inference::{InferenceError, InferenceTransport, LabelSchema, RemoteInferenceClient};
use crate::services::config_store::ModelConfig;

use super::image_heuristics::analyze_pixels;
use super::metadata::analyze_metadata;
use super::pattern_rules::analyze_patterns;
use super::text_heuristics::{analyze_diversity, fallback_score};
use super::SignalOutput;

pub const AI_DETECTION_SIGNAL: &str = "AI Detection";
pub const FACT_CHECK_SIGNAL: &str = "Fact Check";
pub const AI_IMAGE_SIGNAL: &str = "AI Image Detection";
pub const DEEPFAKE_SIGNAL: &str = "Deepfake Detection";

/// Neutral score substituted for an unavailable remote image model.
pub const NEUTRAL_FALLBACK_SCORE: i32 = 50;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("{0} cannot analyze this kind of subject")]
    SubjectMismatch(&'static str),
    #[error("signal task aborted: {0}")]
    Aborted(String),
}

/// The hosted models the pipelines consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteRole {
    TextAuthorship,
    NewsReliability,
    ImageGeneration,
    Deepfake,
}

impl RemoteRole {
    pub fn signal_name(&self) -> &'static str {
        match self {
            Self::TextAuthorship => AI_DETECTION_SIGNAL,
            Self::NewsReliability => FACT_CHECK_SIGNAL,
            Self::ImageGeneration => AI_IMAGE_SIGNAL,
            Self::Deepfake => DEEPFAKE_SIGNAL,
        }
    }

    pub fn schema(&self) -> LabelSchema {
        match self {
            Self::NewsReliability => LabelSchema::News,
            _ => LabelSchema::Authenticity,
        }
    }

    pub fn model<'a>(&self, models: &'a ModelConfig) -> &'a str {
        match self {
            Self::TextAuthorship => &models.text_detector,
            Self::NewsReliability => &models.news_classifier,
            Self::ImageGeneration => &models.image_detector,
            Self::Deepfake => &models.deepfake_detector,
        }
    }

    pub fn fallback(&self) -> FallbackPolicy {
        match self {
            Self::TextAuthorship => FallbackPolicy::LexicalHeuristic,
            Self::NewsReliability => FallbackPolicy::Omit,
            Self::ImageGeneration | Self::Deepfake => FallbackPolicy::Neutral,
        }
    }
}

/// What replaces a source's output when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Local lexical scorer under "<name> (Heuristic)".
    LexicalHeuristic,
    /// Fixed 50 under "<name> (Fallback)".
    Neutral,
    /// Contribute nothing.
    Omit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalSource {
    Remote { role: RemoteRole, model: String },
    LinguisticDiversity,
    PatternAnalysis,
    PixelAnalysis,
    Metadata,
}

impl SignalSource {
    pub fn remote(role: RemoteRole, models: &ModelConfig) -> Self {
        Self::Remote {
            role,
            model: role.model(models).to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Remote { role, .. } => role.signal_name(),
            Self::LinguisticDiversity => super::text_heuristics::DIVERSITY_SIGNAL,
            Self::PatternAnalysis => "Pattern Analysis",
            Self::PixelAnalysis => super::image_heuristics::PIXEL_SIGNAL,
            Self::Metadata => "Metadata",
        }
    }

    /// Produce this source's scores. Reads the subject only; never mutates shared state.
    pub async fn run<T: InferenceTransport>(
        &self,
        subject: &AnalysisSubject,
        client: &RemoteInferenceClient<T>,
        credential: &str,
    ) -> Result<SignalOutput, SignalError> {
        match self {
            Self::Remote { role, model } => {
                let score = client.infer(subject, model, role.schema(), credential).await?;
                Ok(SignalOutput {
                    results: vec![SignalResult::new(role.signal_name(), score)],
                    warnings: Vec::new(),
                })
            }
            Self::LinguisticDiversity => subject
                .as_text()
                .map(analyze_diversity)
                .ok_or(SignalError::SubjectMismatch(self.name())),
            Self::PatternAnalysis => subject
                .as_text()
                .map(analyze_patterns)
                .ok_or(SignalError::SubjectMismatch(self.name())),
            Self::PixelAnalysis => subject
                .as_image()
                .map(|img| analyze_pixels(&img.bytes))
                .ok_or(SignalError::SubjectMismatch(self.name())),
            Self::Metadata => subject
                .as_image()
                .map(analyze_metadata)
                .ok_or(SignalError::SubjectMismatch(self.name())),
        }
    }

    /// Substitute output after `run` failed, if this source has one.
    pub fn fallback(&self, subject: &AnalysisSubject) -> Option<SignalOutput> {
        let Self::Remote { role, .. } = self else {
            return None;
        };
        match role.fallback() {
            FallbackPolicy::LexicalHeuristic => {
                let text = subject.as_text()?;
                let (score, warnings) = fallback_score(text);
                Some(SignalOutput {
                    results: vec![SignalResult::new(heuristic_name(role.signal_name()), score)],
                    warnings,
                })
            }
            FallbackPolicy::Neutral => Some(SignalOutput {
                results: vec![SignalResult::new(
                    format!("{} (Fallback)", role.signal_name()),
                    NEUTRAL_FALLBACK_SCORE,
                )],
                warnings: Vec::new(),
            }),
            FallbackPolicy::Omit => None,
        }
    }
}

pub fn heuristic_name(signal: &str) -> String {
    format!("{} (Heuristic)", signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageSubject;
    use crate::services::config_store::EngineConfig;
    use crate::services::inference::testing::ScriptedTransport;

    fn client(transport: ScriptedTransport) -> RemoteInferenceClient<ScriptedTransport> {
        RemoteInferenceClient::with_transport(transport, &EngineConfig::default())
    }

    #[tokio::test]
    async fn test_remote_source_names_its_result() {
        let models = ModelConfig::default();
        let transport = ScriptedTransport::new().respond(
            &models.news_classifier,
            200,
            r#"[[{"label":"LABEL_1","score":0.71},{"label":"LABEL_0","score":0.29}]]"#,
        );
        let source = SignalSource::remote(RemoteRole::NewsReliability, &models);
        let out = source
            .run(&AnalysisSubject::text("Local team wins."), &client(transport), "tok")
            .await
            .unwrap();
        assert_eq!(out.results, vec![SignalResult::new(FACT_CHECK_SIGNAL, 71)]);
    }

    #[tokio::test]
    async fn test_text_source_rejects_image_subject() {
        let subject = AnalysisSubject::Image(ImageSubject::new(vec![1], "image/png"));
        let err = SignalSource::PatternAnalysis
            .run(&subject, &client(ScriptedTransport::new()), "tok")
            .await
            .unwrap_err();
        assert!(matches!(err, SignalError::SubjectMismatch(_)));
    }

    #[test]
    fn test_fallback_policies() {
        let models = ModelConfig::default();
        let text = AnalysisSubject::text("A short note. Nothing else here at all today.");

        let lexical = SignalSource::remote(RemoteRole::TextAuthorship, &models)
            .fallback(&text)
            .unwrap();
        assert_eq!(lexical.results[0].name, "AI Detection (Heuristic)");

        let neutral = SignalSource::remote(RemoteRole::Deepfake, &models)
            .fallback(&text)
            .unwrap();
        assert_eq!(neutral.results, vec![SignalResult::new("Deepfake Detection (Fallback)", 50)]);

        assert!(SignalSource::remote(RemoteRole::NewsReliability, &models).fallback(&text).is_none());
        assert!(SignalSource::PatternAnalysis.fallback(&text).is_none());
    }
}
