// AuthScope Data Models
// Subjects handed in by the input layer and reports handed back to the display layer

use serde::{Deserialize, Serialize};

// ============ Subjects ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextSubject {
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageSubject {
    pub bytes: Vec<u8>,
    pub declared_mime_type: String,
    #[serde(default)]
    pub decoded_dimensions: Option<ImageDimensions>,
}

impl ImageSubject {
    pub fn new(bytes: Vec<u8>, declared_mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            declared_mime_type: declared_mime_type.into(),
            decoded_dimensions: None,
        }
    }

    /// Attach dimensions already known to the input layer (skips header probing).
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.decoded_dimensions = Some(ImageDimensions { width, height });
        self
    }

    pub fn payload_size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnalysisSubject {
    Text(TextSubject),
    Image(ImageSubject),
}

impl AnalysisSubject {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(TextSubject {
            content: content.into(),
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t.content.as_str()),
            Self::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageSubject> {
        match self {
            Self::Image(img) => Some(img),
            Self::Text(_) => None,
        }
    }
}

// ============ Signals ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignalResult {
    pub name: String,
    /// Always within 0..=100.
    pub score: i32,
}

impl SignalResult {
    /// Build a result, clamping whatever intermediate arithmetic produced into 0..=100.
    pub fn new(name: impl Into<String>, score: i32) -> Self {
        Self {
            name: name.into(),
            score: score.clamp(0, 100),
        }
    }
}

// ============ Verdicts ============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Authentic,
    Suspicious,
    LikelyFake,
}

impl Verdict {
    /// >70 authentic, 41..=70 suspicious, <=40 likely fake/AI.
    pub fn from_score(score: i32) -> Self {
        if score > 70 {
            Self::Authentic
        } else if score > 40 {
            Self::Suspicious
        } else {
            Self::LikelyFake
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Authentic => "Likely Authentic",
            Self::Suspicious => "Suspicious",
            Self::LikelyFake => "Likely Fake or AI-Generated",
        }
    }
}

/// Terminal state of one analysis request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Every dispatched source produced its own result.
    Complete,
    /// At least one source failed and was substituted or dropped.
    Degraded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Level {
    Low,
    Medium,
    High,
}

// ============ Reports ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysisReport {
    pub overall_score: i32,
    pub verdict: Verdict,
    pub status: AnalysisStatus,
    pub breakdown: Vec<SignalResult>,
    pub warnings: Vec<String>,
    pub word_count: usize,
    pub sentence_count: usize,
    pub perplexity: Level,
    pub burstiness: Level,
    pub is_ai_generated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysisReport {
    pub overall_score: i32,
    pub verdict: Verdict,
    pub status: AnalysisStatus,
    pub breakdown: Vec<SignalResult>,
    pub warnings: Vec<String>,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ImageDimensions>,
    pub is_ai_generated: bool,
    pub is_deepfake: bool,
    pub has_manipulation: bool,
}
