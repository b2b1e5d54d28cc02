// Detection Module
// Authenticity scoring organized into specialized submodules:
// - text_heuristics: lexical fallback and linguistic diversity scoring
// - pattern_rules: declarative weighted regex rules (naturalness, credibility)
// - image_heuristics: pixel statistics on a downscaled copy
// - metadata: payload size and dimension checks
// - signals: uniform SignalSource wrapper with fallback policies
// - aggregation: mean score, warning dedup, verdict
// - pipeline: concurrent fan-out for the text and image pipelines

pub mod text_heuristics;
pub mod pattern_rules;
pub mod image_heuristics;
pub mod metadata;
pub mod signals;
pub mod aggregation;
pub mod pipeline;

use crate::models::SignalResult;

/// Named scores plus findings from one signal source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalOutput {
    pub results: Vec<SignalResult>,
    pub warnings: Vec<String>,
}

// Re-export commonly used items
pub use aggregation::{aggregate, dedup_warnings, overall_score, AggregateScore};
pub use image_heuristics::analyze_pixels;
pub use metadata::analyze_metadata;
pub use pattern_rules::{analyze_patterns, PatternRule};
pub use pipeline::{AnalysisEngine, AnalysisError, AnalysisPhase};
pub use signals::{FallbackPolicy, RemoteRole, SignalError, SignalSource};
pub use text_heuristics::{analyze_diversity, fallback_score, TextStatistics};
