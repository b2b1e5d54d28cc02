// AuthScope Core Services

pub mod text_processor;
pub mod config_store;
pub mod inference;
pub mod detection;

pub use config_store::*;
pub use inference::{
    HttpTransport, InferenceError, InferencePayload, InferenceRequest, InferenceTransport,
    LabelSchema, RemoteInferenceClient, TransportResponse,
};

pub use detection::{
    aggregate,
    analyze_diversity,
    analyze_metadata,
    analyze_patterns,
    analyze_pixels,
    fallback_score,
    AnalysisEngine,
    AnalysisError,
    SignalOutput,
    SignalSource,
};
