//! # Data Model
//!
//! Request-scoped value types exchanged between the pipeline components and
//! serialized on the API surface. Nothing here persists across requests.

pub mod assessment;
pub mod context;
pub mod enums;
pub mod request;
pub mod signal;

pub use assessment::{CrisisAssessment, Explanation};
pub use context::{
    ContextAnalysisResult, EscalationResult, HistoryItem, HistoryMetadata, TemporalResult,
    TrendResult,
};
pub use enums::{
    ConflictKind, ConsensusAlgorithm, EscalationRate, InterventionUrgency, RecommendedAction,
    Severity, TrendDirection, TrendVelocity, TruncationStrategy, Verbosity,
};
pub use request::{AnalyzeRequest, AnalyzeResponse, MAX_MESSAGE_CHARS, ServiceInfo};
pub use signal::{ConflictResult, ConsensusResult, EnsembleScore, ModelSignal};
