//! Analyze request/response wire types and input validation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::assessment::CrisisAssessment;
use super::context::HistoryItem;
use super::enums::{ConsensusAlgorithm, Verbosity};

/// Maximum message length accepted by the service, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Request body for `POST /analyze`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Message text, 1..=2000 characters after trimming.
    #[schema(example = "I don't know how much longer I can keep going")]
    pub message: String,
    /// Opaque user identifier, echoed into alerts only.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Opaque channel identifier, echoed into alerts only.
    #[serde(default)]
    pub channel_id: Option<String>,
    /// IANA timezone name used for local-time temporal features.
    #[serde(default)]
    #[schema(example = "Europe/Prague")]
    pub user_timezone: Option<String>,
    /// Prior messages for the same user, newest 20 retained.
    #[serde(default)]
    pub message_history: Vec<HistoryItem>,
    /// Defaults to true when `message_history` is non-empty.
    #[serde(default)]
    pub include_context_analysis: Option<bool>,
    #[serde(default)]
    pub include_explanation: bool,
    #[serde(default)]
    pub verbosity: Verbosity,
    /// Overrides the configured default consensus algorithm.
    #[serde(default)]
    pub consensus_algorithm: Option<ConsensusAlgorithm>,
}

impl AnalyzeRequest {
    /// Whether context analysis should run for this request.
    pub fn wants_context(&self) -> bool {
        self.include_context_analysis
            .unwrap_or(!self.message_history.is_empty())
            && !self.message_history.is_empty()
    }
}

/// Response body for `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub assessment: CrisisAssessment,
    /// Wall-clock processing time for this request.
    pub processing_time_ms: u64,
    /// Non-fatal validation warnings (history issues, ignored timezone, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Basic service information returned at the root path.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub description: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "vigil".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Stateless crisis-detection service".to_string(),
        }
    }
}
