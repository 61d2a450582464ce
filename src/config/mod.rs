//! Configuration loading for the vigil service.
//!
//! Two layers of configuration exist:
//!
//! * [`AppConfig`] — process-level settings loaded once at startup from
//!   layered `.env` files and `VIGIL_*` environment variables.
//! * [`DetectionConfig`] — the detection pipeline's tunables (thresholds,
//!   model weights, context-analysis knobs, alert cooldowns). Published as a
//!   copy-on-write snapshot; `PUT /config/context` swaps it atomically.

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf, sync::Arc, sync::RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{ConsensusAlgorithm, Severity, TruncationStrategy};

/// Process-level configuration derived from `VIGIL_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Overall deadline for one analyze request, in seconds.
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,
    /// Directory holding one file per secret (no extension).
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: String,
    /// When set, the alerter records would-be sends instead of calling the webhook.
    #[serde(default)]
    pub testing_mode: bool,
    /// Master switch for outbound alerting.
    #[serde(default = "default_alerts_enabled")]
    pub alerts_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            request_deadline_secs: default_request_deadline_secs(),
            secrets_dir: default_secrets_dir(),
            testing_mode: false,
            alerts_enabled: default_alerts_enabled(),
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a redacted JSON representation (no secrets in current schema).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_request_deadline_secs() -> u64 {
    30
}

fn default_secrets_dir() -> String {
    "secrets".to_string()
}

fn default_alerts_enabled() -> bool {
    true
}

/// Errors that can occur while loading or updating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid detection configuration: {0}")]
    InvalidDetection(String),
}

/// Loads configuration using layered `.env` files and `VIGIL_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads the process configuration from layered env files and variables.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix("VIGIL_") {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let api_bind_addr = layered
            .remove("API_BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_bind_addr);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let request_deadline_secs = layered
            .remove("REQUEST_DEADLINE_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_request_deadline_secs);
        let secrets_dir = layered
            .remove("SECRETS_DIR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_secrets_dir);
        let testing_mode = layered
            .remove("TESTING_MODE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let alerts_enabled = layered
            .remove("ALERTS_ENABLED")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "no"))
            .unwrap_or_else(default_alerts_enabled);

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            request_deadline_secs,
            secrets_dir,
            testing_mode,
            alerts_enabled,
        };

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var("VIGIL_PROFILE")
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix("VIGIL_") {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

// ---------------------------------------------------------------------------
// Detection configuration (runtime-updatable snapshot)
// ---------------------------------------------------------------------------

/// Ordered severity thresholds. Each bound is inclusive: a score exactly on a
/// threshold lands in the higher bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct SeverityThresholds {
    pub critical: f32,
    pub high: f32,
    pub medium: f32,
    pub low: f32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical: 0.85,
            high: 0.65,
            medium: 0.40,
            low: 0.20,
        }
    }
}

impl SeverityThresholds {
    /// Map a score to its severity bucket (inclusive lower bounds).
    pub fn severity_for(&self, score: f32) -> Severity {
        if score >= self.critical {
            Severity::Critical
        } else if score >= self.high {
            Severity::High
        } else if score >= self.medium {
            Severity::Medium
        } else if score >= self.low {
            Severity::Low
        } else {
            Severity::Safe
        }
    }

    /// The lower bound of a given bucket.
    pub fn floor_of(&self, severity: Severity) -> f32 {
        match severity {
            Severity::Safe => 0.0,
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }
}

/// Per-model configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelConfig {
    pub enabled: bool,
    /// Ensemble weight in [0, 1].
    pub weight: f32,
    /// Whitespace-token budget before truncation applies.
    pub token_budget: usize,
    pub truncation: TruncationStrategy,
    /// Per-model inference timeout.
    pub timeout_ms: u64,
}

impl ModelConfig {
    fn with_weight(weight: f32) -> Self {
        Self {
            enabled: true,
            weight,
            token_budget: 512,
            truncation: TruncationStrategy::Smart,
            timeout_ms: 2000,
        }
    }
}

/// Consensus layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsensusConfig {
    pub default_algorithm: ConsensusAlgorithm,
    /// A model votes "crisis" when its signal is strictly above this value.
    pub per_model_positive_threshold: f32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            default_algorithm: ConsensusAlgorithm::WeightedVoting,
            per_model_positive_threshold: 0.5,
        }
    }
}

/// Conflict layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConflictConfig {
    /// Variance at or above which a conflict is detected.
    pub disagreement_threshold: f32,
    /// Signal at or above this is a strong crisis-positive vote.
    pub strong_positive: f32,
    /// Signal at or below this is a strong crisis-negative vote.
    pub strong_negative: f32,
    /// When true, label mismatches pull the score halfway toward the median.
    pub median_pull_on_mismatch: bool,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            disagreement_threshold: 0.15,
            strong_positive: 0.6,
            strong_negative: 0.2,
            median_pull_on_mismatch: false,
        }
    }
}

/// Escalation detector thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EscalationConfig {
    pub sudden_threshold: f32,
    pub sudden_window_hours: f32,
    pub rapid_threshold: f32,
    pub rapid_window_hours: f32,
    pub gradual_threshold: f32,
    pub gradual_window_hours: f32,
    pub minimum_messages: usize,
    /// Optional per-severity delta thresholds, keyed by the current severity.
    /// More sensitive presets for already-elevated users.
    #[serde(default)]
    pub per_severity_thresholds: BTreeMap<Severity, f32>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            sudden_threshold: 0.4,
            sudden_window_hours: 1.0,
            rapid_threshold: 0.3,
            rapid_window_hours: 4.0,
            gradual_threshold: 0.2,
            gradual_window_hours: 24.0,
            minimum_messages: 3,
            per_severity_thresholds: BTreeMap::new(),
        }
    }
}

impl EscalationConfig {
    /// Preset that indexes delta thresholds by the current severity.
    pub fn with_severity_presets() -> Self {
        let mut presets = BTreeMap::new();
        presets.insert(Severity::Critical, 0.15);
        presets.insert(Severity::High, 0.20);
        presets.insert(Severity::Medium, 0.30);
        presets.insert(Severity::Low, 0.40);
        Self {
            per_severity_thresholds: presets,
            ..Self::default()
        }
    }
}

/// Temporal detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemporalConfig {
    /// Start hour of the late-night window (inclusive, wraps midnight).
    pub late_night_start: u32,
    /// End hour of the late-night window (exclusive).
    pub late_night_end: u32,
    pub rapid_posting_message_count: usize,
    pub rapid_posting_threshold_minutes: i64,
    pub late_night_modifier: f32,
    pub weekend_modifier: f32,
    pub rapid_posting_modifier: f32,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            late_night_start: 22,
            late_night_end: 5,
            rapid_posting_message_count: 5,
            rapid_posting_threshold_minutes: 30,
            late_night_modifier: 1.2,
            weekend_modifier: 1.1,
            rapid_posting_modifier: 1.2,
        }
    }
}

/// Trend analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrendConfig {
    /// Moving-average window applied before classification.
    pub smoothing_window: usize,
    pub worsening_threshold: f32,
    pub improving_threshold: f32,
    /// Max |consecutive smoothed delta| above which an unclear direction
    /// is classified volatile.
    pub volatility_threshold: f32,
    pub rapid_velocity: f32,
    pub moderate_velocity: f32,
    pub gradual_velocity: f32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            worsening_threshold: 0.15,
            improving_threshold: -0.15,
            volatility_threshold: 0.25,
            rapid_velocity: 0.10,
            moderate_velocity: 0.05,
            gradual_velocity: 0.02,
        }
    }
}

/// Context analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContextConfig {
    pub enabled: bool,
    /// Newest items retained from the supplied history.
    pub max_history_size: usize,
    /// Re-score history items lacking a supplied crisis score.
    pub rescore_missing: bool,
    pub escalation: EscalationConfig,
    pub temporal: TemporalConfig,
    pub trend: TrendConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_history_size: 20,
            rescore_missing: true,
            escalation: EscalationConfig::default(),
            temporal: TemporalConfig::default(),
            trend: TrendConfig::default(),
        }
    }
}

/// Alerter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AlertConfig {
    /// Minimum severity that triggers a crisis alert.
    pub alert_severity: Severity,
    /// Conflict variance at or above which a conflict alert fires.
    pub conflict_alert_threshold: f32,
    pub crisis_cooldown_secs: u64,
    pub escalation_cooldown_secs: u64,
    pub conflict_cooldown_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            alert_severity: Severity::High,
            conflict_alert_threshold: 0.15,
            crisis_cooldown_secs: 60,
            escalation_cooldown_secs: 300,
            conflict_cooldown_secs: 120,
        }
    }
}

/// The detection pipeline's full tunable configuration.
///
/// Readers take one snapshot per request via [`DetectionConfigHandle`] and
/// hold it for the request's duration; updates replace the snapshot wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DetectionConfig {
    pub thresholds: SeverityThresholds,
    /// Per-model settings keyed by model id.
    pub models: BTreeMap<String, ModelConfig>,
    pub consensus: ConsensusConfig,
    pub conflict: ConflictConfig,
    pub context: ContextConfig,
    pub alerts: AlertConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert("crisis".to_string(), ModelConfig::with_weight(0.45));
        models.insert("sentiment".to_string(), ModelConfig::with_weight(0.25));
        models.insert("emotion".to_string(), ModelConfig::with_weight(0.20));
        models.insert("irony".to_string(), ModelConfig::with_weight(0.10));
        Self {
            thresholds: SeverityThresholds::default(),
            models,
            consensus: ConsensusConfig::default(),
            conflict: ConflictConfig::default(),
            context: ContextConfig::default(),
            alerts: AlertConfig::default(),
        }
    }
}

impl DetectionConfig {
    /// Validate internal consistency. Called at startup and on every update.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(t.low < t.medium && t.medium < t.high && t.high < t.critical) {
            return Err(ConfigError::InvalidDetection(
                "severity thresholds must be strictly increasing (low < medium < high < critical)"
                    .to_string(),
            ));
        }
        for bound in [t.low, t.medium, t.high, t.critical] {
            if !(0.0..=1.0).contains(&bound) {
                return Err(ConfigError::InvalidDetection(
                    "severity thresholds must be within [0, 1]".to_string(),
                ));
            }
        }

        let enabled: Vec<_> = self.models.values().filter(|m| m.enabled).collect();
        if enabled.is_empty() {
            return Err(ConfigError::InvalidDetection(
                "at least one model must be enabled".to_string(),
            ));
        }
        let weight_sum: f32 = enabled.iter().map(|m| m.weight).sum();
        if weight_sum <= 0.0 {
            return Err(ConfigError::InvalidDetection(
                "enabled model weights must sum to a positive value".to_string(),
            ));
        }
        for (id, model) in &self.models {
            if !(0.0..=1.0).contains(&model.weight) {
                return Err(ConfigError::InvalidDetection(format!(
                    "weight for model '{id}' must be within [0, 1]"
                )));
            }
            if model.token_budget == 0 {
                return Err(ConfigError::InvalidDetection(format!(
                    "token budget for model '{id}' must be positive"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.consensus.per_model_positive_threshold) {
            return Err(ConfigError::InvalidDetection(
                "per_model_positive_threshold must be within [0, 1]".to_string(),
            ));
        }

        let tmp = &self.context.temporal;
        if tmp.late_night_start > 23 || tmp.late_night_end > 23 {
            return Err(ConfigError::InvalidDetection(
                "late-night window hours must be within 0..=23".to_string(),
            ));
        }
        for modifier in [
            tmp.late_night_modifier,
            tmp.weekend_modifier,
            tmp.rapid_posting_modifier,
        ] {
            if !(1.0..=2.0).contains(&modifier) {
                return Err(ConfigError::InvalidDetection(
                    "temporal risk modifiers must be within [1.0, 2.0]".to_string(),
                ));
            }
        }

        if self.context.trend.smoothing_window == 0 {
            return Err(ConfigError::InvalidDetection(
                "trend smoothing window must be positive".to_string(),
            ));
        }
        if self.context.max_history_size == 0 {
            return Err(ConfigError::InvalidDetection(
                "max_history_size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Shared handle publishing [`DetectionConfig`] snapshots.
///
/// Copy-on-write: readers clone the inner `Arc` once at request start;
/// updates swap the `Arc` under a short write lock.
#[derive(Clone)]
pub struct DetectionConfigHandle {
    inner: Arc<RwLock<Arc<DetectionConfig>>>,
}

impl DetectionConfigHandle {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Current snapshot. Cheap; clones only the `Arc`.
    pub fn snapshot(&self) -> Arc<DetectionConfig> {
        self.inner
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Validate and atomically publish a new snapshot.
    pub fn update(&self, config: DetectionConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poison| poison.into_inner());
        *guard = Arc::new(config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_detection_config_is_valid() {
        DetectionConfig::default().validate().expect("valid");
    }

    #[test]
    fn severity_mapping_is_inclusive_at_lower_bounds() {
        let t = SeverityThresholds::default();
        assert_eq!(t.severity_for(0.85), Severity::Critical);
        assert_eq!(t.severity_for(0.65), Severity::High);
        assert_eq!(t.severity_for(0.40), Severity::Medium);
        assert_eq!(t.severity_for(0.20), Severity::Low);
        assert_eq!(t.severity_for(0.199_99), Severity::Safe);
        assert_eq!(t.severity_for(0.0), Severity::Safe);
        assert_eq!(t.severity_for(1.0), Severity::Critical);
    }

    #[test]
    fn rejects_all_models_disabled() {
        let mut cfg = DetectionConfig::default();
        for model in cfg.models.values_mut() {
            model.enabled = false;
        }
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let mut cfg = DetectionConfig::default();
        cfg.thresholds.medium = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_modifier() {
        let mut cfg = DetectionConfig::default();
        cfg.context.temporal.late_night_modifier = 2.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn handle_update_swaps_snapshot_atomically() {
        let handle = DetectionConfigHandle::new(DetectionConfig::default());
        let before = handle.snapshot();

        let mut next = DetectionConfig::default();
        next.alerts.crisis_cooldown_secs = 5;
        handle.update(next).expect("valid update");

        assert_eq!(before.alerts.crisis_cooldown_secs, 60);
        assert_eq!(handle.snapshot().alerts.crisis_cooldown_secs, 5);
    }

    #[test]
    fn handle_rejects_invalid_update_and_keeps_previous() {
        let handle = DetectionConfigHandle::new(DetectionConfig::default());
        let mut bad = DetectionConfig::default();
        bad.thresholds.low = 0.95;
        assert!(handle.update(bad).is_err());
        assert_eq!(handle.snapshot().thresholds.low, 0.20);
    }
}
