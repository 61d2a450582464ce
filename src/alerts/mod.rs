//! # Alerter
//!
//! Observes completed assessments and posts structured embeds to the
//! operator webhook for crisis, escalation and conflict events, throttled by
//! per-category cooldowns. Under the testing flag, would-be sends are
//! recorded in an in-memory queue instead of hitting the webhook. Webhook
//! failures are retried with a short bounded backoff and never reach the
//! request path.

pub mod embed;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::counter;
use rand::Rng;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use url::Url;

use crate::config::AlertConfig;
use crate::models::{ConflictKind, CrisisAssessment, Severity};

use embed::{CONTENT_LIMIT, Embed, EmbedField, signal_bar_chart, truncate_text};

/// Webhook connect+write timeout; independent of the request deadline.
const WEBHOOK_TIMEOUT_SECS: u64 = 5;

const MAX_SEND_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Crisis,
    Escalation,
    Conflict,
    System,
}

impl AlertCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            AlertCategory::Crisis => "crisis",
            AlertCategory::Escalation => "escalation",
            AlertCategory::Conflict => "conflict",
            AlertCategory::System => "system",
        }
    }

    fn cooldown(self, cfg: &AlertConfig) -> Duration {
        match self {
            AlertCategory::Crisis => Duration::from_secs(cfg.crisis_cooldown_secs),
            AlertCategory::Escalation => Duration::from_secs(cfg.escalation_cooldown_secs),
            AlertCategory::Conflict => Duration::from_secs(cfg.conflict_cooldown_secs),
            // System events are rare and always worth seeing.
            AlertCategory::System => Duration::from_secs(0),
        }
    }

    fn color(self) -> u32 {
        match self {
            AlertCategory::Crisis => 0xE74C3C,
            AlertCategory::Escalation => 0xE67E22,
            AlertCategory::Conflict => 0xF1C40F,
            AlertCategory::System => 0x95A5A6,
        }
    }
}

/// A fully formatted alert, ready to send (or record under suppression).
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub category: AlertCategory,
    pub severity: Severity,
    pub content: String,
    pub embed: Embed,
}

/// Request metadata echoed into alerts. Message text itself is never sent.
#[derive(Debug, Clone, Default)]
pub struct AlertMeta {
    pub user_id: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Default)]
struct AlertState {
    last_sent: HashMap<&'static str, Instant>,
    suppressed: HashMap<&'static str, u64>,
    queue: Vec<Alert>,
}

pub struct Alerter {
    client: Client,
    webhook_url: Option<Url>,
    testing: bool,
    state: Mutex<AlertState>,
}

impl Alerter {
    /// `webhook_url` of `None` disables outbound alerting entirely;
    /// `testing` records would-be sends instead of calling the webhook.
    pub fn new(webhook_url: Option<Url>, testing: bool) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            webhook_url,
            testing,
            state: Mutex::new(AlertState::default()),
        }
    }

    /// Whether the alerter is in testing-suppression mode.
    pub fn testing_mode(&self) -> bool {
        self.testing
    }

    /// Drain the suppression queue (testing mode only).
    pub fn drain_queue(&self) -> Vec<Alert> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut state.queue)
    }

    /// Events of this category swallowed by a cooldown so far.
    pub fn suppressed_count(&self, category: AlertCategory) -> u64 {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.suppressed.get(category.as_str()).copied().unwrap_or(0)
    }

    /// Inspect a finished assessment and emit whatever alerts it warrants.
    pub async fn observe(&self, assessment: &CrisisAssessment, meta: &AlertMeta, cfg: &AlertConfig) {
        if assessment.severity >= cfg.alert_severity {
            let alert = self.crisis_alert(assessment, meta);
            self.dispatch(alert, cfg).await;
        }

        if let Some(context) = &assessment.context_analysis {
            if context.escalation.detected {
                let alert = self.escalation_alert(assessment, meta);
                self.dispatch(alert, cfg).await;
            }
        }

        let conflict = &assessment.conflict_analysis;
        if conflict.detected && conflict.variance >= cfg.conflict_alert_threshold {
            let alert = self.conflict_alert(assessment, meta);
            self.dispatch(alert, cfg).await;
        }
    }

    /// System-level notification that every model failed.
    pub async fn system_unavailable(&self, failures: &[String], cfg: &AlertConfig) {
        let mut embed = Embed {
            title: "All models unavailable".to_string(),
            description: "The ensemble could not produce a single signal; requests are failing with 503.".to_string(),
            color: AlertCategory::System.color(),
            fields: vec![EmbedField {
                name: "failures".to_string(),
                value: failures.join("\n"),
                inline: false,
            }],
            timestamp: Utc::now().to_rfc3339(),
        };
        embed.enforce_limits();
        let alert = Alert {
            category: AlertCategory::System,
            severity: Severity::Critical,
            content: truncate_text("vigil: every model backend is down", CONTENT_LIMIT),
            embed,
        };
        self.dispatch(alert, cfg).await;
    }

    fn crisis_alert(&self, assessment: &CrisisAssessment, meta: &AlertMeta) -> Alert {
        let mut fields = vec![
            EmbedField {
                name: "severity".to_string(),
                value: assessment.severity.to_string(),
                inline: true,
            },
            EmbedField {
                name: "crisis_score".to_string(),
                value: format!("{:.2}", assessment.crisis_score),
                inline: true,
            },
            EmbedField {
                name: "recommended_action".to_string(),
                value: assessment.recommended_action.as_str().to_string(),
                inline: true,
            },
        ];
        push_meta_fields(&mut fields, meta);
        if let Some(explanation) = &assessment.explanation {
            fields.push(EmbedField {
                name: "summary".to_string(),
                value: explanation.summary.clone(),
                inline: false,
            });
        }

        let mut embed = Embed {
            title: format!("Crisis threshold crossed ({})", assessment.severity),
            description: format!(
                "Ensemble score {:.2} at confidence {:.2}; intervention urgency {}.",
                assessment.crisis_score, assessment.confidence, assessment.intervention_urgency
            ),
            color: AlertCategory::Crisis.color(),
            fields,
            timestamp: Utc::now().to_rfc3339(),
        };
        embed.enforce_limits();
        Alert {
            category: AlertCategory::Crisis,
            severity: assessment.severity,
            content: truncate_text("vigil: crisis alert", CONTENT_LIMIT),
            embed,
        }
    }

    fn escalation_alert(&self, assessment: &CrisisAssessment, meta: &AlertMeta) -> Alert {
        let context = assessment
            .context_analysis
            .as_ref()
            .expect("escalation alert requires context");
        let escalation = &context.escalation;

        let mut fields = vec![
            EmbedField {
                name: "rate".to_string(),
                value: escalation.rate.to_string(),
                inline: true,
            },
            EmbedField {
                name: "score_delta".to_string(),
                value: format!("{:+.2} over {:.1}h", escalation.score_delta, escalation.time_span_hours),
                inline: true,
            },
            EmbedField {
                name: "urgency".to_string(),
                value: context.intervention_urgency.to_string(),
                inline: true,
            },
        ];
        if let Some(pattern) = &escalation.matched_pattern {
            fields.push(EmbedField {
                name: "pattern".to_string(),
                value: pattern.clone(),
                inline: true,
            });
        }
        push_meta_fields(&mut fields, meta);

        let mut embed = Embed {
            title: "Escalation detected".to_string(),
            description: format!(
                "Trajectory {} with confidence {:.2}; current severity {}.",
                context.trajectory, escalation.confidence, assessment.severity
            ),
            color: AlertCategory::Escalation.color(),
            fields,
            timestamp: Utc::now().to_rfc3339(),
        };
        embed.enforce_limits();
        Alert {
            category: AlertCategory::Escalation,
            severity: assessment.severity,
            content: truncate_text("vigil: escalation alert", CONTENT_LIMIT),
            embed,
        }
    }

    fn conflict_alert(&self, assessment: &CrisisAssessment, meta: &AlertMeta) -> Alert {
        let conflict = &assessment.conflict_analysis;
        let kind = match conflict.kind {
            ConflictKind::None => "none",
            ConflictKind::ScoreVariance => "score_variance",
            ConflictKind::LabelMismatch => "label_mismatch",
            ConflictKind::SignFlip => "sign_flip",
        };

        let mut fields = vec![
            EmbedField {
                name: "kind".to_string(),
                value: kind.to_string(),
                inline: true,
            },
            EmbedField {
                name: "variance".to_string(),
                value: format!("{:.3}", conflict.variance),
                inline: true,
            },
            EmbedField {
                name: "signals".to_string(),
                value: signal_bar_chart(&assessment.signals),
                inline: false,
            },
        ];
        if let Some(resolution) = &conflict.resolution {
            fields.push(EmbedField {
                name: "resolution".to_string(),
                value: resolution.clone(),
                inline: false,
            });
        }
        push_meta_fields(&mut fields, meta);

        let mut embed = Embed {
            title: "Ensemble disagreement".to_string(),
            description: format!(
                "Models disagree ({kind}); final severity {} at score {:.2}.",
                assessment.severity, assessment.crisis_score
            ),
            color: AlertCategory::Conflict.color(),
            fields,
            timestamp: Utc::now().to_rfc3339(),
        };
        embed.enforce_limits();
        Alert {
            category: AlertCategory::Conflict,
            severity: assessment.severity,
            content: truncate_text("vigil: model conflict", CONTENT_LIMIT),
            embed,
        }
    }

    /// Apply the cooldown, then either record (testing) or send the alert.
    async fn dispatch(&self, alert: Alert, cfg: &AlertConfig) {
        let category = alert.category;
        let cooldown = category.cooldown(cfg);

        {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(last) = state.last_sent.get(category.as_str()) {
                if last.elapsed() < cooldown {
                    *state.suppressed.entry(category.as_str()).or_insert(0) += 1;
                    counter!("vigil_alerts_suppressed_total", "category" => category.as_str())
                        .increment(1);
                    return;
                }
            }
            state.last_sent.insert(category.as_str(), Instant::now());

            if self.testing {
                info!(category = category.as_str(), "alert suppressed by testing mode");
                state.queue.push(alert);
                counter!("vigil_alerts_recorded_total", "category" => category.as_str())
                    .increment(1);
                return;
            }
        }

        self.send(&alert).await;
    }

    async fn send(&self, alert: &Alert) {
        let Some(url) = &self.webhook_url else {
            return;
        };

        let payload = json!({
            "content": alert.content,
            "embeds": [alert.embed],
        });

        let mut delay = Duration::from_secs(1);
        for attempt in 1..=MAX_SEND_ATTEMPTS {
            match self.client.post(url.clone()).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(
                        category = alert.category.as_str(),
                        target = redacted_target(url),
                        attempt,
                        "alert delivered"
                    );
                    counter!("vigil_alerts_sent_total", "category" => alert.category.as_str())
                        .increment(1);
                    return;
                }
                Ok(response) => {
                    warn!(
                        category = alert.category.as_str(),
                        status = %response.status(),
                        attempt,
                        "webhook rejected alert"
                    );
                }
                Err(err) => {
                    warn!(
                        category = alert.category.as_str(),
                        error = %err,
                        attempt,
                        "webhook send failed"
                    );
                }
            }
            if attempt < MAX_SEND_ATTEMPTS {
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..250));
                tokio::time::sleep(delay + jitter).await;
                delay *= 2;
            }
        }
        error!(
            category = alert.category.as_str(),
            target = redacted_target(url),
            "alert dropped after {MAX_SEND_ATTEMPTS} attempts"
        );
        counter!("vigil_alerts_failed_total", "category" => alert.category.as_str()).increment(1);
    }
}

fn push_meta_fields(fields: &mut Vec<EmbedField>, meta: &AlertMeta) {
    if let Some(user_id) = &meta.user_id {
        fields.push(EmbedField {
            name: "user_id".to_string(),
            value: user_id.clone(),
            inline: true,
        });
    }
    if let Some(channel_id) = &meta.channel_id {
        fields.push(EmbedField {
            name: "channel_id".to_string(),
            value: channel_id.clone(),
            inline: true,
        });
    }
}

/// Scheme and host only, for logs.
fn redacted_target(url: &Url) -> String {
    format!("{}://{}", url.scheme(), url.host_str().unwrap_or("unknown"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::ensemble::EnsembleEngine;
    use crate::models::ConsensusAlgorithm;

    async fn assessment(text: &str) -> CrisisAssessment {
        EnsembleEngine::new()
            .assess(
                text,
                &DetectionConfig::default(),
                ConsensusAlgorithm::WeightedVoting,
            )
            .await
            .unwrap()
            .assessment
    }

    fn testing_alerter() -> Alerter {
        Alerter::new(None, true)
    }

    #[tokio::test]
    async fn crisis_assessment_queues_a_crisis_alert() {
        let alerter = testing_alerter();
        let assessment = assessment("I can't do this anymore").await;
        alerter
            .observe(&assessment, &AlertMeta::default(), &AlertConfig::default())
            .await;

        let queue = alerter.drain_queue();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].category, AlertCategory::Crisis);
        assert!(queue[0].embed.title.contains("critical"));
    }

    #[tokio::test]
    async fn safe_assessment_emits_nothing() {
        let alerter = testing_alerter();
        let assessment = assessment("Had a really good day today, thanks for asking!").await;
        alerter
            .observe(&assessment, &AlertMeta::default(), &AlertConfig::default())
            .await;
        assert!(alerter.drain_queue().is_empty());
    }

    #[tokio::test]
    async fn conflict_beyond_threshold_queues_conflict_alert() {
        let alerter = testing_alerter();
        let assessment =
            assessment("I want to end my life but today was amazing and wonderful and I feel great")
                .await;
        assert!(assessment.conflict_analysis.detected);
        alerter
            .observe(&assessment, &AlertMeta::default(), &AlertConfig::default())
            .await;

        let queue = alerter.drain_queue();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].category, AlertCategory::Conflict);
        let chart_field = queue[0]
            .embed
            .fields
            .iter()
            .find(|f| f.name == "signals")
            .expect("bar chart field");
        assert!(chart_field.value.contains('#'));
    }

    #[tokio::test]
    async fn cooldown_swallows_repeat_alerts() {
        let alerter = testing_alerter();
        let cfg = AlertConfig::default();
        let assessment = assessment("I can't do this anymore").await;

        for _ in 0..5 {
            alerter.observe(&assessment, &AlertMeta::default(), &cfg).await;
        }

        // One recorded send, four suppressed by the 60s crisis cooldown.
        assert_eq!(alerter.drain_queue().len(), 1);
        assert_eq!(alerter.suppressed_count(AlertCategory::Crisis), 4);
    }

    #[tokio::test]
    async fn zero_cooldown_lets_every_alert_through() {
        let alerter = testing_alerter();
        let cfg = AlertConfig {
            crisis_cooldown_secs: 0,
            ..AlertConfig::default()
        };
        let assessment = assessment("I can't do this anymore").await;
        for _ in 0..3 {
            alerter.observe(&assessment, &AlertMeta::default(), &cfg).await;
        }
        assert_eq!(alerter.drain_queue().len(), 3);
    }

    #[tokio::test]
    async fn meta_fields_are_attached() {
        let alerter = testing_alerter();
        let meta = AlertMeta {
            user_id: Some("user-7".to_string()),
            channel_id: Some("chan-3".to_string()),
        };
        let assessment = assessment("I can't do this anymore").await;
        alerter
            .observe(&assessment, &meta, &AlertConfig::default())
            .await;
        let queue = alerter.drain_queue();
        assert!(queue[0].embed.fields.iter().any(|f| f.value == "user-7"));
        assert!(queue[0].embed.fields.iter().any(|f| f.value == "chan-3"));
    }
}
