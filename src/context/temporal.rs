//! Temporal risk detector: late-night, rapid-posting, weekend and
//! hour-of-day factors, computed in the user's local time when a timezone
//! was supplied.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::config::TemporalConfig;
use crate::models::TemporalResult;

/// Compute temporal risk factors for the current message.
///
/// `timestamps` are the retained history timestamps; `now` is the current
/// message's instant. The risk modifier is multiplicative over the applicable
/// factors and reported to the urgency calculator; it never changes the
/// ensemble score retroactively.
pub fn analyze(
    timestamps: &[DateTime<Utc>],
    now: DateTime<Utc>,
    tz: Tz,
    cfg: &TemporalConfig,
) -> TemporalResult {
    let local = now.with_timezone(&tz);
    let hour_of_day = local.hour();

    let late_night_risk = in_wrapping_window(hour_of_day, cfg.late_night_start, cfg.late_night_end);
    let is_weekend = matches!(local.weekday(), Weekday::Sat | Weekday::Sun);

    let window_start = now - Duration::minutes(cfg.rapid_posting_threshold_minutes);
    let recent = timestamps
        .iter()
        .filter(|ts| **ts >= window_start && **ts <= now)
        .count()
        + 1; // the current message itself
    let rapid_posting = recent >= cfg.rapid_posting_message_count;

    let mut risk_modifier = 1.0f32;
    if late_night_risk {
        risk_modifier *= cfg.late_night_modifier;
    }
    if is_weekend {
        risk_modifier *= cfg.weekend_modifier;
    }
    if rapid_posting {
        risk_modifier *= cfg.rapid_posting_modifier;
    }

    TemporalResult {
        late_night_risk,
        rapid_posting,
        is_weekend,
        hour_of_day,
        risk_modifier: risk_modifier.clamp(1.0, 2.0),
        user_timezone: tz.name().to_string(),
    }
}

/// Hour membership in a window that may wrap midnight, start inclusive and
/// end exclusive.
fn in_wrapping_window(hour: u32, start: u32, end: u32) -> bool {
    if start <= end {
        (start..end).contains(&hour)
    } else {
        hour >= start || hour < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cfg() -> TemporalConfig {
        TemporalConfig::default()
    }

    #[test]
    fn late_night_window_wraps_midnight() {
        assert!(in_wrapping_window(23, 22, 5));
        assert!(in_wrapping_window(2, 22, 5));
        assert!(!in_wrapping_window(5, 22, 5));
        assert!(!in_wrapping_window(12, 22, 5));
        assert!(in_wrapping_window(22, 22, 5));
    }

    #[test]
    fn hour_uses_the_supplied_timezone() {
        // 02:30 UTC on a Wednesday is 22:30 the previous evening in New York.
        let now = Utc.with_ymd_and_hms(2026, 7, 8, 2, 30, 0).unwrap();
        let result = analyze(&[], now, chrono_tz::America::New_York, &cfg());
        assert_eq!(result.hour_of_day, 22);
        assert!(result.late_night_risk);
        assert_eq!(result.user_timezone, "America/New_York");
    }

    #[test]
    fn rapid_posting_counts_messages_in_the_window() {
        let now = Utc.with_ymd_and_hms(2026, 7, 8, 2, 40, 0).unwrap();
        let timestamps: Vec<_> = (0..4)
            .map(|i| now - Duration::minutes(5 * (i + 1)))
            .collect();
        let result = analyze(&timestamps, now, chrono_tz::UTC, &cfg());
        assert!(result.rapid_posting);
        // Late night (02:40) and rapid posting both apply: 1.2 * 1.2.
        assert!((result.risk_modifier - 1.44).abs() < 1e-3);
    }

    #[test]
    fn sparse_history_is_not_rapid_posting() {
        let now = Utc.with_ymd_and_hms(2026, 7, 8, 14, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..4).map(|i| now - Duration::hours(i + 1)).collect();
        let result = analyze(&timestamps, now, chrono_tz::UTC, &cfg());
        assert!(!result.rapid_posting);
        assert!(!result.late_night_risk);
        assert_eq!(result.risk_modifier, 1.0);
    }

    #[test]
    fn weekend_applies_the_weekend_modifier() {
        // 2026-07-11 is a Saturday.
        let now = Utc.with_ymd_and_hms(2026, 7, 11, 14, 0, 0).unwrap();
        let result = analyze(&[], now, chrono_tz::UTC, &cfg());
        assert!(result.is_weekend);
        assert!((result.risk_modifier - 1.1).abs() < 1e-3);
    }

    #[test]
    fn modifier_is_capped_at_two() {
        let cfg = TemporalConfig {
            late_night_modifier: 2.0,
            weekend_modifier: 2.0,
            rapid_posting_modifier: 2.0,
            ..TemporalConfig::default()
        };
        // Saturday 23:00 with a burst of recent messages.
        let now = Utc.with_ymd_and_hms(2026, 7, 11, 23, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..6).map(|i| now - Duration::minutes(i + 1)).collect();
        let result = analyze(&timestamps, now, chrono_tz::UTC, &cfg);
        assert_eq!(result.risk_modifier, 2.0);
    }
}
