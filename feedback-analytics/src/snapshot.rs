use crate::events::FeedbackEvent;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Aggregation granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Recommendation,
    Condition,
    Herb,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Recommendation => "recommendation",
            Scope::Condition => "condition",
            Scope::Herb => "herb",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of change in success rate between the recent and older halves
/// of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

/// Derived effectiveness metrics for one scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessSnapshot {
    pub scope: Scope,
    pub scope_id: String,
    pub window_days: i64,
    /// successful_cases / total_cases
    pub score: f64,
    /// 0.5 + 0.5 * min(sample_size, 100) / 100
    pub confidence: f64,
    pub sample_size: i64,
    pub successful_cases: i64,
    pub total_cases: i64,
    pub average_rating: f64,
    pub trend: Trend,
    pub last_updated: DateTime<Utc>,
}

/// Confidence from sample volume; monotone, bounded in [0.5, 1.0]
pub fn confidence_for(sample_size: i64) -> f64 {
    0.5 + 0.5 * (sample_size.min(100).max(0) as f64) / 100.0
}

const TREND_HYSTERESIS: f64 = 0.10;
const MIN_PARTITION_EVENTS: usize = 2;

/// Aggregate a window of events into a snapshot
///
/// `events` must already be restricted to the window; `now` is the
/// evaluation instant and partitions the window into recent (within
/// `recent_days`) and older halves for the trend. Returns `None` for an
/// empty window. Deterministic: the same events and instants always produce
/// the same snapshot.
pub fn compute_snapshot(
    scope: Scope,
    scope_id: &str,
    window_days: i64,
    recent_days: i64,
    now: DateTime<Utc>,
    events: &[FeedbackEvent],
) -> Option<EffectivenessSnapshot> {
    if events.is_empty() {
        return None;
    }

    let total_cases = events.len() as i64;
    let successful_cases = events.iter().filter(|e| e.is_successful()).count() as i64;
    let average_rating =
        events.iter().map(|e| e.symptom_improvement as f64).sum::<f64>() / total_cases as f64;

    let cutoff = now - Duration::days(recent_days);
    let (recent, older): (Vec<&FeedbackEvent>, Vec<&FeedbackEvent>) =
        events.iter().partition(|e| e.created_at > cutoff);

    let trend = if recent.len() < MIN_PARTITION_EVENTS || older.len() < MIN_PARTITION_EVENTS {
        Trend::Stable
    } else {
        let rate = |slice: &[&FeedbackEvent]| {
            slice.iter().filter(|e| e.is_successful()).count() as f64 / slice.len() as f64
        };
        let delta = rate(&recent) - rate(&older);
        if delta > TREND_HYSTERESIS {
            Trend::Improving
        } else if delta < -TREND_HYSTERESIS {
            Trend::Declining
        } else {
            Trend::Stable
        }
    };

    Some(EffectivenessSnapshot {
        scope,
        scope_id: scope_id.to_string(),
        window_days,
        score: successful_cases as f64 / total_cases as f64,
        confidence: confidence_for(total_cases),
        sample_size: total_cases,
        successful_cases,
        total_cases,
        average_rating,
        trend,
        last_updated: now,
    })
}
