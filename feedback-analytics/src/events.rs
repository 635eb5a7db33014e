use crate::error::{FeedbackError, FeedbackResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reported side effects on a feedback event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideEffects {
    pub description: String,
    /// A blocking side effect disqualifies the event from counting as a
    /// success regardless of symptom improvement
    pub blocking: bool,
}

/// Self-reported adherence to the recommended plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compliance {
    Full,
    Partial,
    None,
}

/// One immutable user rating of a recommendation
///
/// Uniqueness key is `(patient_id, recommendation_id, created_at)`; a second
/// append with the same key is a duplicate, not an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub recommendation_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// 1 (much worse) .. 5 (much better)
    pub symptom_improvement: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<SideEffects>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Compliance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
}

impl FeedbackEvent {
    pub fn new(
        patient_id: Uuid,
        recommendation_id: Uuid,
        symptom_improvement: u8,
    ) -> FeedbackResult<Self> {
        if !(1..=5).contains(&symptom_improvement) {
            return Err(FeedbackError::InvalidRating(format!(
                "symptom_improvement must be 1..=5, got {symptom_improvement}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            patient_id,
            recommendation_id,
            created_at: Utc::now(),
            symptom_improvement,
            side_effects: None,
            compliance: None,
            free_text: None,
        })
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_side_effects(mut self, description: impl Into<String>, blocking: bool) -> Self {
        self.side_effects = Some(SideEffects {
            description: description.into(),
            blocking,
        });
        self
    }

    pub fn with_compliance(mut self, compliance: Compliance) -> Self {
        self.compliance = Some(compliance);
        self
    }

    pub fn with_free_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self
    }

    /// Success predicate for effectiveness aggregation
    pub fn is_successful(&self) -> bool {
        self.symptom_improvement >= 3
            && !self.side_effects.as_ref().map_or(false, |s| s.blocking)
    }

    /// Idempotency key
    pub fn dedup_key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.patient_id,
            self.recommendation_id,
            self.created_at.timestamp_micros()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_is_validated_at_construction() {
        assert!(FeedbackEvent::new(Uuid::new_v4(), Uuid::new_v4(), 0).is_err());
        assert!(FeedbackEvent::new(Uuid::new_v4(), Uuid::new_v4(), 6).is_err());
        assert!(FeedbackEvent::new(Uuid::new_v4(), Uuid::new_v4(), 1).is_ok());
        assert!(FeedbackEvent::new(Uuid::new_v4(), Uuid::new_v4(), 5).is_ok());
    }

    #[test]
    fn success_needs_improvement_and_no_blocking_side_effect() {
        let base = FeedbackEvent::new(Uuid::new_v4(), Uuid::new_v4(), 3).unwrap();
        assert!(base.is_successful());

        let poor = FeedbackEvent::new(Uuid::new_v4(), Uuid::new_v4(), 2).unwrap();
        assert!(!poor.is_successful());

        let blocked = FeedbackEvent::new(Uuid::new_v4(), Uuid::new_v4(), 5)
            .unwrap()
            .with_side_effects("nausea", true);
        assert!(!blocked.is_successful());

        let tolerable = FeedbackEvent::new(Uuid::new_v4(), Uuid::new_v4(), 4)
            .unwrap()
            .with_side_effects("mild drowsiness", false);
        assert!(tolerable.is_successful());
    }

    #[test]
    fn dedup_key_covers_the_uniqueness_tuple() {
        let event = FeedbackEvent::new(Uuid::new_v4(), Uuid::new_v4(), 4).unwrap();
        let same_key = event.clone();
        assert_eq!(event.dedup_key(), same_key.dedup_key());

        let other_patient = FeedbackEvent::new(Uuid::new_v4(), event.recommendation_id, 4)
            .unwrap()
            .with_created_at(event.created_at);
        assert_ne!(event.dedup_key(), other_patient.dedup_key());
    }
}
