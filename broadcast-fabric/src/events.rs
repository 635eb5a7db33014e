use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Broadcast event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RecommendationUpdate,
    EffectivenessUpdate,
    FeedbackUpdate,
    Connect,
    Pong,
}

/// Envelope delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub diagnosis_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl UpdateEvent {
    pub fn new(kind: EventKind, diagnosis_id: Uuid, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            diagnosis_id,
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn recommendation_update(
        diagnosis_id: Uuid,
        recommendation_id: Uuid,
        old_version: u32,
        new_version: u32,
        changed_fields: Vec<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            EventKind::RecommendationUpdate,
            diagnosis_id,
            json!({
                "recommendation_id": recommendation_id,
                "old_version": old_version,
                "new_version": new_version,
                "changed_fields": changed_fields,
                "reason": reason.into(),
            }),
        )
    }

    pub fn effectiveness_update(
        diagnosis_id: Uuid,
        recommendation_id: Uuid,
        score: f64,
        confidence: f64,
        sample_size: i64,
    ) -> Self {
        Self::new(
            EventKind::EffectivenessUpdate,
            diagnosis_id,
            json!({
                "recommendation_id": recommendation_id,
                "score": score,
                "confidence": confidence,
                "sample_size": sample_size,
            }),
        )
    }

    pub fn feedback_update(
        diagnosis_id: Uuid,
        feedback_id: Uuid,
        rating: u8,
        effectiveness: Option<f64>,
    ) -> Self {
        Self::new(
            EventKind::FeedbackUpdate,
            diagnosis_id,
            json!({
                "feedback_id": feedback_id,
                "rating": rating,
                "effectiveness": effectiveness,
            }),
        )
    }

    pub fn connect(diagnosis_id: Uuid, subscriber_id: Uuid) -> Self {
        Self::new(
            EventKind::Connect,
            diagnosis_id,
            json!({ "subscriber_id": subscriber_id, "status": "connected" }),
        )
    }

    pub fn pong(diagnosis_id: Uuid) -> Self {
        Self::new(EventKind::Pong, diagnosis_id, json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wire_form_uses_type_field() {
        let event = UpdateEvent::pong(Uuid::new_v4());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "pong");
        assert!(json["diagnosis_id"].is_string());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn recommendation_update_carries_version_delta() {
        let event = UpdateEvent::recommendation_update(
            Uuid::new_v4(),
            Uuid::new_v4(),
            2,
            3,
            vec!["entries".to_string()],
            "feedback re-rank",
        );
        assert_eq!(event.kind, EventKind::RecommendationUpdate);
        assert_eq!(event.data["old_version"], 2);
        assert_eq!(event.data["new_version"], 3);
    }
}
