//! End-to-end flow tests over a fully in-memory context
//!
//! Covers the analysis flow (extract through publish), the feedback flow
//! (append through re-rank), degraded extraction recovery, and the
//! subscription surface.

use async_trait::async_trait;
use broadcast_fabric::EventKind;
use clinical_common::{
    AnalysisKind, FindingMap, Mizaj, Moisture, Severity, TongueCoating, TongueColor, Tradition,
};
use coordinator_service::{
    Context, CoordinatorError, CoordinatorService, DiagnosisStatus, TibbConfig,
};
use feedback_analytics::{FeedbackEvent, Scope, Trend};
use knowledge_store::{KnowledgeStore, TraditionDetail, TraditionRecord, TreatmentEntry, TreatmentKind};
use recommendation_service::{PatientProfile, Sex};
use uuid::Uuid;
use vision_analysis::{FeatureExtractor, VisionAnalyzer, VisionResult};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];

struct StubVision(serde_json::Value);

#[async_trait]
impl VisionAnalyzer for StubVision {
    async fn analyze(
        &self,
        _kind: AnalysisKind,
        _image: &[u8],
        _prompt: &str,
    ) -> VisionResult<serde_json::Value> {
        Ok(self.0.clone())
    }
}

fn record(
    id: &str,
    detail: TraditionDetail,
    map: FindingMap,
    treatments: Vec<TreatmentEntry>,
) -> TraditionRecord {
    TraditionRecord {
        id: id.to_string(),
        name: format!("record {id}"),
        category: "heat".to_string(),
        characteristics: map,
        contraindications: vec![],
        treatments,
        detail,
    }
}

/// One strong record per tradition, all presenting a red tongue with a thin
/// white coating
fn knowledge() -> KnowledgeStore {
    let tongue = FindingMap {
        color: Some(TongueColor::Red),
        coating: Some(TongueCoating::ThinWhite),
        moisture: Some(Moisture::Normal),
        ..Default::default()
    };

    KnowledgeStore::from_records(vec![
        record(
            "av_damawi",
            TraditionDetail::Avicenna {
                mizaj: Mizaj::GarmTar,
            },
            tongue.clone(),
            vec![
                TreatmentEntry::new(Tradition::Avicenna, TreatmentKind::Herb, "Saffron"),
                TreatmentEntry::new(Tradition::Avicenna, TreatmentKind::Herb, "Ginger"),
                TreatmentEntry::new(Tradition::Avicenna, TreatmentKind::Food, "Barley water"),
            ],
        ),
        record(
            "tcm_heart_fire",
            TraditionDetail::Tcm {
                organs: vec!["Heart".to_string()],
                meridians: vec![],
                imbalance: "excess_heat".to_string(),
            },
            tongue.clone(),
            vec![TreatmentEntry::new(
                Tradition::Tcm,
                TreatmentKind::Herb,
                "Lian Zi Xin",
            )],
        ),
        record(
            "ay_pitta_excess",
            TraditionDetail::Ayurveda {
                dosha: clinical_common::Dosha::Pitta,
            },
            tongue,
            vec![TreatmentEntry::new(
                Tradition::Ayurveda,
                TreatmentKind::Lifestyle,
                "Cooling routine",
            )],
        ),
    ])
    .unwrap()
}

fn tongue_response(confidence: f64) -> serde_json::Value {
    serde_json::json!({
        "findings": {
            "color": "red",
            "coating": "thin_white",
            "moisture": "normal",
            "mizaj": "garm_tar",
            "dosha": "pitta"
        },
        "confidence": confidence,
        "recommendations": ["rest", "hydrate"]
    })
}

async fn service_with_vision(response: serde_json::Value) -> CoordinatorService {
    let config = TibbConfig::default();
    let vision_config = config.vision_config();
    let ctx = Context::in_memory(knowledge(), config)
        .unwrap()
        .with_extractor(FeatureExtractor::with_provider(
            vision_config,
            Box::new(StubVision(response)),
        ));
    CoordinatorService::new(ctx)
}

async fn registered_patient(service: &CoordinatorService) -> Uuid {
    let profile = PatientProfile::new(Uuid::new_v4(), 35, Sex::Female);
    service
        .context()
        .patients
        .upsert_profile(&profile)
        .await
        .unwrap();
    profile.patient_id
}

#[tokio::test]
async fn analysis_flow_produces_matches_plan_and_event() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let patient = registered_patient(&service).await;

    let outcome = service
        .analyze(patient, AnalysisKind::Tongue, JPEG)
        .await
        .unwrap();

    // A perfect Avicennan agreement: mizaj, color, coating, moisture
    let top = &outcome.matches.avicenna[0];
    assert!((top.score - 1.0).abs() < 1e-9);
    assert!((top.reported_confidence - 0.8).abs() < 1e-9);
    assert_eq!(top.severity, Severity::High);
    assert_eq!(top.supporting_findings.len(), 4);
    assert!((outcome.confidence - 0.8).abs() < 1e-9);

    // The plan carries treatments from all matched traditions
    assert!(outcome.recommendation.contains_treatment("Saffron"));
    assert!(outcome.recommendation.contains_treatment("Lian Zi Xin"));
    assert!(outcome.recommendation.rank_score.is_some());

    // The publish with no subscribers landed in the replay queue
    let sub = service
        .subscribe(outcome.diagnosis_id, Uuid::new_v4())
        .await
        .unwrap();
    let connect = sub.recv().await.unwrap();
    assert_eq!(connect.kind, EventKind::Connect);
    let replayed = sub.recv().await.unwrap();
    assert_eq!(replayed.kind, EventKind::RecommendationUpdate);
    assert_eq!(replayed.diagnosis_id, outcome.diagnosis_id);
}

#[tokio::test]
async fn analysis_rejects_bad_images_without_persisting() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let patient = registered_patient(&service).await;

    let result = service
        .analyze(patient, AnalysisKind::Tongue, b"definitely not an image")
        .await;
    assert!(matches!(result, Err(CoordinatorError::InvalidInput(_))));
}

#[tokio::test]
async fn non_image_kinds_reject_uploads() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let patient = registered_patient(&service).await;

    let result = service.analyze(patient, AnalysisKind::Pulse, JPEG).await;
    assert!(matches!(result, Err(CoordinatorError::InvalidInput(_))));
}

#[tokio::test]
async fn unknown_patient_is_not_found() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let result = service
        .analyze(Uuid::new_v4(), AnalysisKind::Tongue, JPEG)
        .await;
    assert!(matches!(result, Err(CoordinatorError::NotFound(_))));
}

#[tokio::test]
async fn disabled_provider_persists_degraded_diagnosis_then_reanalyze_recovers() {
    // Default config keeps the vision provider disabled
    let ctx = Context::in_memory(knowledge(), TibbConfig::default()).unwrap();
    let service = CoordinatorService::new(ctx);
    let patient = registered_patient(&service).await;

    let err = service
        .analyze(patient, AnalysisKind::Tongue, JPEG)
        .await
        .unwrap_err();
    let CoordinatorError::AnalyzerUnavailable { diagnosis_id, .. } = err else {
        panic!("expected AnalyzerUnavailable, got {err:?}");
    };

    let diagnosis = service
        .context()
        .diagnoses
        .get(diagnosis_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(diagnosis.status, DiagnosisStatus::Degraded);
    assert!(diagnosis.findings.is_degraded());

    // Swap in a working provider and retry just the extraction
    let vision_config = service.context().config.vision_config();
    let ctx = service.context().clone().with_extractor(FeatureExtractor::with_provider(
        vision_config,
        Box::new(StubVision(tongue_response(0.9))),
    ));
    let service = CoordinatorService::new(ctx);

    let outcome = service.reanalyze(diagnosis_id, JPEG).await.unwrap();
    assert_eq!(outcome.diagnosis_id, diagnosis_id);
    assert!(!outcome.matches.is_empty());

    let stored = service
        .context()
        .diagnoses
        .get(diagnosis_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, DiagnosisStatus::Complete);
}

#[tokio::test]
async fn contraindicated_herb_never_reaches_the_patient() {
    let service = service_with_vision(tongue_response(0.8)).await;

    let mut profile = PatientProfile::new(Uuid::new_v4(), 35, Sex::Female);
    profile.contraindicated = vec!["Ginger".to_string()];
    service
        .context()
        .patients
        .upsert_profile(&profile)
        .await
        .unwrap();

    let outcome = service
        .analyze(profile.patient_id, AnalysisKind::Tongue, JPEG)
        .await
        .unwrap();

    assert!(!outcome.recommendation.contains_treatment("Ginger"));
    assert!(outcome.recommendation.contains_treatment("Saffron"));

    let stored = service.recommend(outcome.diagnosis_id).await.unwrap();
    assert!(!stored.contains_treatment("Ginger"));
}

#[tokio::test]
async fn compare_reports_consensus_across_traditions() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let patient = registered_patient(&service).await;
    let outcome = service
        .analyze(patient, AnalysisKind::Tongue, JPEG)
        .await
        .unwrap();

    let view = service.compare(outcome.diagnosis_id).await.unwrap();
    assert_eq!(view.avicenna.len(), 1);
    assert_eq!(view.tcm.len(), 1);
    assert_eq!(view.ayurveda.len(), 1);
    // All three fixtures share the "heat" category
    assert_eq!(view.consensus_tags, vec!["heat"]);
}

#[tokio::test]
async fn feedback_flow_publishes_updates_in_order() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let patient = registered_patient(&service).await;
    let outcome = service
        .analyze(patient, AnalysisKind::Tongue, JPEG)
        .await
        .unwrap();

    let sub = service
        .subscribe(outcome.diagnosis_id, Uuid::new_v4())
        .await
        .unwrap();
    // Drain connect plus the replayed analysis event
    assert_eq!(sub.recv().await.unwrap().kind, EventKind::Connect);
    assert_eq!(
        sub.recv().await.unwrap().kind,
        EventKind::RecommendationUpdate
    );

    let event = FeedbackEvent::new(patient, outcome.recommendation.id, 4).unwrap();
    let ack = service.submit_feedback(event.clone()).await.unwrap();
    assert_eq!(ack.recommendation_id, outcome.recommendation.id);

    let first = sub.recv().await.unwrap();
    assert_eq!(first.kind, EventKind::FeedbackUpdate);
    assert_eq!(first.data["rating"], 4);

    let second = sub.recv().await.unwrap();
    assert_eq!(second.kind, EventKind::EffectivenessUpdate);
    assert_eq!(second.data["sample_size"], 1);

    // The snapshot is now queryable through the logical API
    let snapshot = service
        .effectiveness(Scope::Recommendation, &outcome.recommendation.id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.sample_size, 1);
    assert_eq!(snapshot.trend, Trend::Stable);
    assert!((snapshot.confidence - 0.505).abs() < 1e-9);
}

#[tokio::test]
async fn duplicate_feedback_is_rejected_with_state_unchanged() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let patient = registered_patient(&service).await;
    let outcome = service
        .analyze(patient, AnalysisKind::Tongue, JPEG)
        .await
        .unwrap();

    let event = FeedbackEvent::new(patient, outcome.recommendation.id, 5).unwrap();
    service.submit_feedback(event.clone()).await.unwrap();

    let result = service.submit_feedback(event.clone()).await;
    assert!(matches!(result, Err(CoordinatorError::DuplicateEvent(_))));

    let snapshot = service
        .effectiveness(Scope::Recommendation, &outcome.recommendation.id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.sample_size, 1);
}

#[tokio::test]
async fn feedback_for_unknown_recommendation_is_not_found() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let patient = registered_patient(&service).await;

    let event = FeedbackEvent::new(patient, Uuid::new_v4(), 4).unwrap();
    let result = service.submit_feedback(event).await;
    assert!(matches!(result, Err(CoordinatorError::NotFound(_))));
}

#[tokio::test]
async fn herb_scope_aggregates_through_the_plan() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let patient = registered_patient(&service).await;
    let outcome = service
        .analyze(patient, AnalysisKind::Tongue, JPEG)
        .await
        .unwrap();

    let event = FeedbackEvent::new(patient, outcome.recommendation.id, 4).unwrap();
    service.submit_feedback(event).await.unwrap();

    let herb_snapshot = service
        .effectiveness(Scope::Herb, "Saffron")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(herb_snapshot.sample_size, 1);
    assert_eq!(herb_snapshot.score, 1.0);

    let condition_snapshot = service
        .effectiveness(Scope::Condition, "av_damawi")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(condition_snapshot.sample_size, 1);
}

#[tokio::test]
async fn subscribing_to_unknown_diagnosis_is_not_found() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let result = service.subscribe(Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(result, Err(CoordinatorError::NotFound(_))));
}

#[tokio::test]
async fn trending_surfaces_rated_recommendations() {
    let service = service_with_vision(tongue_response(0.8)).await;
    let patient = registered_patient(&service).await;
    let outcome = service
        .analyze(patient, AnalysisKind::Tongue, JPEG)
        .await
        .unwrap();

    // Five distinct raters clear the default sample floor
    for _ in 0..5 {
        let rater = Uuid::new_v4();
        let event = FeedbackEvent::new(rater, outcome.recommendation.id, 4).unwrap();
        service.submit_feedback(event).await.unwrap();
    }

    let trending = service.trending(10, None).await.unwrap();
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].scope_id, outcome.recommendation.id.to_string());
    assert_eq!(trending[0].sample_size, 5);
}
