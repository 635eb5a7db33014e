use crate::context::{
    AnalyzerEffectiveness, AnalyzerSampleSizes, Context, FeedbackOutcomeArchive,
};
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::models::{AnalysisOutcome, ComparisonView, Diagnosis, DiagnosisStatus};
use broadcast_fabric::{Subscription, UpdateEvent};
use chrono::{DateTime, Utc};
use clinical_common::{AnalysisKind, FindingBag, Tradition};
use feedback_analytics::{EffectivenessSnapshot, FeedbackEvent, Scope};
use matching_engine::MatchSet;
use recommendation_service::{PatientProfile, RankCandidate, RecommendationDraft};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{info, warn};
use uuid::Uuid;
use vision_analysis::VisionError;

/// Knowledge bases small enough to score inside the event loop's latency
/// budget; anything larger goes through the scoring pool
const INLINE_RECORD_BUDGET: usize = 512;

/// Acknowledgement for a persisted feedback event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackAck {
    pub feedback_id: Uuid,
    pub recommendation_id: Uuid,
    pub received_at: DateTime<Utc>,
}

/// Orchestrates the analysis and feedback flows
pub struct CoordinatorService {
    ctx: Context,
    redactor: logger_redacted::PatientRedactor,
}

impl CoordinatorService {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            redactor: logger_redacted::PatientRedactor::default(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    // ========================================================================
    // ANALYSIS FLOW
    // ========================================================================

    /// extract -> match -> compose -> rank -> persist -> publish
    ///
    /// Persistence precedes publication; a failed publish never rolls back
    /// the persisted diagnosis or plan. Extraction failure persists a
    /// degraded diagnosis so the caller can retry just the extraction.
    pub async fn analyze(
        &self,
        patient_id: Uuid,
        kind: AnalysisKind,
        image: &[u8],
    ) -> CoordinatorResult<AnalysisOutcome> {
        if !kind.is_image_kind() {
            return Err(CoordinatorError::InvalidInput(format!(
                "analysis kind {kind} does not accept image uploads"
            )));
        }
        let profile = self.require_profile(patient_id).await?;

        let bag = match self.ctx.extractor.extract(kind, image).await {
            Ok(bag) => bag,
            Err(VisionError::InvalidInput(msg)) => {
                return Err(CoordinatorError::InvalidInput(msg));
            }
            Err(err) => {
                let diagnosis = Diagnosis::degraded(patient_id, kind);
                self.ctx.diagnoses.upsert(&diagnosis).await?;
                warn!(
                    diagnosis_id = %diagnosis.id,
                    error = %err,
                    "extraction failed; diagnosis persisted degraded"
                );
                return Err(CoordinatorError::AnalyzerUnavailable {
                    diagnosis_id: diagnosis.id,
                    reason: err.to_string(),
                });
            }
        };

        self.complete_analysis(Diagnosis::new(patient_id, bag, MatchSet::default()), profile)
            .await
    }

    /// Re-run extraction for a degraded diagnosis and finish the flow under
    /// the same diagnosis id
    pub async fn reanalyze(
        &self,
        diagnosis_id: Uuid,
        image: &[u8],
    ) -> CoordinatorResult<AnalysisOutcome> {
        let existing = self.require_diagnosis(diagnosis_id).await?;
        if existing.status != DiagnosisStatus::Degraded {
            return Err(CoordinatorError::InvalidInput(format!(
                "diagnosis {diagnosis_id} is not degraded"
            )));
        }
        let profile = self.require_profile(existing.patient_id).await?;

        let bag = self
            .ctx
            .extractor
            .extract(existing.kind, image)
            .await
            .map_err(|err| match err {
                VisionError::InvalidInput(msg) => CoordinatorError::InvalidInput(msg),
                other => CoordinatorError::AnalyzerUnavailable {
                    diagnosis_id,
                    reason: other.to_string(),
                },
            })?;

        let mut diagnosis = Diagnosis::new(existing.patient_id, bag, MatchSet::default());
        diagnosis.id = existing.id;
        diagnosis.created_at = existing.created_at;
        self.complete_analysis(diagnosis, profile).await
    }

    async fn complete_analysis(
        &self,
        mut diagnosis: Diagnosis,
        profile: PatientProfile,
    ) -> CoordinatorResult<AnalysisOutcome> {
        diagnosis.matches = self.run_matching(&diagnosis.findings).await?;
        diagnosis.status = DiagnosisStatus::Complete;

        let draft =
            self.ctx
                .composer
                .compose(diagnosis.id, &profile, &diagnosis.matches, &self.ctx.knowledge)?;

        let prior = diagnosis
            .matches
            .all()
            .map(|m| m.score)
            .fold(0.0_f64, f64::max);

        let effectiveness = AnalyzerEffectiveness(self.ctx.analyzer.clone());
        let archive = FeedbackOutcomeArchive {
            feedback: self.ctx.feedback.clone(),
            patients: self.ctx.patients.clone(),
        };
        let ranked = self
            .ctx
            .ranker
            .rank(
                &profile,
                vec![RankCandidate {
                    draft,
                    prior,
                }],
                &effectiveness,
                &archive,
            )
            .await;

        let recommendation = match ranked.into_iter().next() {
            Some(ranked) => {
                let mut draft = ranked.draft;
                draft.rank_score = Some(ranked.composite);
                draft
            }
            // Every entry was contraindicated away; an empty plan still
            // belongs to the diagnosis
            None => RecommendationDraft::new(diagnosis.id, diagnosis.patient_id),
        };

        let confidence = diagnosis
            .matches
            .all()
            .map(|m| m.reported_confidence)
            .fold(0.0_f64, f64::max);

        // Persist before publishing
        self.ctx.diagnoses.upsert(&diagnosis).await?;
        self.ctx.recommendations.upsert(&recommendation).await?;

        self.ctx
            .fabric
            .publish(
                diagnosis.id,
                UpdateEvent::recommendation_update(
                    diagnosis.id,
                    recommendation.id,
                    1,
                    recommendation.version,
                    vec!["entries".to_string()],
                    "analysis complete",
                ),
            )
            .await;

        info!(
            diagnosis_id = %diagnosis.id,
            kind = %diagnosis.kind,
            matches = diagnosis.matches.all().count(),
            plan_entries = recommendation.entries.len(),
            "analysis flow complete"
        );

        Ok(AnalysisOutcome {
            diagnosis_id: diagnosis.id,
            findings: diagnosis.findings,
            matches: diagnosis.matches,
            recommendation,
            confidence,
        })
    }

    async fn run_matching(&self, bag: &FindingBag) -> CoordinatorResult<MatchSet> {
        let total_records: usize = Tradition::ALL
            .iter()
            .map(|t| self.ctx.knowledge.len(*t))
            .sum();

        if total_records <= INLINE_RECORD_BUDGET {
            let lookup = AnalyzerSampleSizes(self.ctx.analyzer.clone());
            return Ok(self.ctx.engine.match_bag(bag, &self.ctx.knowledge, &lookup)?);
        }

        let engine = self.ctx.engine.clone();
        let knowledge = self.ctx.knowledge.clone();
        let analyzer = self.ctx.analyzer.clone();
        let bag = bag.clone();
        let matches = self
            .ctx
            .scoring_pool
            .run(move || {
                let lookup = AnalyzerSampleSizes(analyzer);
                engine.match_bag(&bag, &knowledge, &lookup)
            })
            .await??;
        Ok(matches)
    }

    // ========================================================================
    // READ OPERATIONS
    // ========================================================================

    /// Ranked matches per tradition for a persisted diagnosis
    pub async fn matches(&self, diagnosis_id: Uuid) -> CoordinatorResult<MatchSet> {
        Ok(self.require_diagnosis(diagnosis_id).await?.matches)
    }

    /// The plan composed for a diagnosis
    pub async fn recommend(&self, diagnosis_id: Uuid) -> CoordinatorResult<RecommendationDraft> {
        self.require_diagnosis(diagnosis_id).await?;
        self.ctx
            .recommendations
            .for_diagnosis(diagnosis_id)
            .await?
            .ok_or_else(|| {
                CoordinatorError::NotFound(format!("no recommendation for diagnosis {diagnosis_id}"))
            })
    }

    /// Side-by-side top matches and consensus tags
    pub async fn compare(&self, diagnosis_id: Uuid) -> CoordinatorResult<ComparisonView> {
        let diagnosis = self.require_diagnosis(diagnosis_id).await?;
        Ok(ComparisonView::from_matches(diagnosis_id, &diagnosis.matches))
    }

    pub async fn effectiveness(
        &self,
        scope: Scope,
        scope_id: &str,
    ) -> CoordinatorResult<Option<EffectivenessSnapshot>> {
        Ok(self.ctx.analyzer.snapshot(scope, scope_id).await?)
    }

    pub async fn trending(
        &self,
        limit: usize,
        min_samples: Option<i64>,
    ) -> CoordinatorResult<Vec<EffectivenessSnapshot>> {
        Ok(self.ctx.analyzer.trending(limit, min_samples).await?)
    }

    pub async fn worst_performing(
        &self,
        limit: usize,
        min_samples: Option<i64>,
    ) -> CoordinatorResult<Vec<EffectivenessSnapshot>> {
        Ok(self.ctx.analyzer.worst_performing(limit, min_samples).await?)
    }

    // ========================================================================
    // FEEDBACK FLOW
    // ========================================================================

    /// append -> invalidate -> publish(feedback_update) -> recompute ->
    /// publish(effectiveness_update) -> conditional re-rank
    ///
    /// Errors past the append are logged and surfaced nowhere; the append
    /// itself is the only step that can abort the flow.
    pub async fn submit_feedback(&self, event: FeedbackEvent) -> CoordinatorResult<FeedbackAck> {
        let draft = self
            .ctx
            .recommendations
            .get(event.recommendation_id)
            .await?
            .ok_or_else(|| {
                CoordinatorError::NotFound(format!(
                    "recommendation {} not found",
                    event.recommendation_id
                ))
            })?;

        self.ctx.feedback.append(event.clone()).await?;
        if let Some(text) = &event.free_text {
            // Free text may carry identifiers; only the redacted form is logged
            info!(
                feedback_id = %event.id,
                patient = %self.redactor.correlation_token(event.patient_id),
                note = %self.redactor.redact(text),
                "feedback note received"
            );
        }
        let ack = FeedbackAck {
            feedback_id: event.id,
            recommendation_id: event.recommendation_id,
            received_at: Utc::now(),
        };

        self.ctx
            .analyzer
            .invalidate_for_event(event.recommendation_id)
            .await;

        let diagnosis_id = draft.diagnosis_id;
        self.ctx
            .fabric
            .publish(
                diagnosis_id,
                UpdateEvent::feedback_update(
                    diagnosis_id,
                    event.id,
                    event.symptom_improvement,
                    None,
                ),
            )
            .await;

        match self
            .ctx
            .analyzer
            .snapshot(Scope::Recommendation, &event.recommendation_id.to_string())
            .await
        {
            Ok(Some(snapshot)) => {
                self.ctx
                    .fabric
                    .publish(
                        diagnosis_id,
                        UpdateEvent::effectiveness_update(
                            diagnosis_id,
                            event.recommendation_id,
                            snapshot.score,
                            snapshot.confidence,
                            snapshot.sample_size,
                        ),
                    )
                    .await;
            }
            Ok(None) => {}
            Err(err) => {
                // Previous snapshot stays in place
                warn!(
                    recommendation_id = %event.recommendation_id,
                    error = %err,
                    "snapshot recompute failed after feedback"
                );
            }
        }

        if let Err(err) = self.rerank_for_patient(event.patient_id).await {
            warn!(
                patient_id = %event.patient_id,
                error = %err,
                "re-rank after feedback failed"
            );
        }

        Ok(ack)
    }

    /// Re-rank the patient's active plans; persist and publish only when
    /// the ordering actually changed
    async fn rerank_for_patient(&self, patient_id: Uuid) -> CoordinatorResult<()> {
        let drafts = self.ctx.recommendations.active_for_patient(patient_id).await?;
        if drafts.is_empty() {
            return Ok(());
        }
        let Some(profile) = self.ctx.patients.profile(patient_id).await? else {
            return Ok(());
        };

        let old_order = previous_order(&drafts);

        let candidates: Vec<RankCandidate> = drafts
            .into_iter()
            .map(|draft| {
                let prior = draft
                    .source_matches
                    .iter()
                    .map(|m| m.score)
                    .fold(0.0_f64, f64::max);
                RankCandidate { draft, prior }
            })
            .collect();

        let effectiveness = AnalyzerEffectiveness(self.ctx.analyzer.clone());
        let archive = FeedbackOutcomeArchive {
            feedback: self.ctx.feedback.clone(),
            patients: self.ctx.patients.clone(),
        };
        let ranked = self
            .ctx
            .ranker
            .rank(&profile, candidates, &effectiveness, &archive)
            .await;

        let new_order: Vec<Uuid> = ranked.iter().map(|r| r.draft.id).collect();
        if new_order == old_order {
            return Ok(());
        }

        for entry in ranked {
            let mut draft = entry.draft;
            draft.rank_score = Some(entry.composite);
            let old_version = draft.version.saturating_sub(1);
            self.ctx.recommendations.upsert(&draft).await?;
            self.ctx
                .fabric
                .publish(
                    draft.diagnosis_id,
                    UpdateEvent::recommendation_update(
                        draft.diagnosis_id,
                        draft.id,
                        old_version,
                        draft.version,
                        vec!["rank".to_string()],
                        "feedback re-rank",
                    ),
                )
                .await;
        }
        Ok(())
    }

    // ========================================================================
    // SUBSCRIPTIONS
    // ========================================================================

    /// Subscribe to a diagnosis's update stream
    pub async fn subscribe(
        &self,
        diagnosis_id: Uuid,
        subscriber_id: Uuid,
    ) -> CoordinatorResult<Subscription> {
        self.require_diagnosis(diagnosis_id).await?;
        Ok(self.ctx.fabric.subscribe(diagnosis_id, subscriber_id).await)
    }

    pub async fn unsubscribe(&self, subscription: &Subscription) {
        self.ctx.fabric.unsubscribe(subscription).await;
    }

    /// Liveness marker on a diagnosis stream
    pub async fn heartbeat(&self, diagnosis_id: Uuid) {
        self.ctx
            .fabric
            .publish(diagnosis_id, UpdateEvent::pong(diagnosis_id))
            .await;
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    async fn require_diagnosis(&self, diagnosis_id: Uuid) -> CoordinatorResult<Diagnosis> {
        self.ctx
            .diagnoses
            .get(diagnosis_id)
            .await?
            .ok_or_else(|| CoordinatorError::NotFound(format!("diagnosis {diagnosis_id} not found")))
    }

    async fn require_profile(&self, patient_id: Uuid) -> CoordinatorResult<PatientProfile> {
        self.ctx
            .patients
            .profile(patient_id)
            .await?
            .ok_or_else(|| CoordinatorError::NotFound(format!("patient {patient_id} not found")))
    }
}

/// Ranking order currently on record: composite score descending, unranked
/// drafts last, id as the final tie-break
fn previous_order(drafts: &[RecommendationDraft]) -> Vec<Uuid> {
    let mut sorted: Vec<&RecommendationDraft> = drafts.iter().collect();
    sorted.sort_by(|a, b| {
        let a_score = a.rank_score.unwrap_or(f64::NEG_INFINITY);
        let b_score = b.rank_score.unwrap_or(f64::NEG_INFINITY);
        b_score
            .partial_cmp(&a_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted.into_iter().map(|d| d.id).collect()
}
