use chrono::{DateTime, Utc};
use clinical_common::{AnalysisKind, FindingBag, Tradition};
use matching_engine::{MatchResult, MatchSet};
use recommendation_service::RecommendationDraft;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Diagnosis lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisStatus {
    /// Extraction and matching completed
    Complete,
    /// Extraction failed; findings empty, extraction may be retried
    Degraded,
}

/// One persisted diagnosis: the finding bag and its matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub kind: AnalysisKind,
    pub status: DiagnosisStatus,
    pub findings: FindingBag,
    pub matches: MatchSet,
    pub created_at: DateTime<Utc>,
}

impl Diagnosis {
    pub fn new(patient_id: Uuid, findings: FindingBag, matches: MatchSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            kind: findings.kind,
            status: DiagnosisStatus::Complete,
            findings,
            matches,
            created_at: Utc::now(),
        }
    }

    /// Placeholder diagnosis persisted when extraction fails, so the caller
    /// can retry just the extraction
    pub fn degraded(patient_id: Uuid, kind: AnalysisKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            kind,
            status: DiagnosisStatus::Degraded,
            findings: FindingBag::degraded(kind),
            matches: MatchSet::default(),
            created_at: Utc::now(),
        }
    }
}

/// Result of the analysis flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub diagnosis_id: Uuid,
    pub findings: FindingBag,
    pub matches: MatchSet,
    pub recommendation: RecommendationDraft,
    /// Best reported confidence across all matched traditions
    pub confidence: f64,
}

/// Side-by-side view across the three traditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonView {
    pub diagnosis_id: Uuid,
    pub avicenna: Vec<MatchResult>,
    pub tcm: Vec<MatchResult>,
    pub ayurveda: Vec<MatchResult>,
    /// Categories the traditions agree on (named by at least two of them)
    pub consensus_tags: Vec<String>,
}

impl ComparisonView {
    pub fn from_matches(diagnosis_id: Uuid, matches: &MatchSet) -> Self {
        let mut category_traditions: HashMap<String, Vec<Tradition>> = HashMap::new();
        for result in matches.all() {
            let entry = category_traditions
                .entry(result.category.to_lowercase())
                .or_default();
            if !entry.contains(&result.tradition) {
                entry.push(result.tradition);
            }
        }

        let mut consensus_tags: Vec<String> = category_traditions
            .into_iter()
            .filter(|(_, traditions)| traditions.len() >= 2)
            .map(|(category, _)| category)
            .collect();
        consensus_tags.sort();

        Self {
            diagnosis_id,
            avicenna: matches.avicenna.clone(),
            tcm: matches.tcm.clone(),
            ayurveda: matches.ayurveda.clone(),
            consensus_tags,
        }
    }
}
