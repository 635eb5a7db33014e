use chrono::{DateTime, Utc};
use clinical_common::{Dosha, Mizaj, Tradition};
use knowledge_store::{TreatmentEntry, TreatmentKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Backlink from a plan to the match it was composed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMatch {
    pub tradition: Tradition,
    pub record_id: String,
    pub score: f64,
}

/// One treatment in a plan, with provenance and its expected effectiveness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub treatment: TreatmentEntry,
    /// Knowledge record the treatment came from
    pub source_record_id: String,
    /// Sort key within the plan; starts as the match prior and is refined
    /// by effectiveness data on re-rank
    pub expected_effectiveness: f64,
}

/// A per-diagnosis treatment plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationDraft {
    pub id: Uuid,
    pub diagnosis_id: Uuid,
    pub patient_id: Uuid,
    pub entries: Vec<PlanEntry>,
    pub source_matches: Vec<SourceMatch>,
    /// Increments on every re-rank
    pub version: u32,
    /// Composite score from the most recent ranking pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_score: Option<f64>,
    /// Advisory plan length
    pub duration_days: u32,
    /// Advisory follow-up marker
    pub follow_up_days: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecommendationDraft {
    pub fn new(diagnosis_id: Uuid, patient_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            diagnosis_id,
            patient_id,
            entries: Vec::new(),
            source_matches: Vec::new(),
            version: 1,
            rank_score: None,
            duration_days: 30,
            follow_up_days: 14,
            created_at: now,
            updated_at: now,
        }
    }

    /// Entries of one kind, best expected effectiveness first
    pub fn entries_of_kind(&self, kind: TreatmentKind) -> Vec<&PlanEntry> {
        let mut entries: Vec<&PlanEntry> = self
            .entries
            .iter()
            .filter(|e| e.treatment.kind == kind)
            .collect();
        entries.sort_by(|a, b| {
            b.expected_effectiveness
                .partial_cmp(&a.expected_effectiveness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        entries
    }

    /// Entries of one tradition, in plan order
    pub fn entries_of_tradition(&self, tradition: Tradition) -> Vec<&PlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.treatment.tradition == tradition)
            .collect()
    }

    /// Herb names contained in the plan
    pub fn herbs(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.treatment.kind == TreatmentKind::Herb)
            .map(|e| e.treatment.name.as_str())
            .collect()
    }

    pub fn contains_treatment(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.treatment.name.eq_ignore_ascii_case(name))
    }

    /// Knowledge record ids the plan was composed from
    pub fn condition_ids(&self) -> Vec<&str> {
        self.source_matches
            .iter()
            .map(|m| m.record_id.as_str())
            .collect()
    }

    pub fn bump_version(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Patient sex as recorded for similarity bucketing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

/// Outcome of a past recommendation for this patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorOutcome {
    pub recommendation_id: Uuid,
    pub condition_id: String,
    pub tradition: Tradition,
    pub successful: bool,
}

/// Patient constitution and history, consumed by the ranker and the
/// composer's contraindication filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub patient_id: Uuid,
    pub age_years: u32,
    pub sex: Sex,
    pub mizaj: Option<Mizaj>,
    pub dosha: Option<Dosha>,
    /// Substance and treatment names this patient must not receive
    pub contraindicated: Vec<String>,
    pub history: Vec<PriorOutcome>,
}

impl PatientProfile {
    pub fn new(patient_id: Uuid, age_years: u32, sex: Sex) -> Self {
        Self {
            patient_id,
            age_years,
            sex,
            mizaj: None,
            dosha: None,
            contraindicated: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn is_contraindicated(&self, name: &str) -> bool {
        self.contraindicated
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Whether any caution on the treatment names this patient's
    /// contraindication list
    pub fn flags_treatment(&self, treatment: &TreatmentEntry) -> bool {
        self.is_contraindicated(&treatment.name)
            || treatment
                .cautions
                .iter()
                .any(|caution| self.is_contraindicated(caution))
    }

    fn age_bucket(&self) -> usize {
        match self.age_years {
            0..=12 => 0,
            13..=25 => 1,
            26..=40 => 2,
            41..=60 => 3,
            _ => 4,
        }
    }

    /// 0/1 feature vector over age bucket, sex, constitutional type and
    /// tradition history, used for cosine similarity between patients
    pub fn feature_vector(&self) -> Vec<f64> {
        let mut features = vec![0.0; 22];

        features[self.age_bucket()] = 1.0;

        let sex_offset = 5;
        features[sex_offset
            + match self.sex {
                Sex::Male => 0,
                Sex::Female => 1,
                Sex::Other => 2,
            }] = 1.0;

        let mizaj_offset = 8;
        if let Some(mizaj) = self.mizaj {
            features[mizaj_offset
                + match mizaj {
                    Mizaj::GarmKhoshk => 0,
                    Mizaj::GarmTar => 1,
                    Mizaj::SardKhoshk => 2,
                    Mizaj::SardTar => 3,
                }] = 1.0;
        }

        let dosha_offset = 12;
        if let Some(dosha) = self.dosha {
            features[dosha_offset
                + match dosha {
                    Dosha::Vata => 0,
                    Dosha::Pitta => 1,
                    Dosha::Kapha => 2,
                    Dosha::VataPitta => 3,
                    Dosha::PittaKapha => 4,
                    Dosha::VataKapha => 5,
                    Dosha::Tridosha => 6,
                }] = 1.0;
        }

        let tradition_offset = 19;
        for outcome in &self.history {
            features[tradition_offset
                + match outcome.tradition {
                    Tradition::Avicenna => 0,
                    Tradition::Tcm => 1,
                    Tradition::Ayurveda => 2,
                }] = 1.0;
        }

        features
    }
}
