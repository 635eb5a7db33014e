use crate::adjacency::adjacent;
use crate::error::{MatchingError, MatchingResult};
use crate::result::{MatchResult, MatchSet};
use crate::weights::{weight_class, WeightClass, AVICENNA_POOL};
use clinical_common::{Attribute, AttributeValue, FindingBag, FindingMap, Severity, Tradition};
use knowledge_store::{KnowledgeStore, TraditionRecord};
use std::cmp::Ordering;
use tracing::debug;

/// Effectiveness sample sizes used only for tie-breaking
///
/// Implemented by the analytics layer; matching itself stays a pure
/// function of its inputs.
pub trait SampleSizeLookup: Send + Sync {
    fn sample_size(&self, tradition: Tradition, record_id: &str) -> Option<i64>;
}

/// Lookup for contexts with no feedback history
pub struct NoEffectivenessData;

impl SampleSizeLookup for NoEffectivenessData {
    fn sample_size(&self, _tradition: Tradition, _record_id: &str) -> Option<i64> {
        None
    }
}

const SUPPORTING_LIMIT: usize = 5;

/// Diagnostic matching engine
pub struct MatchingEngine {
    top_k: usize,
    score_threshold: f64,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self {
            top_k: 5,
            score_threshold: 0.5,
        }
    }

    /// Top matches for every tradition
    pub fn match_bag(
        &self,
        bag: &FindingBag,
        store: &KnowledgeStore,
        lookup: &dyn SampleSizeLookup,
    ) -> MatchingResult<MatchSet> {
        let mut set = MatchSet::default();
        for tradition in Tradition::ALL {
            set.set_tradition(tradition, self.match_tradition(bag, store, tradition, lookup)?);
        }
        Ok(set)
    }

    /// Top matches within one tradition
    ///
    /// An all-absent finding bag yields an empty list; a tradition with no
    /// records at all is a hard configuration error.
    pub fn match_tradition(
        &self,
        bag: &FindingBag,
        store: &KnowledgeStore,
        tradition: Tradition,
        lookup: &dyn SampleSizeLookup,
    ) -> MatchingResult<Vec<MatchResult>> {
        let records = store.records(tradition);
        if records.is_empty() {
            return Err(MatchingError::EmptyKnowledge(tradition.to_string()));
        }
        if bag.findings.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(MatchResult, i64)> = records
            .iter()
            .filter_map(|record| self.score_record(bag, tradition, record))
            .filter(|result| result.score >= self.score_threshold)
            .map(|result| {
                let samples = lookup
                    .sample_size(tradition, &result.record_id)
                    .unwrap_or(-1);
                (result, samples)
            })
            .collect();

        // Rank: score, then feedback volume, then stable id order
        scored.sort_by(|(a, a_samples), (b, b_samples)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b_samples.cmp(a_samples))
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        scored.truncate(self.top_k);

        debug!(
            tradition = %tradition,
            candidates = records.len(),
            matched = scored.len(),
            "tradition matching complete"
        );

        Ok(scored.into_iter().map(|(result, _)| result).collect())
    }

    fn score_record(
        &self,
        bag: &FindingBag,
        tradition: Tradition,
        record: &TraditionRecord,
    ) -> Option<MatchResult> {
        let record_map = record.scoring_map();
        let scored = score_maps(tradition, &bag.findings, &record_map)?;

        let score = scored.score;
        let reported_confidence = (score * bag.confidence).clamp(0.0, 1.0);

        Some(MatchResult {
            tradition,
            record_id: record.id.clone(),
            record_name: record.name.clone(),
            category: record.category.clone(),
            score,
            reported_confidence,
            severity: Severity::from_score(score),
            supporting_findings: scored.supporting,
        })
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct ScoredMaps {
    score: f64,
    supporting: Vec<(Attribute, AttributeValue)>,
}

/// Normalized weighted agreement between two finding maps
///
/// Only attributes present in both maps participate. Returns `None` when no
/// scored attribute overlaps, which excludes the record rather than giving
/// it a free score.
fn score_maps(tradition: Tradition, bag: &FindingMap, record: &FindingMap) -> Option<ScoredMaps> {
    struct Term {
        attribute: Attribute,
        value: AttributeValue,
        class: WeightClass,
        matched: f64,
    }

    let mut terms = Vec::new();
    let mut pooled_count = 0usize;

    for (attribute, bag_value) in bag.attributes() {
        let Some(record_value) = record.get(attribute) else {
            continue;
        };
        let Some(class) = weight_class(tradition, attribute) else {
            continue;
        };
        if matches!(class, WeightClass::Pooled) {
            pooled_count += 1;
        }
        terms.push(Term {
            attribute,
            value: bag_value,
            class,
            matched: match_value(&bag_value, &record_value),
        });
    }

    if terms.is_empty() {
        return None;
    }

    let pooled_weight = if pooled_count > 0 {
        AVICENNA_POOL / pooled_count as f64
    } else {
        0.0
    };

    let mut total_weight = 0.0;
    let mut matched_weight = 0.0;
    let mut supporting: Vec<(Attribute, AttributeValue, f64)> = Vec::new();

    for term in &terms {
        let weight = match term.class {
            WeightClass::Fixed(w) => w,
            WeightClass::Pooled => pooled_weight,
        };
        total_weight += weight;
        let contribution = weight * term.matched;
        matched_weight += contribution;
        if contribution > 0.0 {
            supporting.push((term.attribute, term.value, contribution));
        }
    }

    if total_weight <= 0.0 {
        return None;
    }

    supporting.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
    supporting.truncate(SUPPORTING_LIMIT);

    Some(ScoredMaps {
        score: matched_weight / total_weight,
        supporting: supporting.into_iter().map(|(a, v, _)| (a, v)).collect(),
    })
}

/// 1 on exact enumerated equality, 0.5 on declared adjacency, else 0
fn match_value(a: &AttributeValue, b: &AttributeValue) -> f64 {
    if a == b {
        1.0
    } else if adjacent(a, b) {
        0.5
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinical_common::{AnalysisKind, Mizaj, Moisture, TongueCoating, TongueColor, TongueShape};
    use knowledge_store::{TraditionDetail, TraditionRecord};
    use std::collections::HashMap;

    fn tongue_bag(confidence: f64, map: FindingMap) -> FindingBag {
        FindingBag::new(AnalysisKind::Tongue, map, confidence)
    }

    fn avicenna_record(id: &str, map: FindingMap, mizaj: Mizaj) -> TraditionRecord {
        TraditionRecord {
            id: id.to_string(),
            name: format!("record {id}"),
            category: "fever".to_string(),
            characteristics: map,
            contraindications: vec![],
            treatments: vec![],
            detail: TraditionDetail::Avicenna { mizaj },
        }
    }

    fn tcm_record(id: &str, map: FindingMap) -> TraditionRecord {
        TraditionRecord {
            id: id.to_string(),
            name: format!("record {id}"),
            category: "heat".to_string(),
            characteristics: map,
            contraindications: vec![],
            treatments: vec![],
            detail: TraditionDetail::Tcm {
                organs: vec!["Heart".to_string()],
                meridians: vec![],
                imbalance: "excess_heat".to_string(),
            },
        }
    }

    struct FixedSamples(HashMap<String, i64>);

    impl SampleSizeLookup for FixedSamples {
        fn sample_size(&self, _tradition: Tradition, record_id: &str) -> Option<i64> {
            self.0.get(record_id).copied()
        }
    }

    #[test]
    fn perfect_avicenna_match_scores_one() {
        // Record and bag agree on mizaj, color, coating and moisture
        let store = KnowledgeStore::from_records(vec![avicenna_record(
            "r1",
            FindingMap {
                color: Some(TongueColor::Red),
                coating: Some(TongueCoating::ThinWhite),
                moisture: Some(Moisture::Normal),
                ..Default::default()
            },
            Mizaj::GarmTar,
        )])
        .unwrap();

        let bag = tongue_bag(
            0.8,
            FindingMap {
                color: Some(TongueColor::Red),
                coating: Some(TongueCoating::ThinWhite),
                moisture: Some(Moisture::Normal),
                mizaj: Some(Mizaj::GarmTar),
                ..Default::default()
            },
        );

        let engine = MatchingEngine::new();
        let matches = engine
            .match_tradition(&bag, &store, Tradition::Avicenna, &NoEffectivenessData)
            .unwrap();

        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert!((m.score - 1.0).abs() < 1e-9);
        assert!((m.reported_confidence - 0.8).abs() < 1e-9);
        assert_eq!(m.severity, Severity::High);
        assert_eq!(m.supporting_findings.len(), 4);
        // Strongest contribution first
        assert_eq!(m.supporting_findings[0].0, Attribute::Mizaj);
    }

    #[test]
    fn adjacency_earns_half_credit() {
        let store = KnowledgeStore::from_records(vec![tcm_record(
            "t1",
            FindingMap {
                color: Some(TongueColor::Red),
                coating: Some(TongueCoating::ThinWhite),
                ..Default::default()
            },
        )])
        .unwrap();

        // Crimson is adjacent to red: 0.30*0.5 + 0.30*1.0 over 0.60
        let bag = tongue_bag(
            1.0,
            FindingMap {
                color: Some(TongueColor::Crimson),
                coating: Some(TongueCoating::ThinWhite),
                ..Default::default()
            },
        );

        let engine = MatchingEngine::new();
        let matches = engine
            .match_tradition(&bag, &store, Tradition::Tcm, &NoEffectivenessData)
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert!((matches[0].score - 0.75).abs() < 1e-9);
        assert_eq!(matches[0].severity, Severity::Moderate);
    }

    #[test]
    fn below_threshold_records_are_not_reported() {
        let store = KnowledgeStore::from_records(vec![tcm_record(
            "t1",
            FindingMap {
                color: Some(TongueColor::Pale),
                coating: Some(TongueCoating::Greasy),
                moisture: Some(Moisture::Wet),
                shape: Some(TongueShape::Swollen),
                ..Default::default()
            },
        )])
        .unwrap();

        // Only coating agrees: 0.30 / 1.0 raw score
        let bag = tongue_bag(
            1.0,
            FindingMap {
                color: Some(TongueColor::Dark),
                coating: Some(TongueCoating::Greasy),
                moisture: Some(Moisture::Dry),
                shape: Some(TongueShape::Thin),
                ..Default::default()
            },
        );

        let engine = MatchingEngine::new();
        let matches = engine
            .match_tradition(&bag, &store, Tradition::Tcm, &NoEffectivenessData)
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn all_absent_bag_yields_empty_matches() {
        let store = KnowledgeStore::from_records(vec![tcm_record(
            "t1",
            FindingMap {
                color: Some(TongueColor::Red),
                ..Default::default()
            },
        )])
        .unwrap();

        let bag = tongue_bag(0.9, FindingMap::default());
        let engine = MatchingEngine::new();
        let matches = engine
            .match_tradition(&bag, &store, Tradition::Tcm, &NoEffectivenessData)
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn empty_tradition_is_a_configuration_error() {
        let store = KnowledgeStore::from_records(vec![tcm_record(
            "t1",
            FindingMap {
                color: Some(TongueColor::Red),
                ..Default::default()
            },
        )])
        .unwrap();

        let bag = tongue_bag(
            1.0,
            FindingMap {
                color: Some(TongueColor::Red),
                ..Default::default()
            },
        );
        let engine = MatchingEngine::new();
        let result = engine.match_tradition(&bag, &store, Tradition::Avicenna, &NoEffectivenessData);
        assert!(matches!(result, Err(MatchingError::EmptyKnowledge(_))));
    }

    #[test]
    fn score_ties_break_on_feedback_volume_then_id() {
        let map = FindingMap {
            color: Some(TongueColor::Red),
            coating: Some(TongueCoating::ThinWhite),
            ..Default::default()
        };
        let store = KnowledgeStore::from_records(vec![
            tcm_record("t3", map.clone()),
            tcm_record("t7", map.clone()),
            tcm_record("t5", map.clone()),
        ])
        .unwrap();

        let bag = tongue_bag(1.0, map);
        let engine = MatchingEngine::new();

        // t7 has feedback history; t3 and t5 fall back to id order
        let lookup = FixedSamples(HashMap::from([("t7".to_string(), 50)]));
        let matches = engine
            .match_tradition(&bag, &store, Tradition::Tcm, &lookup)
            .unwrap();

        let ids: Vec<_> = matches.iter().map(|m| m.record_id.as_str()).collect();
        assert_eq!(ids, vec!["t7", "t3", "t5"]);
    }

    #[test]
    fn only_top_five_are_reported() {
        let map = FindingMap {
            color: Some(TongueColor::Red),
            coating: Some(TongueCoating::ThinWhite),
            ..Default::default()
        };
        let records = (0..8)
            .map(|i| tcm_record(&format!("t{i}"), map.clone()))
            .collect();
        let store = KnowledgeStore::from_records(records).unwrap();

        let bag = tongue_bag(1.0, map);
        let engine = MatchingEngine::new();
        let matches = engine
            .match_tradition(&bag, &store, Tradition::Tcm, &NoEffectivenessData)
            .unwrap();
        assert_eq!(matches.len(), 5);
    }

    #[test]
    fn avicenna_pool_splits_across_minor_attributes() {
        // Headline: mizaj + color match. Minor: cracks matches, shape does not.
        let store = KnowledgeStore::from_records(vec![avicenna_record(
            "r1",
            FindingMap {
                color: Some(TongueColor::Red),
                cracks: Some(true),
                shape: Some(TongueShape::Normal),
                ..Default::default()
            },
            Mizaj::GarmKhoshk,
        )])
        .unwrap();

        let bag = tongue_bag(
            1.0,
            FindingMap {
                color: Some(TongueColor::Red),
                cracks: Some(true),
                shape: Some(TongueShape::Swollen),
                mizaj: Some(Mizaj::GarmKhoshk),
                ..Default::default()
            },
        );

        let engine = MatchingEngine::new();
        let matches = engine
            .match_tradition(&bag, &store, Tradition::Avicenna, &NoEffectivenessData)
            .unwrap();

        // Weights: mizaj .30 + color .20 + cracks .075 over .65
        let expected = (0.30 + 0.20 + 0.075) / (0.30 + 0.20 + 0.075 + 0.075);
        assert_eq!(matches.len(), 1);
        assert!((matches[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn reported_confidence_is_clipped_and_scaled() {
        let map = FindingMap {
            color: Some(TongueColor::Red),
            coating: Some(TongueCoating::ThinWhite),
            ..Default::default()
        };
        let store = KnowledgeStore::from_records(vec![tcm_record("t1", map.clone())]).unwrap();

        let bag = tongue_bag(0.5, map);
        let engine = MatchingEngine::new();
        let matches = engine
            .match_tradition(&bag, &store, Tradition::Tcm, &NoEffectivenessData)
            .unwrap();
        assert!((matches[0].reported_confidence - 0.5).abs() < 1e-9);
        assert!(matches[0].reported_confidence <= 1.0);
    }

    #[test]
    fn matching_is_deterministic() {
        let map = FindingMap {
            color: Some(TongueColor::Red),
            coating: Some(TongueCoating::ThinWhite),
            moisture: Some(Moisture::Dry),
            ..Default::default()
        };
        let store = KnowledgeStore::from_records(vec![
            tcm_record("a", map.clone()),
            tcm_record("b", map.clone()),
        ])
        .unwrap();
        let bag = tongue_bag(0.9, map);
        let engine = MatchingEngine::new();

        let first = engine
            .match_tradition(&bag, &store, Tradition::Tcm, &NoEffectivenessData)
            .unwrap();
        let second = engine
            .match_tradition(&bag, &store, Tradition::Tcm, &NoEffectivenessData)
            .unwrap();
        let ids = |matches: &[MatchResult]| {
            matches
                .iter()
                .map(|m| (m.record_id.clone(), m.score))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }
}
