use crate::error::{KnowledgeError, KnowledgeResult};
use crate::records::{TraditionRecord, TreatmentEntry};
use clinical_common::{Dosha, Mizaj, Tradition};
use std::collections::HashMap;
use tracing::info;

/// In-memory knowledge base over the three tradition schemas
///
/// Built once at startup; all lookups are lock-free reads. Secondary indexes
/// hold record ids and resolve through the primary id index.
pub struct KnowledgeStore {
    records: HashMap<Tradition, Vec<TraditionRecord>>,
    by_id: HashMap<(Tradition, String), usize>,
    by_category: HashMap<(Tradition, String), Vec<String>>,
    by_mizaj: HashMap<Mizaj, Vec<String>>,
    by_dosha: HashMap<Dosha, Vec<String>>,
    by_organ: HashMap<String, Vec<String>>,
}

impl KnowledgeStore {
    /// Build the store and all indexes from a flat record list
    ///
    /// Rejects duplicate ids within a tradition; index integrity is checked
    /// here so runtime reads never have to.
    pub fn from_records(all: Vec<TraditionRecord>) -> KnowledgeResult<Self> {
        let mut records: HashMap<Tradition, Vec<TraditionRecord>> = HashMap::new();
        let mut by_id = HashMap::new();
        let mut by_category: HashMap<(Tradition, String), Vec<String>> = HashMap::new();
        let mut by_mizaj: HashMap<Mizaj, Vec<String>> = HashMap::new();
        let mut by_dosha: HashMap<Dosha, Vec<String>> = HashMap::new();
        let mut by_organ: HashMap<String, Vec<String>> = HashMap::new();

        for record in all {
            let tradition = record.tradition();
            let key = (tradition, record.id.clone());
            let slot = records.entry(tradition).or_default();

            if by_id.contains_key(&key) {
                return Err(KnowledgeError::DuplicateRecord(format!(
                    "{}/{}",
                    tradition, record.id
                )));
            }

            by_category
                .entry((tradition, record.category.clone()))
                .or_default()
                .push(record.id.clone());

            if let Some(mizaj) = record.mizaj() {
                by_mizaj.entry(mizaj).or_default().push(record.id.clone());
            }
            if let Some(dosha) = record.dosha() {
                by_dosha.entry(dosha).or_default().push(record.id.clone());
            }
            for organ in record.organs() {
                by_organ
                    .entry(organ.to_lowercase())
                    .or_default()
                    .push(record.id.clone());
            }

            by_id.insert(key, slot.len());
            slot.push(record);
        }

        let total: usize = records.values().map(Vec::len).sum();
        info!(total_records = total, "knowledge store built");

        Ok(Self {
            records,
            by_id,
            by_category,
            by_mizaj,
            by_dosha,
            by_organ,
        })
    }

    /// All records of one tradition; empty when none are loaded
    pub fn records(&self, tradition: Tradition) -> &[TraditionRecord] {
        self.records
            .get(&tradition)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up one record by id
    pub fn record(&self, tradition: Tradition, id: &str) -> KnowledgeResult<&TraditionRecord> {
        self.by_id
            .get(&(tradition, id.to_string()))
            .map(|idx| &self.records[&tradition][*idx])
            .ok_or_else(|| KnowledgeError::NotFound(format!("{}/{}", tradition, id)))
    }

    /// Treatments associated with a record
    pub fn treatments(
        &self,
        tradition: Tradition,
        record_id: &str,
    ) -> KnowledgeResult<&[TreatmentEntry]> {
        Ok(&self.record(tradition, record_id)?.treatments)
    }

    /// Records of a tradition within a category
    pub fn by_category(&self, tradition: Tradition, category: &str) -> Vec<&TraditionRecord> {
        self.resolve(
            tradition,
            self.by_category
                .get(&(tradition, category.to_string()))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        )
    }

    /// Avicennan records with the given constitutional type
    pub fn by_mizaj(&self, mizaj: Mizaj) -> Vec<&TraditionRecord> {
        self.resolve(
            Tradition::Avicenna,
            self.by_mizaj.get(&mizaj).map(Vec::as_slice).unwrap_or(&[]),
        )
    }

    /// Ayurvedic records with the given dominant dosha
    pub fn by_dosha(&self, dosha: Dosha) -> Vec<&TraditionRecord> {
        self.resolve(
            Tradition::Ayurveda,
            self.by_dosha.get(&dosha).map(Vec::as_slice).unwrap_or(&[]),
        )
    }

    /// TCM records affecting the given organ
    pub fn by_organ(&self, organ: &str) -> Vec<&TraditionRecord> {
        self.resolve(
            Tradition::Tcm,
            self.by_organ
                .get(&organ.to_lowercase())
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        )
    }

    pub fn is_empty(&self, tradition: Tradition) -> bool {
        self.records(tradition).is_empty()
    }

    pub fn len(&self, tradition: Tradition) -> usize {
        self.records(tradition).len()
    }

    fn resolve(&self, tradition: Tradition, ids: &[String]) -> Vec<&TraditionRecord> {
        ids.iter()
            .filter_map(|id| self.record(tradition, id).ok())
            .collect()
    }
}
