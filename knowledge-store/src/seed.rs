use crate::error::{KnowledgeError, KnowledgeResult};
use crate::records::TraditionRecord;
use crate::store::KnowledgeStore;
use serde::Deserialize;

/// Wire shape of a seed document
#[derive(Debug, Deserialize)]
pub struct SeedDocument {
    pub records: Vec<TraditionRecord>,
}

impl KnowledgeStore {
    /// Build a store from one JSON seed document
    pub fn from_json_str(json: &str) -> KnowledgeResult<Self> {
        let doc: SeedDocument = serde_json::from_str(json)?;
        if doc.records.is_empty() {
            return Err(KnowledgeError::InvalidSeed(
                "seed document contains no records".to_string(),
            ));
        }
        Self::from_records(doc.records)
    }

    /// Build a store from several seed documents (typically one per tradition)
    pub fn from_json_documents<'a>(
        documents: impl IntoIterator<Item = &'a str>,
    ) -> KnowledgeResult<Self> {
        let mut all = Vec::new();
        for json in documents {
            let doc: SeedDocument = serde_json::from_str(json)?;
            all.extend(doc.records);
        }
        if all.is_empty() {
            return Err(KnowledgeError::InvalidSeed(
                "no records across seed documents".to_string(),
            ));
        }
        Self::from_records(all)
    }
}
