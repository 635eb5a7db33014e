use clinical_common::{Dosha, FindingMap, Mizaj, Tradition};
use serde::{Deserialize, Serialize};

/// Treatment payload kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentKind {
    Herb,
    Food,
    Lifestyle,
    Procedure,
}

impl TreatmentKind {
    pub const ALL: [TreatmentKind; 4] = [
        TreatmentKind::Herb,
        TreatmentKind::Food,
        TreatmentKind::Lifestyle,
        TreatmentKind::Procedure,
    ];
}

/// A single treatment belonging to a tradition record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentEntry {
    pub tradition: Tradition,
    pub kind: TreatmentKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub cautions: Vec<String>,
    /// Citation into the source tradition's literature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl TreatmentEntry {
    pub fn new(tradition: Tradition, kind: TreatmentKind, name: impl Into<String>) -> Self {
        Self {
            tradition,
            kind,
            name: name.into(),
            dosage: None,
            frequency: None,
            duration: None,
            cautions: Vec::new(),
            reference: None,
        }
    }

    pub fn with_dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = Some(dosage.into());
        self
    }

    pub fn with_cautions(mut self, cautions: Vec<String>) -> Self {
        self.cautions = cautions;
        self
    }
}

/// Tradition-specific record payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tradition", rename_all = "lowercase")]
pub enum TraditionDetail {
    Avicenna {
        mizaj: Mizaj,
    },
    Tcm {
        #[serde(default)]
        organs: Vec<String>,
        #[serde(default)]
        meridians: Vec<String>,
        imbalance: String,
    },
    Ayurveda {
        dosha: Dosha,
    },
}

impl TraditionDetail {
    pub fn tradition(&self) -> Tradition {
        match self {
            TraditionDetail::Avicenna { .. } => Tradition::Avicenna,
            TraditionDetail::Tcm { .. } => Tradition::Tcm,
            TraditionDetail::Ayurveda { .. } => Tradition::Ayurveda,
        }
    }
}

/// One disease/pattern record of a tradition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraditionRecord {
    /// Stable id, unique within the tradition
    pub id: String,
    /// Localized display name
    pub name: String,
    pub category: String,
    /// Characteristic presentation, same shape as an extracted finding bag
    pub characteristics: FindingMap,
    #[serde(default)]
    pub contraindications: Vec<String>,
    #[serde(default)]
    pub treatments: Vec<TreatmentEntry>,
    #[serde(flatten)]
    pub detail: TraditionDetail,
}

impl TraditionRecord {
    pub fn tradition(&self) -> Tradition {
        self.detail.tradition()
    }

    pub fn mizaj(&self) -> Option<Mizaj> {
        match &self.detail {
            TraditionDetail::Avicenna { mizaj } => Some(*mizaj),
            _ => None,
        }
    }

    pub fn dosha(&self) -> Option<Dosha> {
        match &self.detail {
            TraditionDetail::Ayurveda { dosha } => Some(*dosha),
            _ => None,
        }
    }

    pub fn organs(&self) -> &[String] {
        match &self.detail {
            TraditionDetail::Tcm { organs, .. } => organs,
            _ => &[],
        }
    }

    /// Characteristic map with the constitutional attribute folded in, which
    /// is the map the matching engine scores against.
    pub fn scoring_map(&self) -> FindingMap {
        let mut map = self.characteristics.clone();
        if map.mizaj.is_none() {
            map.mizaj = self.mizaj();
        }
        if map.dosha.is_none() {
            map.dosha = self.dosha();
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinical_common::{TongueCoating, TongueColor};

    fn avicenna_record() -> TraditionRecord {
        TraditionRecord {
            id: "av_safrawi_humma".to_string(),
            name: "Safrawi fever".to_string(),
            category: "fever".to_string(),
            characteristics: FindingMap {
                color: Some(TongueColor::Red),
                coating: Some(TongueCoating::ThinYellow),
                ..Default::default()
            },
            contraindications: vec![],
            treatments: vec![],
            detail: TraditionDetail::Avicenna {
                mizaj: Mizaj::GarmKhoshk,
            },
        }
    }

    #[test]
    fn scoring_map_folds_in_constitution() {
        let record = avicenna_record();
        assert!(record.characteristics.mizaj.is_none());
        let map = record.scoring_map();
        assert_eq!(map.mizaj, Some(Mizaj::GarmKhoshk));
        assert_eq!(map.color, Some(TongueColor::Red));
    }

    #[test]
    fn record_round_trips_with_flattened_detail() {
        let record = avicenna_record();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"tradition\":\"avicenna\""));
        let back: TraditionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.tradition(), Tradition::Avicenna);
    }
}
