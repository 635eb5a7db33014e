use clinical_common::{Attribute, AttributeValue, Severity, Tradition};
use serde::{Deserialize, Serialize};

/// One scored candidate from a tradition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub tradition: Tradition,
    pub record_id: String,
    pub record_name: String,
    pub category: String,
    /// Raw weighted attribute agreement in [0, 1]
    pub score: f64,
    /// `score` scaled by the extraction confidence, clipped to [0, 1]
    pub reported_confidence: f64,
    pub severity: Severity,
    /// Finding attributes that contributed positively, strongest first,
    /// at most five entries
    pub supporting_findings: Vec<(Attribute, AttributeValue)>,
}

/// Top matches per tradition for one finding bag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchSet {
    pub avicenna: Vec<MatchResult>,
    pub tcm: Vec<MatchResult>,
    pub ayurveda: Vec<MatchResult>,
}

impl MatchSet {
    pub fn for_tradition(&self, tradition: Tradition) -> &[MatchResult] {
        match tradition {
            Tradition::Avicenna => &self.avicenna,
            Tradition::Tcm => &self.tcm,
            Tradition::Ayurveda => &self.ayurveda,
        }
    }

    pub fn set_tradition(&mut self, tradition: Tradition, matches: Vec<MatchResult>) {
        match tradition {
            Tradition::Avicenna => self.avicenna = matches,
            Tradition::Tcm => self.tcm = matches,
            Tradition::Ayurveda => self.ayurveda = matches,
        }
    }

    /// All matches across traditions in tradition order
    pub fn all(&self) -> impl Iterator<Item = &MatchResult> {
        self.avicenna
            .iter()
            .chain(self.tcm.iter())
            .chain(self.ayurveda.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.avicenna.is_empty() && self.tcm.is_empty() && self.ayurveda.is_empty()
    }
}
