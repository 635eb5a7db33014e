use serde::{Deserialize, Serialize};

/// Supported medical traditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tradition {
    Avicenna,
    Tcm,
    Ayurveda,
}

impl Tradition {
    pub const ALL: [Tradition; 3] = [Tradition::Avicenna, Tradition::Tcm, Tradition::Ayurveda];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tradition::Avicenna => "avicenna",
            Tradition::Tcm => "tcm",
            Tradition::Ayurveda => "ayurveda",
        }
    }
}

impl std::fmt::Display for Tradition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Avicennan constitutional type over {hot, cold} x {dry, moist}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mizaj {
    /// Hot and dry
    GarmKhoshk,
    /// Hot and moist
    GarmTar,
    /// Cold and dry
    SardKhoshk,
    /// Cold and moist
    SardTar,
}

impl Mizaj {
    pub fn is_hot(&self) -> bool {
        matches!(self, Mizaj::GarmKhoshk | Mizaj::GarmTar)
    }

    pub fn is_dry(&self) -> bool {
        matches!(self, Mizaj::GarmKhoshk | Mizaj::SardKhoshk)
    }
}

/// Ayurvedic constitutional type, single doshas and their combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dosha {
    Vata,
    Pitta,
    Kapha,
    VataPitta,
    PittaKapha,
    VataKapha,
    Tridosha,
}

impl Dosha {
    /// Whether the given single dosha participates in this constitution
    pub fn includes(&self, other: Dosha) -> bool {
        match self {
            Dosha::Tridosha => matches!(other, Dosha::Vata | Dosha::Pitta | Dosha::Kapha),
            Dosha::VataPitta => matches!(other, Dosha::Vata | Dosha::Pitta),
            Dosha::PittaKapha => matches!(other, Dosha::Pitta | Dosha::Kapha),
            Dosha::VataKapha => matches!(other, Dosha::Vata | Dosha::Kapha),
            single => *single == other,
        }
    }
}

/// Coarse bucket over match score, used as a UI hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl Severity {
    /// High for score >= 0.8, Moderate for >= 0.6, Low otherwise
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Severity::High
        } else if score >= 0.6 {
            Severity::Moderate
        } else {
            Severity::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_buckets() {
        assert_eq!(Severity::from_score(0.95), Severity::High);
        assert_eq!(Severity::from_score(0.8), Severity::High);
        assert_eq!(Severity::from_score(0.79), Severity::Moderate);
        assert_eq!(Severity::from_score(0.6), Severity::Moderate);
        assert_eq!(Severity::from_score(0.59), Severity::Low);
        assert_eq!(Severity::from_score(0.0), Severity::Low);
    }

    #[test]
    fn dosha_combinations_include_singles() {
        assert!(Dosha::VataPitta.includes(Dosha::Vata));
        assert!(Dosha::VataPitta.includes(Dosha::Pitta));
        assert!(!Dosha::VataPitta.includes(Dosha::Kapha));
        assert!(Dosha::Tridosha.includes(Dosha::Kapha));
        assert!(Dosha::Pitta.includes(Dosha::Pitta));
        assert!(!Dosha::Pitta.includes(Dosha::Vata));
    }

    #[test]
    fn mizaj_qualities() {
        assert!(Mizaj::GarmTar.is_hot());
        assert!(!Mizaj::GarmTar.is_dry());
        assert!(Mizaj::SardKhoshk.is_dry());
        assert!(!Mizaj::SardKhoshk.is_hot());
    }

    #[test]
    fn tradition_wire_form_is_lowercase() {
        let json = serde_json::to_string(&Tradition::Avicenna).unwrap();
        assert_eq!(json, "\"avicenna\"");
        let back: Tradition = serde_json::from_str("\"tcm\"").unwrap();
        assert_eq!(back, Tradition::Tcm);
    }
}
