use crate::tradition::{Dosha, Mizaj};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Biosignal analysis kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Tongue,
    Eye,
    Face,
    Skin,
    Pulse,
    Urine,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 6] = [
        AnalysisKind::Tongue,
        AnalysisKind::Eye,
        AnalysisKind::Face,
        AnalysisKind::Skin,
        AnalysisKind::Pulse,
        AnalysisKind::Urine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Tongue => "tongue",
            AnalysisKind::Eye => "eye",
            AnalysisKind::Face => "face",
            AnalysisKind::Skin => "skin",
            AnalysisKind::Pulse => "pulse",
            AnalysisKind::Urine => "urine",
        }
    }

    /// Kinds accepted for photographic upload
    pub fn is_image_kind(&self) -> bool {
        matches!(
            self,
            AnalysisKind::Tongue | AnalysisKind::Eye | AnalysisKind::Face | AnalysisKind::Skin
        )
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ATTRIBUTE VALUE DOMAINS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TongueColor {
    Pale,
    Pink,
    Red,
    Crimson,
    Purple,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TongueCoating {
    None,
    ThinWhite,
    ThickWhite,
    ThinYellow,
    ThickYellow,
    Greasy,
    Peeled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Moisture {
    Dry,
    Normal,
    Wet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TongueShape {
    Normal,
    Swollen,
    Thin,
    Stiff,
    Deviated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScleraTint {
    Clear,
    Yellow,
    Red,
    Pale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Luster {
    Bright,
    Dull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexion {
    Pale,
    Flushed,
    Sallow,
    Cyanotic,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinTexture {
    Smooth,
    Rough,
    Scaly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinTemperature {
    Cold,
    Cool,
    Neutral,
    Warm,
    Hot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseRate {
    Slow,
    Normal,
    Rapid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseDepth {
    Superficial,
    Moderate,
    Deep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseQuality {
    Wiry,
    Slippery,
    Choppy,
    Soft,
    Full,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrineColor {
    Pale,
    Straw,
    DarkYellow,
    Amber,
    RedTinged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrineClarity {
    Clear,
    Cloudy,
    Turbid,
}

// ============================================================================
// UNIFORM ATTRIBUTE PROJECTION
// ============================================================================

/// Attribute names across all analysis kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Color,
    Coating,
    Moisture,
    Cracks,
    Shape,
    ScleraTint,
    Luster,
    Complexion,
    Texture,
    Temperature,
    PulseRate,
    PulseDepth,
    PulseQuality,
    UrineColor,
    UrineClarity,
    Mizaj,
    Dosha,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Color => "color",
            Attribute::Coating => "coating",
            Attribute::Moisture => "moisture",
            Attribute::Cracks => "cracks",
            Attribute::Shape => "shape",
            Attribute::ScleraTint => "sclera_tint",
            Attribute::Luster => "luster",
            Attribute::Complexion => "complexion",
            Attribute::Texture => "texture",
            Attribute::Temperature => "temperature",
            Attribute::PulseRate => "pulse_rate",
            Attribute::PulseDepth => "pulse_depth",
            Attribute::PulseQuality => "pulse_quality",
            Attribute::UrineColor => "urine_color",
            Attribute::UrineClarity => "urine_clarity",
            Attribute::Mizaj => "mizaj",
            Attribute::Dosha => "dosha",
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value drawn from one of the enumerated attribute domains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    TongueColor(TongueColor),
    Coating(TongueCoating),
    Moisture(Moisture),
    Cracks(bool),
    Shape(TongueShape),
    ScleraTint(ScleraTint),
    Luster(Luster),
    Complexion(Complexion),
    Texture(SkinTexture),
    Temperature(SkinTemperature),
    PulseRate(PulseRate),
    PulseDepth(PulseDepth),
    PulseQuality(PulseQuality),
    UrineColor(UrineColor),
    UrineClarity(UrineClarity),
    Mizaj(Mizaj),
    Dosha(Dosha),
}

// ============================================================================
// FINDING MAP & FINDING BAG
// ============================================================================

/// Closed-domain attribute map
///
/// Absent attributes are `None`. The same shape describes extracted findings
/// and knowledge-record characteristics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindingMap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<TongueColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coating: Option<TongueCoating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture: Option<Moisture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cracks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<TongueShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sclera_tint: Option<ScleraTint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub luster: Option<Luster>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexion: Option<Complexion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<SkinTexture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<SkinTemperature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_rate: Option<PulseRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_depth: Option<PulseDepth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_quality: Option<PulseQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urine_color: Option<UrineColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urine_clarity: Option<UrineClarity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mizaj: Option<Mizaj>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosha: Option<Dosha>,
}

impl FindingMap {
    /// Look up a single attribute
    pub fn get(&self, attribute: Attribute) -> Option<AttributeValue> {
        match attribute {
            Attribute::Color => self.color.map(AttributeValue::TongueColor),
            Attribute::Coating => self.coating.map(AttributeValue::Coating),
            Attribute::Moisture => self.moisture.map(AttributeValue::Moisture),
            Attribute::Cracks => self.cracks.map(AttributeValue::Cracks),
            Attribute::Shape => self.shape.map(AttributeValue::Shape),
            Attribute::ScleraTint => self.sclera_tint.map(AttributeValue::ScleraTint),
            Attribute::Luster => self.luster.map(AttributeValue::Luster),
            Attribute::Complexion => self.complexion.map(AttributeValue::Complexion),
            Attribute::Texture => self.texture.map(AttributeValue::Texture),
            Attribute::Temperature => self.temperature.map(AttributeValue::Temperature),
            Attribute::PulseRate => self.pulse_rate.map(AttributeValue::PulseRate),
            Attribute::PulseDepth => self.pulse_depth.map(AttributeValue::PulseDepth),
            Attribute::PulseQuality => self.pulse_quality.map(AttributeValue::PulseQuality),
            Attribute::UrineColor => self.urine_color.map(AttributeValue::UrineColor),
            Attribute::UrineClarity => self.urine_clarity.map(AttributeValue::UrineClarity),
            Attribute::Mizaj => self.mizaj.map(AttributeValue::Mizaj),
            Attribute::Dosha => self.dosha.map(AttributeValue::Dosha),
        }
    }

    const ALL_ATTRIBUTES: [Attribute; 17] = [
        Attribute::Color,
        Attribute::Coating,
        Attribute::Moisture,
        Attribute::Cracks,
        Attribute::Shape,
        Attribute::ScleraTint,
        Attribute::Luster,
        Attribute::Complexion,
        Attribute::Texture,
        Attribute::Temperature,
        Attribute::PulseRate,
        Attribute::PulseDepth,
        Attribute::PulseQuality,
        Attribute::UrineColor,
        Attribute::UrineClarity,
        Attribute::Mizaj,
        Attribute::Dosha,
    ];

    /// All present attributes as a uniform (name, value) projection
    pub fn attributes(&self) -> Vec<(Attribute, AttributeValue)> {
        Self::ALL_ATTRIBUTES
            .iter()
            .filter_map(|attr| self.get(*attr).map(|value| (*attr, value)))
            .collect()
    }

    /// Whether every attribute is absent
    pub fn is_empty(&self) -> bool {
        self.attributes().is_empty()
    }
}

/// One biosignal analysis result: a closed-domain attribute map plus the
/// extraction confidence and any advisory free text from the vision model.
///
/// Produced once per upload and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingBag {
    pub id: Uuid,
    pub kind: AnalysisKind,
    pub findings: FindingMap,
    /// Extraction confidence in [0, 1]
    pub confidence: f64,
    /// Free-form vision model output, preserved for display only
    pub advisory_notes: Vec<String>,
    pub extracted_at: DateTime<Utc>,
}

impl FindingBag {
    pub fn new(kind: AnalysisKind, findings: FindingMap, confidence: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            findings,
            confidence: confidence.clamp(0.0, 1.0),
            advisory_notes: Vec::new(),
            extracted_at: Utc::now(),
        }
    }

    /// Schema-valid bag with no findings and zero confidence, used when the
    /// vision provider returned unparseable output.
    pub fn degraded(kind: AnalysisKind) -> Self {
        Self::new(kind, FindingMap::default(), 0.0)
    }

    pub fn with_advisory_notes(mut self, notes: Vec<String>) -> Self {
        self.advisory_notes = notes;
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.confidence == 0.0 && self.findings.is_empty()
    }
}
