use clinical_common::{AnalysisKind, Attribute, FindingMap};
use serde_json::Value;
use tracing::debug;

/// Outcome of validating one provider response
#[derive(Debug)]
pub struct ValidatedResponse {
    pub findings: FindingMap,
    pub confidence: f64,
    pub advisory_notes: Vec<String>,
    /// Attribute keys that were present but out of domain or out of kind
    pub dropped: Vec<String>,
    /// True when the document had no usable findings object at all
    pub degraded: bool,
}

/// Validate a provider JSON document against the kind's closed schema
///
/// Policy: the document must already be parsed JSON; unknown fields are
/// ignored; a present attribute whose value falls outside its enumerated
/// domain is dropped to absent, never rejected. A document without a usable
/// `findings` object yields a degraded result with zero confidence.
pub fn validate_response(kind: AnalysisKind, document: &Value) -> ValidatedResponse {
    let advisory_notes = extract_advisory(document);

    let Some(raw_findings) = document.get("findings").and_then(Value::as_object) else {
        debug!(kind = %kind, "provider response missing findings object; degrading");
        return ValidatedResponse {
            findings: FindingMap::default(),
            confidence: 0.0,
            advisory_notes,
            dropped: Vec::new(),
            degraded: true,
        };
    };

    let mut findings = FindingMap::default();
    let mut dropped = Vec::new();

    for (key, value) in raw_findings {
        let Some(attribute) = resolve_key(kind, key) else {
            dropped.push(key.clone());
            continue;
        };
        if !apply(&mut findings, attribute, value) {
            dropped.push(key.clone());
        }
    }

    let confidence = document
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.5)
        .clamp(0.0, 1.0);

    if !dropped.is_empty() {
        debug!(kind = %kind, dropped = ?dropped, "dropped out-of-domain attributes");
    }

    ValidatedResponse {
        findings,
        confidence,
        advisory_notes,
        dropped,
        degraded: false,
    }
}

fn extract_advisory(document: &Value) -> Vec<String> {
    document
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Map a wire key to an attribute, honoring the kind's closed attribute set
///
/// Pulse and urine accept the natural short keys (`rate`, `color`) as well
/// as the canonical long forms.
fn resolve_key(kind: AnalysisKind, key: &str) -> Option<Attribute> {
    let attribute = match (kind, key) {
        (AnalysisKind::Tongue, "color") => Attribute::Color,
        (AnalysisKind::Tongue, "coating") => Attribute::Coating,
        (AnalysisKind::Tongue, "moisture") => Attribute::Moisture,
        (AnalysisKind::Tongue, "cracks") => Attribute::Cracks,
        (AnalysisKind::Tongue, "shape") => Attribute::Shape,

        (AnalysisKind::Eye, "sclera_tint") => Attribute::ScleraTint,
        (AnalysisKind::Eye, "moisture") => Attribute::Moisture,
        (AnalysisKind::Eye, "luster") => Attribute::Luster,

        (AnalysisKind::Face, "complexion") => Attribute::Complexion,
        (AnalysisKind::Face, "luster") => Attribute::Luster,

        (AnalysisKind::Skin, "texture") => Attribute::Texture,
        (AnalysisKind::Skin, "temperature") => Attribute::Temperature,
        (AnalysisKind::Skin, "moisture") => Attribute::Moisture,

        (AnalysisKind::Pulse, "rate" | "pulse_rate") => Attribute::PulseRate,
        (AnalysisKind::Pulse, "depth" | "pulse_depth") => Attribute::PulseDepth,
        (AnalysisKind::Pulse, "quality" | "pulse_quality") => Attribute::PulseQuality,

        (AnalysisKind::Urine, "color" | "urine_color") => Attribute::UrineColor,
        (AnalysisKind::Urine, "clarity" | "urine_clarity") => Attribute::UrineClarity,

        // Constitutional attributes may accompany any kind
        (_, "mizaj") => Attribute::Mizaj,
        (_, "dosha") => Attribute::Dosha,

        _ => return None,
    };
    Some(attribute)
}

/// Set one attribute from a JSON value; false when the value is out of domain
fn apply(map: &mut FindingMap, attribute: Attribute, value: &Value) -> bool {
    fn parse<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
        serde_json::from_value(value.clone()).ok()
    }

    match attribute {
        Attribute::Color => assign(&mut map.color, parse(value)),
        Attribute::Coating => assign(&mut map.coating, parse(value)),
        Attribute::Moisture => assign(&mut map.moisture, parse(value)),
        Attribute::Cracks => assign(&mut map.cracks, parse(value)),
        Attribute::Shape => assign(&mut map.shape, parse(value)),
        Attribute::ScleraTint => assign(&mut map.sclera_tint, parse(value)),
        Attribute::Luster => assign(&mut map.luster, parse(value)),
        Attribute::Complexion => assign(&mut map.complexion, parse(value)),
        Attribute::Texture => assign(&mut map.texture, parse(value)),
        Attribute::Temperature => assign(&mut map.temperature, parse(value)),
        Attribute::PulseRate => assign(&mut map.pulse_rate, parse(value)),
        Attribute::PulseDepth => assign(&mut map.pulse_depth, parse(value)),
        Attribute::PulseQuality => assign(&mut map.pulse_quality, parse(value)),
        Attribute::UrineColor => assign(&mut map.urine_color, parse(value)),
        Attribute::UrineClarity => assign(&mut map.urine_clarity, parse(value)),
        Attribute::Mizaj => assign(&mut map.mizaj, parse(value)),
        Attribute::Dosha => assign(&mut map.dosha, parse(value)),
    }
}

fn assign<T>(slot: &mut Option<T>, parsed: Option<T>) -> bool {
    match parsed {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}
