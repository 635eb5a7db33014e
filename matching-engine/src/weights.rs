use clinical_common::{Attribute, Tradition};

/// How an attribute is weighted within a tradition's score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightClass {
    /// Headline attribute with a fixed weight
    Fixed(f64),
    /// Shares the tradition's residual weight pool with the other pooled
    /// attributes present in the comparison
    Pooled,
}

/// Residual pool shared by Avicenna's non-headline attributes
pub const AVICENNA_POOL: f64 = 0.15;

/// Per-attribute weight class within a tradition; `None` means the
/// attribute does not participate in that tradition's score.
pub fn weight_class(tradition: Tradition, attribute: Attribute) -> Option<WeightClass> {
    match tradition {
        Tradition::Avicenna => match attribute {
            Attribute::Mizaj => Some(WeightClass::Fixed(0.30)),
            Attribute::Color => Some(WeightClass::Fixed(0.20)),
            Attribute::Coating => Some(WeightClass::Fixed(0.20)),
            Attribute::Moisture => Some(WeightClass::Fixed(0.15)),
            Attribute::Dosha => None,
            _ => Some(WeightClass::Pooled),
        },
        Tradition::Tcm => match attribute {
            Attribute::Color => Some(WeightClass::Fixed(0.30)),
            Attribute::Coating => Some(WeightClass::Fixed(0.30)),
            Attribute::Moisture => Some(WeightClass::Fixed(0.20)),
            Attribute::Shape => Some(WeightClass::Fixed(0.20)),
            _ => None,
        },
        Tradition::Ayurveda => match attribute {
            Attribute::Dosha => Some(WeightClass::Fixed(0.30)),
            Attribute::Color => Some(WeightClass::Fixed(0.25)),
            Attribute::Coating => Some(WeightClass::Fixed(0.25)),
            Attribute::Moisture => Some(WeightClass::Fixed(0.20)),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcm_scores_only_the_four_tongue_attributes() {
        assert_eq!(
            weight_class(Tradition::Tcm, Attribute::Color),
            Some(WeightClass::Fixed(0.30))
        );
        assert_eq!(weight_class(Tradition::Tcm, Attribute::Mizaj), None);
        assert_eq!(weight_class(Tradition::Tcm, Attribute::Cracks), None);
    }

    #[test]
    fn avicenna_pools_minor_attributes() {
        assert_eq!(
            weight_class(Tradition::Avicenna, Attribute::Cracks),
            Some(WeightClass::Pooled)
        );
        assert_eq!(
            weight_class(Tradition::Avicenna, Attribute::Shape),
            Some(WeightClass::Pooled)
        );
        // The rival tradition's constitutional type never scores here
        assert_eq!(weight_class(Tradition::Avicenna, Attribute::Dosha), None);
    }

    #[test]
    fn ayurveda_headline_weights_sum_to_one() {
        let total: f64 = [
            Attribute::Dosha,
            Attribute::Color,
            Attribute::Coating,
            Attribute::Moisture,
        ]
        .iter()
        .map(|a| match weight_class(Tradition::Ayurveda, *a) {
            Some(WeightClass::Fixed(w)) => w,
            _ => 0.0,
        })
        .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
