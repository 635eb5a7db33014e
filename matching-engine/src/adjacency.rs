use clinical_common::{AttributeValue, Moisture, PulseRate, TongueCoating, TongueColor};

/// Declared adjacency between enumerated values
///
/// Adjacent values earn half credit in scoring. The relations are symmetric
/// and non-transitive: each value is adjacent only to its immediate
/// neighbors.
///
/// Tongue colors form the canonical chain
/// pale - pink - red - crimson - purple - dark; moisture and pulse rate are
/// three-step chains; coatings are adjacent across one step of thickness or
/// color.
pub fn adjacent(a: &AttributeValue, b: &AttributeValue) -> bool {
    match (a, b) {
        (AttributeValue::TongueColor(x), AttributeValue::TongueColor(y)) => {
            chain_neighbors(color_rank(*x), color_rank(*y))
        }
        (AttributeValue::Moisture(x), AttributeValue::Moisture(y)) => {
            chain_neighbors(moisture_rank(*x), moisture_rank(*y))
        }
        (AttributeValue::PulseRate(x), AttributeValue::PulseRate(y)) => {
            chain_neighbors(rate_rank(*x), rate_rank(*y))
        }
        (AttributeValue::Coating(x), AttributeValue::Coating(y)) => coating_adjacent(*x, *y),
        _ => false,
    }
}

fn chain_neighbors(a: usize, b: usize) -> bool {
    a.abs_diff(b) == 1
}

fn color_rank(color: TongueColor) -> usize {
    match color {
        TongueColor::Pale => 0,
        TongueColor::Pink => 1,
        TongueColor::Red => 2,
        TongueColor::Crimson => 3,
        TongueColor::Purple => 4,
        TongueColor::Dark => 5,
    }
}

fn moisture_rank(moisture: Moisture) -> usize {
    match moisture {
        Moisture::Dry => 0,
        Moisture::Normal => 1,
        Moisture::Wet => 2,
    }
}

fn rate_rank(rate: PulseRate) -> usize {
    match rate {
        PulseRate::Slow => 0,
        PulseRate::Normal => 1,
        PulseRate::Rapid => 2,
    }
}

fn coating_adjacent(a: TongueCoating, b: TongueCoating) -> bool {
    use TongueCoating::*;
    matches!(
        (a, b),
        (ThinWhite, ThickWhite)
            | (ThickWhite, ThinWhite)
            | (ThinWhite, ThinYellow)
            | (ThinYellow, ThinWhite)
            | (ThinYellow, ThickYellow)
            | (ThickYellow, ThinYellow)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(c: TongueColor) -> AttributeValue {
        AttributeValue::TongueColor(c)
    }

    #[test]
    fn color_chain_neighbors_are_adjacent() {
        assert!(adjacent(&color(TongueColor::Pale), &color(TongueColor::Pink)));
        assert!(adjacent(&color(TongueColor::Red), &color(TongueColor::Crimson)));
        assert!(adjacent(&color(TongueColor::Purple), &color(TongueColor::Dark)));
    }

    #[test]
    fn adjacency_is_symmetric() {
        assert!(adjacent(&color(TongueColor::Pink), &color(TongueColor::Pale)));
        assert!(adjacent(
            &AttributeValue::Moisture(Moisture::Wet),
            &AttributeValue::Moisture(Moisture::Normal)
        ));
    }

    #[test]
    fn adjacency_is_not_transitive() {
        // pale-pink and pink-red, but never pale-red
        assert!(!adjacent(&color(TongueColor::Pale), &color(TongueColor::Red)));
        assert!(!adjacent(
            &AttributeValue::Moisture(Moisture::Dry),
            &AttributeValue::Moisture(Moisture::Wet)
        ));
    }

    #[test]
    fn equal_values_are_not_adjacent() {
        assert!(!adjacent(&color(TongueColor::Red), &color(TongueColor::Red)));
    }

    #[test]
    fn coating_crosses_one_step_only() {
        let c = AttributeValue::Coating;
        assert!(adjacent(&c(TongueCoating::ThinWhite), &c(TongueCoating::ThickWhite)));
        assert!(adjacent(&c(TongueCoating::ThinWhite), &c(TongueCoating::ThinYellow)));
        assert!(!adjacent(&c(TongueCoating::ThickWhite), &c(TongueCoating::ThickYellow)));
        assert!(!adjacent(&c(TongueCoating::None), &c(TongueCoating::ThinWhite)));
        assert!(!adjacent(&c(TongueCoating::Greasy), &c(TongueCoating::Peeled)));
    }

    #[test]
    fn cross_domain_values_are_never_adjacent() {
        assert!(!adjacent(
            &color(TongueColor::Pale),
            &AttributeValue::Moisture(Moisture::Dry)
        ));
    }
}
