use crate::domain::{Candidate, QualityScore};
use crate::extract::validate::{plausible, NumField};

/// Score below which a merged record is routed to the skip report instead of
/// being reconciled.
pub const DEFAULT_ACCEPT_THRESHOLD: u8 = 40;

/// Descriptions shorter than this add no catalog value.
const MIN_DESCRIPTION_LEN: usize = 60;

/// Titles that name a unit type rather than a project.
const GENERIC_TITLES: &[&str] = &[
    "апартаменты",
    "апартамент",
    "квартира",
    "студия",
    "объект",
    "лот",
    "продажа",
    "предложение",
];

/// One independently-checked condition. Checks are binary (full weight or
/// zero) and the weights sum to 100, which keeps the score monotonic in
/// information gained: adding a range-valid field can only raise it. The
/// merge stage's field-preference rule relies on that monotonicity.
struct Check {
    name: &'static str,
    weight: u8,
    passes: fn(&Candidate) -> bool,
}

static CHECKS: [Check; 7] = [
    Check {
        name: "plausible_title",
        weight: 15,
        passes: |c| {
            let len = c.title.chars().count();
            (3..=80).contains(&len)
                && !GENERIC_TITLES.contains(&c.title.trim().to_lowercase().as_str())
        },
    },
    Check {
        name: "price_in_range",
        weight: 20,
        passes: |c| c.price.is_some_and(|v| plausible(NumField::Price, v)),
    },
    Check {
        name: "area_in_range",
        weight: 15,
        passes: |c| c.area.is_some_and(|v| plausible(NumField::Area, v)),
    },
    Check {
        name: "price_per_m2_in_range",
        weight: 10,
        passes: |c| c.price_per_m2.is_some_and(|v| plausible(NumField::PricePerM2, v)),
    },
    Check {
        name: "roi_in_range",
        weight: 15,
        passes: |c| c.roi_percent.is_some_and(|v| plausible(NumField::RoiPercent, v)),
    },
    Check {
        name: "description_present",
        weight: 15,
        passes: |c| {
            c.description
                .as_deref()
                .is_some_and(|d| d.chars().count() >= MIN_DESCRIPTION_LEN)
        },
    },
    Check {
        name: "photo_present",
        weight: 10,
        passes: |c| !c.photos.is_empty(),
    },
];

/// Deterministic, stateless completeness/plausibility score in 0..=100.
pub fn score(candidate: &Candidate) -> QualityScore {
    let mut total = 0u8;
    let mut passed = Vec::new();
    for check in &CHECKS {
        if (check.passes)(candidate) {
            total += check.weight;
            passed.push(check.name);
        }
    }
    QualityScore { total, passed }
}
