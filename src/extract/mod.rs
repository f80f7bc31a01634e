pub mod rules;
pub mod validate;

use crate::constants::DEFAULT_CITY;
use crate::domain::{Candidate, ProjectStatus, RawRecord, SkipEntry};
use crate::slug;
use rules::NumberRule;
use tracing::debug;
use validate::{plausible, NumField};

/// Slugs shorter than this carry no usable identity.
const MIN_SLUG_LEN: usize = 3;

/// Bodies shorter than this are not worth keeping as a description.
const MIN_DESCRIPTION_LEN: usize = 40;

/// Result of running the extractor over one raw record.
#[derive(Debug, Clone)]
pub enum Extraction {
    Accepted(Candidate),
    Skipped(SkipEntry),
}

/// Turn a raw record into a candidate by filling unstructured gaps from the
/// free-text body. Structured values pass through the same range validators
/// as pattern matches, so a zero or absurd cell is treated as absent rather
/// than clamped. Records without a usable identity, and listings marked as
/// sold, are routed to the skip report before scoring.
pub fn extract(raw: &RawRecord) -> Extraction {
    let body = raw.body.as_deref().unwrap_or("");

    if is_sold(body) {
        return skip(raw, "listing marked sold");
    }

    let title = match raw
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| extract_title(body))
    {
        Some(title) => title,
        None => return skip(raw, "no usable identity: no title found"),
    };
    let slug = slug::slugify(&title);
    if slug.chars().count() < MIN_SLUG_LEN {
        return skip(raw, "no usable identity: title too short");
    }

    let candidate = Candidate {
        source_id: raw.source_id.clone(),
        source_date: raw.source_date,
        slug,
        title,
        city: extract_city(raw, body),
        format: extract_format(raw, body),
        status: extract_status(raw, body),
        description: extract_description(raw, body),
        photos: raw.photos.clone(),
        price: numeric(raw.price, NumField::Price, &rules::PRICE_RULES, body),
        area: numeric(raw.area, NumField::Area, &rules::AREA_RULES, body),
        price_per_m2: numeric(
            raw.price_per_m2,
            NumField::PricePerM2,
            &rules::PRICE_PER_M2_RULES,
            body,
        ),
        roi_percent: numeric(raw.roi_percent, NumField::RoiPercent, &rules::ROI_RULES, body),
        occupancy_percent: numeric(
            raw.occupancy_percent,
            NumField::OccupancyPercent,
            &rules::OCCUPANCY_RULES,
            body,
        ),
        adr: numeric(raw.adr, NumField::Adr, &rules::ADR_RULES, body),
        payback_years: numeric(
            raw.payback_years,
            NumField::PaybackYears,
            &rules::PAYBACK_RULES,
            body,
        ),
        rev_per_m2_month: raw
            .rev_per_m2_month
            .filter(|v| plausible(NumField::RevPerM2Month, *v)),
        season_low_percent: numeric(
            None,
            NumField::OccupancyPercent,
            &rules::SEASON_LOW_RULES,
            body,
        ),
        season_high_percent: numeric(
            None,
            NumField::OccupancyPercent,
            &rules::SEASON_HIGH_RULES,
            body,
        ),
    };

    Extraction::Accepted(candidate)
}

fn skip(raw: &RawRecord, reason: &str) -> Extraction {
    debug!("extract: skipping {}: {}", raw.source_id, reason);
    Extraction::Skipped(SkipEntry {
        identifier: raw.source_id.clone(),
        reason: reason.to_string(),
        quality_score: 0,
    })
}

/// A structured value wins when it is in range; otherwise the ordered
/// pattern rules run over the body and the first in-range match wins.
/// Out-of-range matches are discarded inline, never clamped.
fn numeric(
    structured: Option<f64>,
    field: NumField,
    field_rules: &[NumberRule],
    body: &str,
) -> Option<f64> {
    if let Some(value) = structured {
        if plausible(field, value) {
            return Some(value);
        }
        debug!("extract: structured {:?} value {} out of range; dropped", field, value);
    }
    if body.is_empty() {
        return None;
    }
    for rule in field_rules {
        for value in rule.matches(body) {
            if plausible(field, value) {
                debug!("extract: {:?} <- {} via rule '{}'", field, value, rule.name);
                return Some(value);
            }
            debug!(
                "extract: rule '{}' matched implausible {:?} value {}; discarded",
                rule.name, field, value
            );
        }
    }
    None
}

/// Title rules in disambiguation order: explicit name markers first, the
/// first short line next, a bare capitalized phrase last.
fn extract_title(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    if let Some(caps) = rules::TITLE_NAMED_COMPLEX.captures(body) {
        return Some(caps.get(0).map(|m| m.as_str().trim().to_string())?);
    }
    if let Some(caps) = rules::TITLE_QUOTED.captures(body) {
        return Some(caps[1].trim().to_string());
    }
    if let Some(caps) = rules::TITLE_DOUBLE_QUOTED.captures(body) {
        return Some(caps[1].trim().to_string());
    }
    let first_line = body.lines().next().map(str::trim).unwrap_or("");
    if (3..=60).contains(&first_line.chars().count())
        && first_line.chars().next().is_some_and(|c| c.is_uppercase())
    {
        return Some(first_line.trim_end_matches(['.', '!', ':']).to_string());
    }
    rules::TITLE_CAPITALIZED_PHRASE
        .captures(body)
        .map(|caps| caps[1].trim().to_string())
}

fn extract_city(raw: &RawRecord, body: &str) -> String {
    if let Some(city) = raw.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        // Fold explicit city cells onto the canonical market name too.
        let lower = city.to_lowercase();
        for (keyword, canonical) in rules::CITY_KEYWORDS {
            if lower.contains(keyword) {
                return canonical.to_string();
            }
        }
        return city.to_string();
    }
    let lower = body.to_lowercase();
    for (keyword, canonical) in rules::CITY_KEYWORDS {
        if lower.contains(keyword) {
            return canonical.to_string();
        }
    }
    DEFAULT_CITY.to_string()
}

fn extract_format(raw: &RawRecord, body: &str) -> Option<String> {
    let explicit = raw.format.as_deref().map(str::trim).filter(|f| !f.is_empty());
    let haystack = match explicit {
        Some(f) => f.to_lowercase(),
        None => body.to_lowercase(),
    };
    for (keyword, canonical) in rules::FORMAT_KEYWORDS {
        if haystack.contains(keyword) {
            return Some(canonical.to_string());
        }
    }
    explicit.map(str::to_string)
}

/// Explicit construction/planning keywords win; anything else is an active
/// listing absent contrary evidence.
fn extract_status(raw: &RawRecord, body: &str) -> ProjectStatus {
    if let Some(status) = raw.status {
        return status;
    }
    let lower = body.to_lowercase();
    if rules::CONSTRUCTION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return ProjectStatus::Construction;
    }
    if rules::PLANNING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return ProjectStatus::Planning;
    }
    ProjectStatus::Active
}

fn extract_description(raw: &RawRecord, body: &str) -> Option<String> {
    if let Some(desc) = raw.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        return Some(desc.to_string());
    }
    let cleaned = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.len() >= MIN_DESCRIPTION_LEN {
        Some(cleaned)
    } else {
        None
    }
}

fn is_sold(body: &str) -> bool {
    if body.is_empty() {
        return false;
    }
    let lower = body.to_lowercase();
    if !rules::SOLD_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return false;
    }
    // A "sold N%" brag means the project is still selling.
    !rules::PARTIALLY_SOLD.is_match(body)
}
