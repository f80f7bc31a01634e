use crate::domain::{Candidate, ProjectStatus, RiskLevel};

/// Named 12-month load-curve templates, January first.
pub const RESORT_PEAK_SUMMER: [u8; 12] = [35, 35, 40, 50, 65, 85, 95, 95, 80, 55, 40, 45];
pub const STABLE_URBAN: [u8; 12] = [70, 72, 74, 75, 76, 78, 80, 80, 78, 76, 74, 72];

/// Month indexes the two-sample synthesis anchors to: the low-season figure
/// lands on January, the high-season figure on August.
const LOW_MONTH: usize = 0;
const HIGH_MONTH: usize = 7;

/// Cities whose demand is dominated by vacation seasons.
const RESORT_CITIES: &[&str] = &["Сочи", "Анапа", "Геленджик", "Ялта", "Алушта", "Калининград"];

/// Operating formats sold as managed short-stay units.
const SHORT_STAY_FORMATS: &[&str] = &["апарт-отель", "гостиничный номер", "студия"];

/// Classification result: a risk tier and a seasonal load curve, plus the
/// provenance of the curve so synthesized series are never presented as
/// observed monthlies.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub risk_level: RiskLevel,
    pub seasonality: [u8; 12],
    /// Template the curve came from, or "interpolated" for the two-sample
    /// synthesis.
    pub curve_name: &'static str,
    /// True when the curve was synthesized or rescaled rather than taken
    /// from a template as-is.
    pub synthesized: bool,
}

/// Pure mapping from categorical attributes onto a risk tier and a seasonal
/// curve. No record state is consulted beyond the passed candidate.
pub fn classify(candidate: &Candidate, occupancy: Option<f64>) -> Classification {
    let resort = is_resort(&candidate.city);
    let short_stay = candidate
        .format
        .as_deref()
        .map(|f| SHORT_STAY_FORMATS.contains(&f))
        .unwrap_or(false);

    let base = match candidate.status {
        ProjectStatus::Active => RiskLevel::Low,
        ProjectStatus::Construction => RiskLevel::Medium,
        ProjectStatus::Planning => RiskLevel::High,
    };
    // Resort short-stay income depends on a narrow high season; one tier up.
    let risk_level = if resort && short_stay { bump(base) } else { base };

    let (seasonality, curve_name, mut synthesized) = curve(candidate, resort);

    // When overall occupancy is stated, the curve is rescaled so its mean
    // matches: the curve and the headline figure must not contradict each
    // other in the catalog.
    let seasonality = match occupancy {
        Some(occ) if occ > 0.0 => {
            let mean = seasonality.iter().map(|&v| v as f64).sum::<f64>() / 12.0;
            let factor = occ / mean;
            if (factor - 1.0).abs() > 0.01 {
                synthesized = true;
            }
            scale(seasonality, factor)
        }
        _ => seasonality,
    };

    Classification { risk_level, seasonality, curve_name, synthesized }
}

pub fn is_resort(city: &str) -> bool {
    RESORT_CITIES.contains(&city)
}

fn bump(level: RiskLevel) -> RiskLevel {
    match level {
        RiskLevel::Low => RiskLevel::Medium,
        RiskLevel::Medium | RiskLevel::High => RiskLevel::High,
    }
}

fn curve(candidate: &Candidate, resort: bool) -> ([u8; 12], &'static str, bool) {
    if let (Some(low), Some(high)) = (candidate.season_low_percent, candidate.season_high_percent) {
        return (interpolate(low, high), "interpolated", true);
    }
    if resort {
        (RESORT_PEAK_SUMMER, "resort-peak-summer", false)
    } else {
        (STABLE_URBAN, "stable-urban", false)
    }
}

/// Build a year curve from a low-season and a high-season sample: the known
/// values are placed in their months and the remainder is linearly
/// interpolated around the year.
fn interpolate(low: f64, high: f64) -> [u8; 12] {
    let mut curve = [0u8; 12];
    let rising_span = (HIGH_MONTH - LOW_MONTH) as f64;
    let falling_span = 12.0 - rising_span;
    for (month, slot) in curve.iter_mut().enumerate() {
        let value = if month <= HIGH_MONTH {
            low + (high - low) * (month as f64) / rising_span
        } else {
            high + (low - high) * ((month - HIGH_MONTH) as f64) / falling_span
        };
        *slot = value.round().clamp(0.0, 100.0) as u8;
    }
    curve
}

fn scale(curve: [u8; 12], factor: f64) -> [u8; 12] {
    curve.map(|v| ((v as f64) * factor).round().clamp(0.0, 100.0) as u8)
}
