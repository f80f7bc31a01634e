use crate::domain::Candidate;
use crate::extract::validate::{plausible, NumField};
use serde::Serialize;
use tracing::{debug, warn};

/// Every fallback constant the reconciler may assume lives here, and only
/// the reconciler consults it. A record that used one of these gets the
/// affected field tagged as derived so downstream consumers and the test
/// suite can tell measured values from assumed ones.
#[derive(Debug, Clone, Copy)]
pub struct FallbackAssumptions {
    /// Conservative annual yield assumed when no return-rate, occupancy or
    /// ADR data survived extraction.
    pub annual_yield_percent: f64,
    /// Occupancy assumed when ADR is known but occupancy is not.
    pub default_occupancy_percent: f64,
    /// Payback sentinel instead of infinity when NOI is near zero.
    pub payback_cap_years: f64,
    pub payback_floor_years: f64,
    /// Average nights per month used to annualize ADR revenue.
    pub nights_per_month: f64,
}

pub const FALLBACKS: FallbackAssumptions = FallbackAssumptions {
    annual_yield_percent: 8.0,
    default_occupancy_percent: 70.0,
    payback_cap_years: 99.0,
    payback_floor_years: 0.5,
    nights_per_month: 30.4,
};

/// Relative tolerance for the price = price_per_m2 x area closure.
pub const CLOSURE_TOLERANCE: f64 = 0.01;

/// Reconciled financial metrics for one candidate, plus the provenance of
/// every value that was computed rather than extracted.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledMetrics {
    pub price: f64,
    pub area: Option<f64>,
    pub price_per_m2: Option<f64>,
    pub rev_per_m2_month: Option<f64>,
    pub noi_year: f64,
    pub payback_years: f64,
    pub occupancy: Option<f64>,
    pub adr: Option<f64>,
    /// Field names filled by derivation; `assumed-yield` / `assumed-occupancy`
    /// mark uses of the fallback table.
    pub derived: Vec<String>,
}

/// Why a candidate could not be reconciled.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// No price survived extraction or derivation; payback cannot exist.
    Unreconcilable(String),
}

impl ReconcileError {
    pub fn reason(&self) -> &str {
        match self {
            Self::Unreconcilable(reason) => reason,
        }
    }
}

/// Fill missing derived financial fields from present ones under a fixed
/// precedence, always preferring a directly-extracted value over a derived
/// one. Rejects records that remain under-specified after every rule.
pub fn reconcile(candidate: &Candidate) -> Result<ReconciledMetrics, ReconcileError> {
    let mut derived: Vec<String> = Vec::new();

    let (price, area, price_per_m2) = close_price_triplet(candidate, &mut derived);

    let price = price.ok_or_else(|| {
        ReconcileError::Unreconcilable(
            "no price after derivation; payback cannot be computed".to_string(),
        )
    })?;

    // Occupancy is only assumed when ADR makes it necessary for revenue.
    let mut occupancy = candidate.occupancy_percent;
    let adr = candidate.adr;

    // Revenue precedence: measured ADR x occupancy, then headline return
    // rate, then the conservative yield assumption.
    let mut rev_per_m2_month = candidate.rev_per_m2_month;
    let noi_year: f64;
    if rev_per_m2_month.is_none() {
        if let (Some(adr), Some(area)) = (adr, area) {
            let occ = match occupancy {
                Some(occ) => occ,
                None => {
                    derived.push("assumed-occupancy".to_string());
                    occupancy = Some(FALLBACKS.default_occupancy_percent);
                    FALLBACKS.default_occupancy_percent
                }
            };
            let rev = adr * FALLBACKS.nights_per_month * (occ / 100.0) / area;
            if plausible(NumField::RevPerM2Month, rev) {
                rev_per_m2_month = Some(rev);
                derived.push("rev_per_m2_month".to_string());
            } else {
                debug!(
                    "reconcile: ADR-based revenue {:.0} out of range for {}; ignored",
                    rev, candidate.source_id
                );
            }
        }
    }

    // NOI is never extracted directly, so it is always tagged derived.
    if let (Some(rev), Some(area)) = (rev_per_m2_month, area) {
        noi_year = rev * area * 12.0;
        derived.push("noi_year".to_string());
    } else if let Some(roi) = candidate.roi_percent {
        noi_year = price * roi / 100.0;
        derived.push("noi_year".to_string());
        if rev_per_m2_month.is_none() {
            if let Some(area) = area {
                rev_per_m2_month = Some(noi_year / 12.0 / area);
                derived.push("rev_per_m2_month".to_string());
            }
        }
    } else {
        noi_year = price * FALLBACKS.annual_yield_percent / 100.0;
        derived.push("assumed-yield".to_string());
        derived.push("noi_year".to_string());
        if let Some(area) = area {
            rev_per_m2_month = Some(noi_year / 12.0 / area);
            derived.push("rev_per_m2_month".to_string());
        }
    }

    // An extracted payback wins over the computed ratio.
    let payback_years = match candidate.payback_years {
        Some(extracted) => extracted,
        None => {
            derived.push("payback_years".to_string());
            (price / noi_year).clamp(FALLBACKS.payback_floor_years, FALLBACKS.payback_cap_years)
        }
    };

    derived.dedup();
    Ok(ReconciledMetrics {
        price,
        area,
        price_per_m2,
        rev_per_m2_month,
        noi_year,
        payback_years,
        occupancy,
        adr,
        derived,
    })
}

/// Whichever two of {price, area, price_per_m2} are known determine the
/// third. If all three were extracted but disagree beyond the closure
/// tolerance, price and area are treated as primary and the rate is
/// recomputed with a logged warning.
fn close_price_triplet(
    candidate: &Candidate,
    derived: &mut Vec<String>,
) -> (Option<f64>, Option<f64>, Option<f64>) {
    let mut price = candidate.price;
    let mut area = candidate.area;
    let mut price_per_m2 = candidate.price_per_m2;

    match (price, area, price_per_m2) {
        (Some(p), Some(a), Some(rate)) => {
            let implied = p / a;
            if (rate - implied).abs() / implied > CLOSURE_TOLERANCE {
                warn!(
                    "reconcile: {} extracted price_per_m2 {:.0} disagrees with price/area {:.0}; recomputing",
                    candidate.source_id, rate, implied
                );
                price_per_m2 = Some(implied);
                derived.push("price_per_m2".to_string());
            }
        }
        (Some(p), Some(a), None) => {
            price_per_m2 = Some(p / a);
            derived.push("price_per_m2".to_string());
        }
        (Some(p), None, Some(rate)) => {
            let computed = p / rate;
            if plausible(NumField::Area, computed) {
                area = Some(computed);
                derived.push("area".to_string());
            }
        }
        (None, Some(a), Some(rate)) => {
            price = Some(rate * a);
            derived.push("price".to_string());
        }
        _ => {}
    }
    (price, area, price_per_m2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProjectStatus;

    fn candidate() -> Candidate {
        Candidate {
            source_id: "test:1".to_string(),
            source_date: None,
            slug: "chayka".to_string(),
            title: "Чайка".to_string(),
            city: "Сочи".to_string(),
            format: None,
            status: ProjectStatus::Active,
            description: None,
            photos: Vec::new(),
            price: None,
            area: None,
            price_per_m2: None,
            roi_percent: None,
            occupancy_percent: None,
            adr: None,
            payback_years: None,
            rev_per_m2_month: None,
            season_low_percent: None,
            season_high_percent: None,
        }
    }

    #[test]
    fn test_derives_price_per_m2_within_tolerance() {
        let mut c = candidate();
        c.price = Some(5_000_000.0);
        c.area = Some(28.0);
        c.roi_percent = Some(12.0);

        let m = reconcile(&c).unwrap();
        let rate = m.price_per_m2.unwrap();
        assert!((rate - 178_571.4).abs() < 1.0);
        assert!((m.price - rate * m.area.unwrap()).abs() / m.price <= CLOSURE_TOLERANCE);
        assert!(m.derived.iter().any(|d| d == "price_per_m2"));
        // Headline yield was extracted, so no fallback assumption is tagged.
        assert!(!m.derived.iter().any(|d| d == "assumed-yield"));
        assert!((m.noi_year - 600_000.0).abs() < 1.0);
    }

    #[test]
    fn test_derives_price_from_rate_and_area() {
        let mut c = candidate();
        c.area = Some(40.0);
        c.price_per_m2 = Some(150_000.0);

        let m = reconcile(&c).unwrap();
        assert_eq!(m.price, 6_000_000.0);
        assert!(m.derived.iter().any(|d| d == "price"));
        assert!(m.derived.iter().any(|d| d == "assumed-yield"));
    }

    #[test]
    fn test_extracted_rate_wins_when_consistent() {
        let mut c = candidate();
        c.price = Some(5_000_000.0);
        c.area = Some(28.0);
        c.price_per_m2 = Some(178_600.0); // within 1% of 178 571
        let m = reconcile(&c).unwrap();
        assert_eq!(m.price_per_m2, Some(178_600.0));
        assert!(!m.derived.iter().any(|d| d == "price_per_m2"));
    }

    #[test]
    fn test_inconsistent_rate_recomputed() {
        let mut c = candidate();
        c.price = Some(5_000_000.0);
        c.area = Some(28.0);
        c.price_per_m2 = Some(250_000.0);
        let m = reconcile(&c).unwrap();
        assert!((m.price_per_m2.unwrap() - 178_571.4).abs() < 1.0);
    }

    #[test]
    fn test_adr_occupancy_revenue_preferred_over_roi() {
        let mut c = candidate();
        c.price = Some(5_000_000.0);
        c.area = Some(28.0);
        c.adr = Some(4_200.0);
        c.occupancy_percent = Some(71.0);

        let m = reconcile(&c).unwrap();
        let rev = m.rev_per_m2_month.unwrap();
        let expected = 4_200.0 * 30.4 * 0.71 / 28.0;
        assert!((rev - expected).abs() < 0.01);
        assert!((m.noi_year - rev * 28.0 * 12.0).abs() < 0.01);
        assert!(!m.derived.iter().any(|d| d == "assumed-yield"));
    }

    #[test]
    fn test_missing_occupancy_assumed_and_tagged() {
        let mut c = candidate();
        c.price = Some(5_000_000.0);
        c.area = Some(28.0);
        c.adr = Some(4_200.0);

        let m = reconcile(&c).unwrap();
        assert_eq!(m.occupancy, Some(70.0));
        assert!(m.derived.iter().any(|d| d == "assumed-occupancy"));
    }

    #[test]
    fn test_rejects_record_without_price() {
        let mut c = candidate();
        c.rev_per_m2_month = Some(1_200.0);
        let err = reconcile(&c).unwrap_err();
        assert!(err.reason().contains("no price"));
    }

    #[test]
    fn test_payback_capped_not_infinite() {
        let mut c = candidate();
        c.price = Some(10_000_000.0);
        c.area = Some(28.0);
        c.rev_per_m2_month = Some(200.0); // NOI 67 200, raw ratio ~148 years
        let m = reconcile(&c).unwrap();
        assert_eq!(m.payback_years, FALLBACKS.payback_cap_years);
    }

    #[test]
    fn test_extracted_payback_preferred() {
        let mut c = candidate();
        c.price = Some(5_000_000.0);
        c.roi_percent = Some(12.0);
        c.payback_years = Some(9.0);
        let m = reconcile(&c).unwrap();
        assert_eq!(m.payback_years, 9.0);
        assert!(!m.derived.iter().any(|d| d == "payback_years"));
    }

    #[test]
    fn test_idempotent_on_fully_specified_record() {
        let mut c = candidate();
        c.price = Some(5_000_000.0);
        c.area = Some(28.0);
        c.price_per_m2 = Some(178_571.43);
        c.occupancy_percent = Some(71.0);
        c.adr = Some(4_200.0);
        let first = reconcile(&c).unwrap();

        // Feed the reconciled output back in as a candidate.
        let mut again = c.clone();
        again.price = Some(first.price);
        again.area = first.area;
        again.price_per_m2 = first.price_per_m2;
        again.occupancy_percent = first.occupancy;
        again.adr = first.adr;
        again.rev_per_m2_month = first.rev_per_m2_month;
        again.payback_years = Some(first.payback_years);
        let second = reconcile(&again).unwrap();

        assert_eq!(second.price, first.price);
        assert_eq!(second.area, first.area);
        assert_eq!(second.price_per_m2, first.price_per_m2);
        assert_eq!(second.rev_per_m2_month, first.rev_per_m2_month);
        assert!((second.noi_year - first.noi_year).abs() < 1e-9);
        assert_eq!(second.payback_years, first.payback_years);
    }
}
