/// Plausible-range checks, decoupled from the patterns so new rules cannot
/// bypass range sanity. A value outside its range is discarded like a miss,
/// never clamped: clamping would fabricate data.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumField {
    Price,
    Area,
    PricePerM2,
    RoiPercent,
    OccupancyPercent,
    Adr,
    PaybackYears,
    RevPerM2Month,
}

/// Sane national ranges per field. An "area" of 3 is a floor count, an
/// "area" of 4000 is a phone fragment; neither is a listing.
pub fn plausible(field: NumField, value: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    let (min, max) = match field {
        NumField::Price => (500_000.0, 500_000_000.0),
        NumField::Area => (10.0, 200.0),
        NumField::PricePerM2 => (50_000.0, 1_500_000.0),
        NumField::RoiPercent => (4.0, 40.0),
        NumField::OccupancyPercent => (20.0, 100.0),
        NumField::Adr => (1_000.0, 60_000.0),
        NumField::PaybackYears => (1.0, 40.0),
        NumField::RevPerM2Month => (200.0, 20_000.0),
    };
    value >= min && value <= max
}
