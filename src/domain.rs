use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Source-format-agnostic record as emitted by a source reader.
///
/// Every field except `source_id` is optional: a message-export record
/// typically carries only `body` and `photos`, a sheet row carries the
/// structured numerics, and a JSON dump carries nearly everything.
/// Immutable once produced; consumed only by the field extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// Message id or row index, prefixed with the source name.
    pub source_id: String,
    pub source_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub city: Option<String>,
    /// Free text the pattern rules run over.
    pub body: Option<String>,
    pub description: Option<String>,
    pub photos: Vec<String>,
    pub format: Option<String>,
    pub status: Option<ProjectStatus>,
    // Structured numeric hints. Zero and out-of-range values are treated as
    // absent by the extractor's validators, never clamped.
    pub price: Option<f64>,
    pub area: Option<f64>,
    pub price_per_m2: Option<f64>,
    pub roi_percent: Option<f64>,
    pub occupancy_percent: Option<f64>,
    pub adr: Option<f64>,
    pub payback_years: Option<f64>,
    pub rev_per_m2_month: Option<f64>,
}

/// A raw record after field extraction. Fields are individually optional;
/// nothing is defaulted before reconciliation apart from the documented
/// city/status inference in the extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub source_id: String,
    pub source_date: Option<NaiveDate>,
    /// Normalized identity key derived from the title.
    pub slug: String,
    pub title: String,
    pub city: String,
    pub format: Option<String>,
    pub status: ProjectStatus,
    pub description: Option<String>,
    pub photos: Vec<String>,
    pub price: Option<f64>,
    pub area: Option<f64>,
    pub price_per_m2: Option<f64>,
    pub roi_percent: Option<f64>,
    pub occupancy_percent: Option<f64>,
    pub adr: Option<f64>,
    pub payback_years: Option<f64>,
    pub rev_per_m2_month: Option<f64>,
    /// Low/high season occupancy samples, when the text mentions only a
    /// two-point seasonal profile instead of a full curve.
    pub season_low_percent: Option<f64>,
    pub season_high_percent: Option<f64>,
}

/// Lifecycle status of a project in the catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Construction,
    Planning,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Risk tier assigned by the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Bounded completeness/plausibility score attached to a candidate.
/// Immutable once computed; a merged record gets a fresh score from its
/// final field set instead of reusing any constituent's.
#[derive(Debug, Clone, Serialize)]
pub struct QualityScore {
    /// Sum of the passed check weights, in 0..=100.
    pub total: u8,
    /// Names of the checks that passed, for the skip report and logs.
    pub passed: Vec<&'static str>,
}

/// The canonical, reconciled entity handed to downstream consumers.
/// Replaced wholesale on every pipeline run; never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalProject {
    pub slug: String,
    pub title: String,
    pub city: String,
    pub country: String,
    pub format: String,
    pub status: ProjectStatus,
    pub price: f64,
    pub area: Option<f64>,
    pub price_per_m2: Option<f64>,
    pub rev_per_m2_month: Option<f64>,
    pub noi_year: f64,
    pub payback_years: f64,
    pub occupancy: Option<f64>,
    pub adr: Option<f64>,
    pub risk_level: RiskLevel,
    pub summary: String,
    pub why: Vec<String>,
    pub risks: Vec<String>,
    /// Monthly load percentages, January first.
    pub seasonality: [u8; 12],
    /// Names of fields produced by derivation or fallback assumptions rather
    /// than extracted from a source, so consumers can tell measured from
    /// assumed values.
    pub derived: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Audit entry for a record that never reached the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipEntry {
    pub identifier: String,
    pub reason: String,
    pub quality_score: u8,
}

/// The serialized collection downstream consumers read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub objects: Vec<CanonicalProject>,
    pub sources: SourceStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStamp {
    pub updated_at: DateTime<Utc>,
    pub source: String,
}
