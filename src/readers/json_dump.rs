use super::{unreadable, SourceReader};
use crate::constants::JSON_DUMP_SOURCE;
use crate::domain::{ProjectStatus, RawRecord};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// Reads a hand-authored JSON dump: either a flat array of objects or an
/// `{ "objects": [...] }` wrapper. Records arrive already structured, so
/// they bypass pattern extraction naturally (every known key maps straight
/// onto a raw-record field). Unknown keys are dropped.
pub struct JsonDumpReader;

impl JsonDumpReader {
    pub fn new() -> Self {
        Self
    }

    fn field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().find_map(|k| obj.get(k))
    }

    fn string_field(obj: &Value, keys: &[&str]) -> Option<String> {
        Self::field(obj, keys)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn number_field(obj: &Value, keys: &[&str]) -> Option<f64> {
        match Self::field(obj, keys)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => super::parse_number(s),
            _ => None,
        }
    }

    fn status_field(obj: &Value) -> Option<ProjectStatus> {
        let status = Self::string_field(obj, &["status"])?;
        match status.to_lowercase().as_str() {
            "active" => Some(ProjectStatus::Active),
            "construction" => Some(ProjectStatus::Construction),
            "planning" => Some(ProjectStatus::Planning),
            other => {
                warn!("JsonDumpReader: unrecognized status '{}'", other);
                None
            }
        }
    }

    fn to_raw(obj: &Value, index: usize) -> RawRecord {
        let identifier = Self::string_field(obj, &["id", "slug"])
            .unwrap_or_else(|| (index + 1).to_string());
        let photos = Self::field(obj, &["photos", "images"])
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|p| p.as_str())
                    .map(|p| p.to_string())
                    .collect()
            })
            .unwrap_or_default();

        RawRecord {
            source_id: format!("{}:{}", JSON_DUMP_SOURCE, identifier),
            source_date: None,
            title: Self::string_field(obj, &["title", "name"]),
            city: Self::string_field(obj, &["city"]),
            body: None,
            description: Self::string_field(obj, &["description", "summary"]),
            photos,
            format: Self::string_field(obj, &["format"]),
            status: Self::status_field(obj),
            price: Self::number_field(obj, &["price"]),
            area: Self::number_field(obj, &["area"]),
            price_per_m2: Self::number_field(obj, &["pricePerM2", "price_per_m2"]),
            roi_percent: Self::number_field(obj, &["roiPercent", "roi_percent", "roi"]),
            occupancy_percent: Self::number_field(obj, &["occupancy", "occupancyPercent", "occupancy_percent"]),
            adr: Self::number_field(obj, &["adr"]),
            payback_years: Self::number_field(obj, &["paybackYears", "payback_years"]),
            rev_per_m2_month: Self::number_field(obj, &["revPerM2Month", "rev_per_m2_month"]),
        }
    }
}

impl Default for JsonDumpReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceReader for JsonDumpReader {
    fn source_name(&self) -> &'static str {
        JSON_DUMP_SOURCE
    }

    async fn read(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| unreadable(JSON_DUMP_SOURCE, path, e))?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| unreadable(JSON_DUMP_SOURCE, path, e))?;

        let objects = match &value {
            Value::Array(arr) => arr.as_slice(),
            Value::Object(_) => value
                .get("objects")
                .and_then(|o| o.as_array())
                .map(|a| a.as_slice())
                .unwrap_or(&[]),
            _ => &[],
        };

        let mut out = Vec::new();
        let mut skipped = 0usize;
        for (index, obj) in objects.iter().enumerate() {
            if !obj.is_object() {
                warn!("JsonDumpReader: entry {} is not an object; skipping", index);
                skipped += 1;
                continue;
            }
            out.push(Self::to_raw(obj, index));
        }

        info!("JsonDumpReader: extracted records count={} skipped={}", out.len(), skipped);
        Ok(out)
    }
}
