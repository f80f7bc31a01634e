use crate::constants::{CATALOG_FILE, SKIP_REPORT_FILE};
use crate::domain::{Catalog, CanonicalProject, SkipEntry, SourceStamp};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// Serialize the canonical collection. The whole document is replaced on
/// every run; there is no incremental update.
pub fn write_catalog(
    output_dir: &Path,
    objects: Vec<CanonicalProject>,
    source: &str,
    updated_at: DateTime<Utc>,
) -> Result<String> {
    fs::create_dir_all(output_dir)?;
    let catalog = Catalog {
        objects,
        sources: SourceStamp { updated_at, source: source.to_string() },
    };
    let filepath = output_dir.join(CATALOG_FILE);
    let json_content = serde_json::to_string_pretty(&catalog)?;
    fs::write(&filepath, json_content)?;
    Ok(filepath.to_string_lossy().to_string())
}

/// Serialize the skip report, the durable artifact for investigating
/// systematic data-quality problems.
pub fn write_skip_report(output_dir: &Path, entries: &[SkipEntry]) -> Result<String> {
    fs::create_dir_all(output_dir)?;
    let filepath = output_dir.join(SKIP_REPORT_FILE);
    let json_content = serde_json::to_string_pretty(entries)?;
    fs::write(&filepath, json_content)?;
    Ok(filepath.to_string_lossy().to_string())
}
