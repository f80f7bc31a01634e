use crate::catalog;
use crate::classify;
use crate::config::Config;
use crate::domain::{CanonicalProject, RawRecord, SkipEntry};
use crate::error::{PipelineError, Result};
use crate::extract::{self, Extraction};
use crate::merge::{self, ScoredCandidate};
use crate::quality;
use crate::readers::{JsonDumpReader, MessageExportReader, SheetReader, SourceReader};
use crate::reconcile;
use crate::sink;
use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, instrument, warn};

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub accepted: usize,
    pub skipped: usize,
    pub sources_read: usize,
    pub source_failures: Vec<(String, String)>,
    pub per_city: BTreeMap<String, usize>,
    pub top_skip_reasons: Vec<(String, usize)>,
    pub catalog_file: String,
    pub skip_report_file: String,
}

pub struct Pipeline;

impl Pipeline {
    /// Run the complete batch transformation: read every configured source,
    /// extract and score candidates, merge per slug, reconcile, classify and
    /// serialize. A failed source is reported and the batch continues; no
    /// single record aborts a run.
    #[instrument(skip(config))]
    pub async fn run(config: &Config) -> Result<PipelineResult> {
        info!("🚀 Starting pipeline run");
        println!("🚀 Starting pipeline run");
        counter!("invest_pipeline_runs_total").increment(1);
        let t_pipeline = std::time::Instant::now();

        // Step 1: Read sources
        let readers: Vec<(Box<dyn SourceReader>, std::path::PathBuf)> = vec![
            (
                Box::new(MessageExportReader::new()),
                config.input_dir.join(&config.sources.message_export),
            ),
            (Box::new(SheetReader::new()), config.input_dir.join(&config.sources.sheet)),
            (Box::new(JsonDumpReader::new()), config.input_dir.join(&config.sources.json_dump)),
        ];

        let mut raw_records: Vec<RawRecord> = Vec::new();
        let mut source_failures: Vec<(String, String)> = Vec::new();
        let mut sources_read = 0usize;
        for (reader, path) in readers {
            let name = reader.source_name();
            info!("📡 Reading source {} from {}", name, path.display());
            println!("📡 Reading source {}...", name);
            match reader.read(&path).await {
                Ok(records) => {
                    info!("✅ Source {} produced {} raw records", name, records.len());
                    println!("✅ Source {}: {} raw records", name, records.len());
                    histogram!("invest_raw_records_per_source", "source" => name)
                        .record(records.len() as f64);
                    raw_records.extend(records);
                    sources_read += 1;
                }
                Err(e) => {
                    error!("Source {} failed: {}", name, e);
                    println!("⚠️  Source {} failed: {}", name, e);
                    counter!("invest_source_failures_total", "source" => name).increment(1);
                    source_failures.push((name.to_string(), e.to_string()));
                }
            }
        }

        if sources_read == 0 {
            return Err(PipelineError::SourceUnreadable {
                source_name: "all".to_string(),
                message: "no configured source could be read".to_string(),
            });
        }

        // Step 2: Extract and score candidates
        info!("🔧 Extracting fields from {} raw records...", raw_records.len());
        let mut skip_entries: Vec<SkipEntry> = Vec::new();
        let mut scored: Vec<ScoredCandidate> = Vec::new();
        for raw in &raw_records {
            match extract::extract(raw) {
                Extraction::Accepted(candidate) => {
                    let score = quality::score(&candidate);
                    scored.push(ScoredCandidate { candidate, score });
                }
                Extraction::Skipped(entry) => {
                    counter!("invest_records_skipped_total", "stage" => "extract").increment(1);
                    skip_entries.push(entry);
                }
            }
        }
        info!("✅ {} candidates extracted ({} skipped)", scored.len(), skip_entries.len());
        println!("✅ Extracted {} candidates ({} skipped)", scored.len(), skip_entries.len());

        // Step 3: Merge per slug. This needs the full candidate set, so it
        // runs as one sequential reduction after all extraction completes.
        let candidate_count = scored.len();
        let merged = merge::merge(scored);
        if merged.len() < candidate_count {
            info!("🔗 Merged {} candidates into {} projects", candidate_count, merged.len());
            println!("🔗 Merged {} candidates into {} projects", candidate_count, merged.len());
        }

        // Step 4: Threshold, reconcile, classify
        let updated_at = Utc::now();
        let mut projects: Vec<CanonicalProject> = Vec::new();
        for entry in merged {
            let ScoredCandidate { candidate, score } = entry;
            if score.total < config.accept_threshold {
                counter!("invest_records_skipped_total", "stage" => "quality_gate").increment(1);
                skip_entries.push(SkipEntry {
                    identifier: candidate.source_id.clone(),
                    reason: format!(
                        "below quality threshold ({} < {})",
                        score.total, config.accept_threshold
                    ),
                    quality_score: score.total,
                });
                continue;
            }
            match reconcile::reconcile(&candidate) {
                Ok(metrics) => {
                    let classification = classify::classify(&candidate, metrics.occupancy);
                    projects.push(catalog::build_project(
                        &candidate,
                        metrics,
                        classification,
                        updated_at,
                    ));
                }
                Err(e) => {
                    warn!("Reconciliation rejected {}: {}", candidate.source_id, e.reason());
                    counter!("invest_records_skipped_total", "stage" => "reconcile").increment(1);
                    skip_entries.push(SkipEntry {
                        identifier: candidate.source_id.clone(),
                        reason: e.reason().to_string(),
                        quality_score: score.total,
                    });
                }
            }
        }
        counter!("invest_records_accepted_total").increment(projects.len() as u64);

        // Step 5: Serialize catalog and skip report
        let catalog_file =
            sink::write_catalog(&config.output_dir, projects.clone(), "invest_pipeline", updated_at)?;
        let skip_report_file = sink::write_skip_report(&config.output_dir, &skip_entries)?;
        info!("💾 Saved catalog to {}", catalog_file);
        println!("💾 Saved catalog to {}", catalog_file);

        let total_secs = t_pipeline.elapsed().as_secs_f64();
        histogram!("invest_pipeline_duration_seconds").record(total_secs);

        Ok(PipelineResult {
            accepted: projects.len(),
            skipped: skip_entries.len(),
            sources_read,
            source_failures,
            per_city: per_city_counts(&projects),
            top_skip_reasons: top_reasons(&skip_entries, 3),
            catalog_file,
            skip_report_file,
        })
    }
}

fn per_city_counts(projects: &[CanonicalProject]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for project in projects {
        *counts.entry(project.city.clone()).or_insert(0) += 1;
    }
    counts
}

fn top_reasons(entries: &[SkipEntry], limit: usize) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.reason.as_str()).or_insert(0) += 1;
    }
    let mut sorted: Vec<(String, usize)> =
        counts.into_iter().map(|(reason, count)| (reason.to_string(), count)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(limit);
    sorted
}
