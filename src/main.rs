use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use invest_pipeline::config::Config;
use invest_pipeline::domain::Catalog;
use invest_pipeline::logging;
use invest_pipeline::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "invest_pipeline")]
#[command(about = "Investment-property data normalization pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full normalization pipeline over a batch of source files
    Run {
        /// Directory holding the source files
        #[arg(long)]
        input_dir: Option<PathBuf>,
        /// Directory the catalog and skip report are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Optional TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a summary of a previously produced catalog
    Inspect {
        /// Path to catalog.json
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { input_dir, output_dir, config } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(dir) = input_dir {
                config.input_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }

            match Pipeline::run(&config).await {
                Ok(result) => {
                    info!("Pipeline finished");
                    println!("\n📊 Pipeline Results:");
                    println!("   Sources read: {}", result.sources_read);
                    println!("   Accepted: {}", result.accepted);
                    println!("   Skipped: {}", result.skipped);
                    if !result.top_skip_reasons.is_empty() {
                        println!("   Top skip reasons:");
                        for (reason, count) in &result.top_skip_reasons {
                            println!("      {} × {}", count, reason);
                        }
                    }
                    if !result.per_city.is_empty() {
                        println!("   Projects per city:");
                        for (city, count) in &result.per_city {
                            println!("      {}: {}", city, count);
                        }
                    }
                    if !result.source_failures.is_empty() {
                        println!("\n⚠️  Failed sources:");
                        for (source, reason) in &result.source_failures {
                            println!("   - {}: {}", source, reason);
                        }
                    }
                    println!("   Catalog: {}", result.catalog_file);
                    println!("   Skip report: {}", result.skip_report_file);
                }
                Err(e) => {
                    // Only a batch with no readable source at all is fatal.
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {}", e);
                    return Err(Box::new(e) as Box<dyn std::error::Error>);
                }
            }
        }
        Commands::Inspect { catalog } => {
            let content = std::fs::read_to_string(&catalog)?;
            let catalog: Catalog = serde_json::from_str(&content)?;
            println!("📒 Catalog updated {}", catalog.sources.updated_at);
            println!("   Objects: {}", catalog.objects.len());
            for project in &catalog.objects {
                println!(
                    "   {} — {} ({}), {:.1} млн ₽, окупаемость {:.1} лет [{:?}]",
                    project.slug,
                    project.title,
                    project.city,
                    project.price / 1_000_000.0,
                    project.payback_years,
                    project.risk_level
                );
            }
        }
    }
    Ok(())
}
