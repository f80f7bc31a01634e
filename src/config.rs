use crate::constants;
use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for the conventional source files.
    pub input_dir: PathBuf,
    /// Directory the catalog and skip report are written into.
    pub output_dir: PathBuf,
    /// Minimum recomputed quality score a merged record needs to be reconciled.
    pub accept_threshold: u8,
    pub sources: SourceFiles,
}

/// File names of the three source shapes, relative to `input_dir`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub message_export: String,
    pub sheet: String,
    pub json_dump: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            message_export: constants::MESSAGE_EXPORT_FILE.to_string(),
            sheet: constants::SHEET_FILE.to_string(),
            json_dump: constants::JSON_DUMP_FILE.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            accept_threshold: crate::quality::DEFAULT_ACCEPT_THRESHOLD,
            sources: SourceFiles::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, or from `config.toml` when
    /// present, or fall back to the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    PipelineError::Config(format!(
                        "Failed to read config file '{}': {}",
                        p.display(),
                        e
                    ))
                })?;
                let config: Config = toml::from_str(&content)?;
                Ok(config)
            }
            None => {
                let default_path = Path::new("config.toml");
                if default_path.exists() {
                    let content = fs::read_to_string(default_path).map_err(|e| {
                        PipelineError::Config(format!("Failed to read config.toml: {}", e))
                    })?;
                    let config: Config = toml::from_str(&content)?;
                    Ok(config)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }
}
