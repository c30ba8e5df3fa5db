//! Configuration loading for Cystcare.
//! Reads cystcare.toml from the current directory or the path in the CYSTCARE_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use cystcare_triage::ContextSources;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// JSON bundle written by the training job
    #[serde(default = "default_bundle_path")]
    pub bundle_path: PathBuf,
}

fn default_bundle_path() -> PathBuf { PathBuf::from("models/cyst_bundle.json") }

impl Default for ModelConfig {
    fn default() -> Self {
        Self { bundle_path: default_bundle_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_inventory_csv")]
    pub inventory_csv: PathBuf,
    #[serde(default = "default_charges_csv")]
    pub charges_csv: PathBuf,
    /// Optional YAML override of the built-in protocol and supply tables
    pub reference_tables: Option<PathBuf>,
}

fn default_inventory_csv() -> PathBuf { PathBuf::from("data/inventory.csv") }
fn default_charges_csv()   -> PathBuf { PathBuf::from("data/hospital_charges.csv") }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            inventory_csv: default_inventory_csv(),
            charges_csv: default_charges_csv(),
            reference_tables: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "cystcare=info,warn".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize { 4 }

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: default_workers() }
    }
}

impl Config {
    /// Load from `path`, else CYSTCARE_CONFIG, else ./cystcare.toml.
    /// A missing default file yields the built-in defaults; a missing
    /// explicitly named file is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var("CYSTCARE_CONFIG") {
                Ok(p) => (PathBuf::from(p), true),
                Err(_) => (PathBuf::from("cystcare.toml"), false),
            },
        };

        if !path.exists() {
            if explicit {
                anyhow::bail!(
                    "Config file not found: {}\n\
                     Copy cystcare.example.toml to cystcare.toml and edit it.",
                    path.display()
                );
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.batch.workers == 0 {
            anyhow::bail!("batch.workers must be at least 1");
        }
        Ok(config)
    }

    pub fn sources(&self) -> ContextSources {
        ContextSources {
            bundle: self.model.bundle_path.clone(),
            inventory_csv: self.data.inventory_csv.clone(),
            charges_csv: self.data.charges_csv.clone(),
            reference_tables: self.data.reference_tables.clone(),
        }
    }
}

#[cfg(test)]
mod tests;
