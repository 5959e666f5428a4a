use crate::error::KpiError;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level logkpi configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiConfig {
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Input handling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Fail the batch when malformed lines / total lines exceeds this ratio.
    /// Unset = malformed lines never fail the batch.
    #[serde(default)]
    pub max_malformed_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Default output file. `None` → stdout.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_log_level() -> String { "info".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Csv,
            path: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl KpiConfig {
    /// Load configuration from YAML file + `LOGKPI_` env overrides.
    ///
    /// Nested keys use a double underscore, e.g. `LOGKPI_OUTPUT__FORMAT=jsonl`.
    pub fn load(path: &Path) -> Result<Self, KpiError> {
        let config: KpiConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("LOGKPI_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), KpiError> {
        if let Some(ratio) = self.reader.max_malformed_ratio
            && !(0.0..=1.0).contains(&ratio)
        {
            return Err(KpiError::Config(format!(
                "reader.max_malformed_ratio must be within [0, 1], got {ratio}"
            )));
        }
        Ok(())
    }
}
