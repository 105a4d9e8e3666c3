// src/config.rs

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::ingest::SourcePatterns;
use crate::surveillance::{summary::DEFAULT_MRSA_ALERT_FACTOR, NormalizeOptions, DEFAULT_HIGHLIGHT};

pub const CONFIG_ENV: &str = "STAPHWATCH_CONFIG";
pub const DATA_DIR_ENV: &str = "STAPHWATCH_DATA_DIR";
pub const YEAR_ENV: &str = "STAPHWATCH_YEAR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory of CSV exports, or a `.zip` bundle of them.
    pub data_dir: PathBuf,
    /// Reporting year; applied to period labels without one and to the range catalog.
    pub year: i32,
    pub period_column: String,
    pub total_column: String,
    pub non_period_markers: Vec<String>,
    pub mrsa_alert_factor: f64,
    pub highlight: Vec<String>,
    pub sources: SourcePatterns,
}

impl Default for Config {
    fn default() -> Self {
        let norm = NormalizeOptions::default();
        Self {
            data_dir: PathBuf::from("data"),
            year: norm.year_context,
            period_column: norm.period_column,
            total_column: norm.total_column,
            non_period_markers: norm.non_period_markers,
            mrsa_alert_factor: DEFAULT_MRSA_ALERT_FACTOR,
            highlight: DEFAULT_HIGHLIGHT.iter().map(|s| s.to_string()).collect(),
            sources: SourcePatterns::default(),
        }
    }
}

impl Config {
    /// Load from `path`, else from `$STAPHWATCH_CONFIG`, else defaults; then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| env::var(key).ok())
    }

    /// `load` with the environment read through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = lookup(CONFIG_ENV)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let mut cfg = match path.map(Path::to_path_buf).or(from_env) {
            Some(p) => Self::from_file(&p)?,
            None => {
                debug!("no config file; using defaults");
                Self::default()
            }
        };
        cfg.apply_overrides(lookup)?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Override fields from `lookup` (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|s| !s.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(year) = lookup(YEAR_ENV) {
            self.year = year
                .trim()
                .parse()
                .with_context(|| format!("{} is not a year: {:?}", YEAR_ENV, year))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.mrsa_alert_factor.is_finite() && self.mrsa_alert_factor > 0.0) {
            return Err(anyhow!("mrsa_alert_factor must be positive, got {}", self.mrsa_alert_factor));
        }
        if !(1..=9999).contains(&self.year) {
            return Err(anyhow!("year out of range: {}", self.year));
        }
        Ok(())
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            period_column: self.period_column.clone(),
            total_column: self.total_column.clone(),
            year_context: self.year,
            non_period_markers: self.non_period_markers.clone(),
        }
    }
}
