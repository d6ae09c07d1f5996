//! Layered analysis settings: built-in defaults, an optional TOML file and
//! `SOLAR_*` environment variables, with CLI flags applied last by the caller.

use crate::error::{ProcessingError, Result};
use crate::utils::constants::*;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input files read at start-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    /// Zipped planning-area boundary shapefile
    pub boundary_archive: PathBuf,
    /// System database exported as CSV
    pub system_database: PathBuf,
    /// `Listed` → `Actual` location corrections
    pub location_corrections: PathBuf,
    /// `System name` → `Actual` corrections
    pub name_corrections: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            boundary_archive: PathBuf::from(DEFAULT_BOUNDARY_ARCHIVE),
            system_database: PathBuf::from(DEFAULT_SYSTEM_DATABASE),
            location_corrections: PathBuf::from(DEFAULT_LOCATION_CORRECTIONS),
            name_corrections: PathBuf::from(DEFAULT_NAME_CORRECTIONS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub inputs: InputPaths,

    /// Report directory; a dated directory under `output/` when unset
    pub output_dir: Option<PathBuf>,

    /// Portfolio-level entries that must never be placed on the map
    pub disallowed_systems: Vec<String>,

    /// Technologies reported individually; anything else becomes "Other"
    pub technology_types: Vec<String>,

    /// Root label for hierarchy charts
    pub country: String,

    /// Parquet compression codec
    pub compression: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            inputs: InputPaths::default(),
            output_dir: None,
            disallowed_systems: DEFAULT_DISALLOWED_SYSTEMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            technology_types: DEFAULT_TECHNOLOGY_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            country: DEFAULT_COUNTRY.to_string(),
            compression: COMPRESSION_SNAPPY.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Load settings from `path` (required when given) or from
    /// `solar-analysis.toml` in the working directory when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_source = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings = Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("disallowed_systems")
                    .with_list_parse_key("technology_types")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.check()?;

        tracing::debug!(?config, "loaded analysis configuration");
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        if self.country.trim().is_empty() {
            return Err(ProcessingError::Config(
                "country label must not be empty".to_string(),
            ));
        }

        if let Some(blank) = self
            .disallowed_systems
            .iter()
            .chain(self.technology_types.iter())
            .find(|s| s.trim().is_empty())
        {
            return Err(ProcessingError::Config(format!(
                "blank entry '{}' in system or technology list",
                blank
            )));
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(duplicate) = self.technology_types.iter().find(|t| !seen.insert(t.trim())) {
            return Err(ProcessingError::Config(format!(
                "technology '{}' is listed more than once",
                duplicate
            )));
        }

        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(crate::utils::generate_default_output_dir)
    }

    pub fn is_disallowed(&self, system_name: &str) -> bool {
        let name = system_name.trim();
        self.disallowed_systems.iter().any(|d| d.trim() == name)
    }

    pub fn is_known_technology(&self, technology: &str) -> bool {
        self.technology_types.iter().any(|t| t == technology)
    }
}
