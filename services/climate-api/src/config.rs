//! Service configuration loaded from YAML.
//!
//! Every field has a default, so a partial file (or no file at all) yields
//! a working configuration:
//!
//! ```yaml
//! dataset:
//!   path: data/combined_data.nc
//!   variable: TMP
//! limits:
//!   max_points: 10000
//!   sample_seed: 42
//!   max_grid_cells: 50000000
//!   max_area_sq_degrees: null
//! errors:
//!   strict_status_codes: false
//!   include_traceback: true
//! frontend:
//!   template_dir: templates
//!   static_dir: static
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_processor::{SizeLimits, DEFAULT_MAX_POINTS, DEFAULT_SAMPLE_SEED};
use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub errors: ErrorsConfig,

    #[serde(default)]
    pub frontend: FrontendConfig,
}

impl ServiceConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file {} does not exist, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("Failed to parse: {:?}", path))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Location of the backing dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,

    /// Name of the temperature variable.
    #[serde(default = "default_variable")]
    pub variable: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            variable: default_variable(),
        }
    }
}

/// Response size and sampling limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum rows returned by `/api/data`.
    #[serde(default = "default_max_points")]
    pub max_points: usize,

    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,

    /// Maximum grid cells (time x lat x lon) read per request.
    #[serde(default = "default_max_grid_cells")]
    pub max_grid_cells: usize,

    /// Maximum bounding box area in square degrees.
    #[serde(default)]
    pub max_area_sq_degrees: Option<f64>,
}

impl LimitsConfig {
    pub fn size_limits(&self) -> SizeLimits {
        SizeLimits {
            max_grid_cells: self.max_grid_cells,
            max_area_sq_degrees: self.max_area_sq_degrees,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            sample_seed: default_sample_seed(),
            max_grid_cells: default_max_grid_cells(),
            max_area_sq_degrees: None,
        }
    }
}

/// How failures are reported to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorsConfig {
    /// Use 400/413/422/503 instead of answering 500 for every failure.
    #[serde(default)]
    pub strict_status_codes: bool,

    #[serde(default = "default_true")]
    pub include_traceback: bool,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            strict_status_codes: false,
            include_traceback: true,
        }
    }
}

/// Front-end file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/combined_data.nc")
}

fn default_variable() -> String {
    "TMP".to_string()
}

fn default_max_points() -> usize {
    DEFAULT_MAX_POINTS
}

fn default_sample_seed() -> u64 {
    DEFAULT_SAMPLE_SEED
}

fn default_max_grid_cells() -> usize {
    SizeLimits::default().max_grid_cells
}

fn default_true() -> bool {
    true
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
