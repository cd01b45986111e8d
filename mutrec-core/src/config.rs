use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MUTS_MIN, DEFAULT_REFERENCE_GENOME, DEFAULT_SAMPLING, DEFAULT_SAMPLING_CHUNK};
use crate::errors::ConfigError;

/// Statistic computed on observed and simulated mutation sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    /// Largest number of mutations sharing one position
    #[default]
    Hotspot,
    /// Number of mutations landing on an already mutated position
    Recurrence,
    /// Number of mutations inside the element's regions of interest
    Regions,
}

impl std::str::FromStr for ScoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hotspot" => Ok(ScoreKind::Hotspot),
            "recurrence" => Ok(ScoreKind::Recurrence),
            "regions" => Ok(ScoreKind::Regions),
            other => Err(ConfigError::InvalidValue {
                field: "score",
                reason: format!("unknown score `{}`", other),
            }),
        }
    }
}

///
/// Parameters of one analysis run.
///
/// The object is immutable once validated; the simulation driver receives
/// it at construction instead of reading any global state.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Identifier of the reference genome dataset (e.g. `hg38`)
    pub reference_genome: String,
    /// Elements with fewer observed mutations are not analysed
    pub muts_min: usize,
    /// Total number of null trials per element
    pub sampling: usize,
    /// Trials per chunk task
    pub sampling_chunk: usize,
    /// Seed for reproducible runs; drawn from OS entropy when absent
    pub seed: Option<u64>,
    /// Worker count; all available cores when absent
    pub cores: Option<usize>,
    pub score: ScoreKind,
    /// Directory holding `<reference_genome>.fa[.gz]`
    pub genomes_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            reference_genome: DEFAULT_REFERENCE_GENOME.to_string(),
            muts_min: DEFAULT_MUTS_MIN,
            sampling: DEFAULT_SAMPLING,
            sampling_chunk: DEFAULT_SAMPLING_CHUNK,
            seed: None,
            cores: None,
            score: ScoreKind::default(),
            genomes_dir: None,
        }
    }
}

impl RunConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference_genome.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "reference_genome",
                reason: "must not be empty".to_string(),
            });
        }
        if self.sampling == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sampling",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.sampling_chunk == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sampling_chunk",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.cores == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cores",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
