//! Run configuration, loaded from TOML.
//!
//! ```toml
//! count = 10
//! stages = ["increment", "double"]
//! format = "json"
//! seed = ["2", "1"]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::arithmetic::parse_natural;
use crate::error::KernelError;
use crate::sink::OutputFormat;
use crate::source::Fibonacci;
use crate::stages::{build_pipeline, IntegerPipeline};

pub const DEFAULT_COUNT: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// How many values to pull.
    pub count: u64,
    /// Stage specs, applied in order.
    pub stages: Vec<String>,
    pub format: OutputFormat,
    /// Decimal `(a, b)` seed; the standard `(0, 1)` when absent.
    pub seed: Option<[String; 2]>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            stages: Vec::new(),
            format: OutputFormat::Plain,
            seed: None,
        }
    }
}

/// Command-line values that take precedence over a loaded config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub count: Option<u64>,
    /// Replaces the configured stages when non-empty.
    pub stages: Vec<String>,
    pub json: bool,
}

impl RunConfig {
    /// Apply flag values on top of this config.
    pub fn merge(mut self, overrides: Overrides) -> Self {
        if let Some(count) = overrides.count {
            self.count = count;
        }
        if !overrides.stages.is_empty() {
            self.stages = overrides.stages;
        }
        if overrides.json {
            self.format = OutputFormat::Json;
        }
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self, KernelError> {
        toml::from_str(text).map_err(|e| KernelError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, KernelError> {
        let text = fs::read_to_string(path)
            .map_err(|e| KernelError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn source(&self) -> Result<Fibonacci, KernelError> {
        match &self.seed {
            Some([a, b]) => Ok(Fibonacci::seeded(parse_natural(a)?, parse_natural(b)?)),
            None => Ok(Fibonacci::new()),
        }
    }

    /// `None` when no stages are configured.
    pub fn pipeline(&self) -> Result<Option<IntegerPipeline>, KernelError> {
        if self.stages.is_empty() {
            return Ok(None);
        }
        build_pipeline(&self.stages).map(Some)
    }
}
