use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decision engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reuse parsed conditions across decisions
    pub cache_conditions: bool,

    /// Rule count at which policy coverage reaches 100%
    pub coverage_rule_target: usize,

    /// Record the outcome of every rule on each decision
    pub trace_decisions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_conditions: true,
            coverage_rule_target: 5,
            trace_decisions: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.coverage_rule_target == 0 {
            return Err(Error::Config("coverage_rule_target must be > 0".into()));
        }
        Ok(())
    }
}
