//! Engine configuration (C8 ambient concern): the LRU capacity and default
//! generation/filling policy an [`crate::driver::InferenceDriver`] is built
//! with, plus the per-call [`crate::driver::InferenceFlowConfig`] flags,
//! loadable from the environment or CLI the way the teacher's `ServerConfig`
//! is.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

use crate::driver::InferenceFlowConfig;
use crate::policy::{FillingType, GenerationType};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Engine-wide configuration with validation.
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the positive-membership LRU cache each search-policy
    /// filter maintains (spec.md §8's `LRU(3)` scenario uses a tiny cap;
    /// production callers want something larger).
    #[validate(range(min = 1, max = 1_000_000, message = "LRU capacity must be between 1 and 1,000,000"))]
    pub lru_capacity: usize,

    /// `GENERATE_UNIQUE_FORMULAS` when true, `GENERATE_ALL_FORMULAS` when false.
    pub generate_unique_formulas: bool,

    /// `FILL_GENERATED_ONLY` when true, `FILL_SEARCHED_AND_GENERATED` when false.
    pub fill_generated_only: bool,

    /// Whether `apply_inference` builds and attaches a solution tree.
    pub generate_solution_tree: bool,

    /// Enables the atom's "search without replacements" pre-generation probe.
    pub search_in_kb_when_generating: bool,

    /// `REPLACEMENTS_ALL` when true, `REPLACEMENTS_FIRST` when false.
    pub replacements_all: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lru_capacity: 64,
            generate_unique_formulas: true,
            fill_generated_only: true,
            generate_solution_tree: true,
            search_in_kb_when_generating: true,
            replacements_all: true,
        }
    }
}

impl EngineConfig {
    pub fn generation_type(&self) -> GenerationType {
        if self.generate_unique_formulas {
            GenerationType::GenerateUniqueFormulas
        } else {
            GenerationType::GenerateAll
        }
    }

    pub fn filling_type(&self) -> FillingType {
        if self.fill_generated_only {
            FillingType::GeneratedOnly
        } else {
            FillingType::SearchedAndGenerated
        }
    }

    pub fn flow(&self) -> InferenceFlowConfig {
        InferenceFlowConfig {
            generate_solution_tree: self.generate_solution_tree,
            search_in_kb_when_generating: self.search_in_kb_when_generating,
            replacements_all: self.replacements_all,
        }
    }

    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            lru_capacity: parse_env_var("INFERENCE_LRU_CAPACITY", "64")?,
            generate_unique_formulas: parse_env_var("INFERENCE_GENERATE_UNIQUE_FORMULAS", "true")?,
            fill_generated_only: parse_env_var("INFERENCE_FILL_GENERATED_ONLY", "true")?,
            generate_solution_tree: parse_env_var("INFERENCE_GENERATE_SOLUTION_TREE", "true")?,
            search_in_kb_when_generating: parse_env_var("INFERENCE_SEARCH_IN_KB_WHEN_GENERATING", "true")?,
            replacements_all: parse_env_var("INFERENCE_REPLACEMENTS_ALL", "true")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            lru_capacity: cli.lru_capacity,
            generate_unique_formulas: cli.generate_unique_formulas,
            fill_generated_only: cli.fill_generated_only,
            generate_solution_tree: cli.generate_solution_tree,
            search_in_kb_when_generating: cli.search_in_kb_when_generating,
            replacements_all: cli.replacements_all,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Merge with another configuration (CLI overrides environment)
    pub fn merge(&mut self, other: Self) {
        self.lru_capacity = other.lru_capacity;
        self.generate_unique_formulas = other.generate_unique_formulas;
        self.fill_generated_only = other.fill_generated_only;
        self.generate_solution_tree = other.generate_solution_tree;
        self.search_in_kb_when_generating = other.search_in_kb_when_generating;
        self.replacements_all = other.replacements_all;
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub lru_capacity: usize,
    pub generate_unique_formulas: bool,
    pub fill_generated_only: bool,
    pub generate_solution_tree: bool,
    pub search_in_kb_when_generating: bool,
    pub replacements_all: bool,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lru_capacity, 64);
        assert!(config.generate_unique_formulas);
    }

    #[test]
    fn test_invalid_lru_capacity() {
        let config = EngineConfig {
            lru_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_flow_reflects_fields() {
        let config = EngineConfig {
            generate_solution_tree: false,
            replacements_all: false,
            ..Default::default()
        };
        let flow = config.flow();
        assert!(!flow.generate_solution_tree);
        assert!(!flow.replacements_all);
    }
}
