/// Engine configuration and loading
use crate::error::{EngineError, EngineResult};
use confluo_protocol::CompleteLength;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Engine-wide defaults; request-level values take precedence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Filter used by sources without their own
    pub default_filter: String,
    /// Filters run after the source filter, in order
    pub extra_filters: Vec<String>,
    pub complete_length: Option<CompleteLength>,
    /// Scope -> word pattern, layered over the built-in table
    pub word_patterns: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_filter: "prefix".to_string(),
            extra_filters: Vec::new(),
            complete_length: None,
            word_patterns: HashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    pub fn with_extra_filter(mut self, filter: impl Into<String>) -> Self {
        self.extra_filters.push(filter.into());
        self
    }

    pub fn with_complete_length(mut self, complete_length: CompleteLength) -> Self {
        self.complete_length = Some(complete_length);
        self
    }

    pub fn with_word_pattern(mut self, scope: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.word_patterns.insert(scope.into(), pattern.into());
        self
    }
}

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> EngineResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(EngineError::Config(format!(
                "Unsupported configuration file: {}",
                path.display()
            ))),
        }
    }
}

/// Engine configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load engine configuration from a YAML file
    pub fn load_from_yaml(path: &Path) -> EngineResult<EngineConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_string(&content, ConfigFormat::Yaml)
    }

    /// Load engine configuration from a JSON file
    pub fn load_from_json(path: &Path) -> EngineResult<EngineConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_string(&content, ConfigFormat::Json)
    }

    /// Load a YAML or JSON file, picked by extension
    pub fn load_from_path(path: &Path) -> EngineResult<EngineConfig> {
        debug!("loading engine configuration from {}", path.display());
        match ConfigFormat::from_path(path)? {
            ConfigFormat::Yaml => Self::load_from_yaml(path),
            ConfigFormat::Json => Self::load_from_json(path),
        }
    }

    /// Load engine configuration from a string
    pub fn load_from_string(content: &str, format: ConfigFormat) -> EngineResult<EngineConfig> {
        let config: EngineConfig = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Validate engine configuration
    pub fn validate_config(config: &EngineConfig) -> EngineResult<()> {
        if config.default_filter.trim().is_empty() {
            return Err(EngineError::Config(
                "Default filter cannot be empty".to_string(),
            ));
        }

        if config.extra_filters.iter().any(|f| f.trim().is_empty()) {
            return Err(EngineError::Config(
                "Extra filter ids cannot be empty".to_string(),
            ));
        }

        if let Some(CompleteLength::Tiered(tiers)) = &config.complete_length {
            if tiers.is_empty() {
                return Err(EngineError::Config(
                    "Complete length table cannot be empty".to_string(),
                ));
            }
            if let Some((threshold, _)) = tiers.iter().find(|(threshold, _)| *threshold < 0) {
                return Err(EngineError::Config(format!(
                    "Complete length threshold cannot be negative: {}",
                    threshold
                )));
            }
        }

        for (scope, pattern) in &config.word_patterns {
            Regex::new(pattern).map_err(|err| EngineError::InvalidPattern {
                pattern: pattern.clone(),
                message: format!("word pattern for scope '{}': {}", scope, err),
            })?;
        }

        Ok(())
    }
}
