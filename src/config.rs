//! Engine Configuration

use crate::{Result, RiskError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding `model_path`
pub const MODEL_PATH_ENV: &str = "PEDIARISK_MODEL_PATH";

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Classifier artifact (JSON)
    pub model_path: String,
    /// HTTP listen address
    pub listen_addr: String,
    /// Upper bound on one assessment, including classifier probes
    pub classifier_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: "models/pediatric_logistic.json".into(),
            listen_addr: "0.0.0.0:8080".into(),
            classifier_timeout_ms: 2000,
        }
    }
}

impl EngineConfig {
    /// Load from file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RiskError::Config(format!("cannot read {path}: {e}")))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| RiskError::Config(format!("invalid config {path}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to file
    pub fn save(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RiskError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| RiskError::Config(format!("cannot write {path}: {e}")))
    }

    /// Apply environment overrides
    pub fn with_env(mut self) -> Self {
        if let Ok(path) = std::env::var(MODEL_PATH_ENV) {
            self.model_path = path;
        }
        self
    }

    /// Classifier timeout
    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.classifier_timeout_ms == 0 {
            return Err(RiskError::Config("classifier_timeout_ms must be positive".into()));
        }
        if self.model_path.is_empty() {
            return Err(RiskError::Config("model_path must be set".into()));
        }
        Ok(())
    }
}
