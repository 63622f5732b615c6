//! Risk Classifier Adapter

use crate::features::{EncodedFeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::{Result, RiskError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Binary classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Class 1
    AtRisk,
    /// Class 0
    NotAtRisk,
}

/// Externally supplied binary risk classifier.
///
/// Implementations are loaded once per process and shared across requests,
/// so they must be usable through `&self` from any thread.
pub trait RiskClassifier: Send + Sync {
    /// Predicted class for an encoded vector
    fn classify(&self, features: &EncodedFeatureVector) -> Result<RiskLabel>;

    /// Probability of the `AtRisk` class, in [0, 1]
    fn probability(&self, features: &EncodedFeatureVector) -> Result<f64>;
}

/// Serialized logistic-regression artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Input schema; must match the encoder exactly
    pub feature_names: Vec<String>,
    /// One weight per feature
    pub coefficients: Vec<f64>,
    /// Bias term
    pub intercept: f64,
    /// Standardization means (optional)
    #[serde(default)]
    pub means: Option<Vec<f64>>,
    /// Standardization scales (optional)
    #[serde(default)]
    pub scales: Option<Vec<f64>>,
    /// Decision threshold on the AtRisk probability
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

/// Logistic-regression risk model
#[derive(Debug, Clone)]
pub struct LogisticRiskModel {
    weights: Array1<f64>,
    intercept: f64,
    means: Array1<f64>,
    scales: Array1<f64>,
    threshold: f64,
}

impl LogisticRiskModel {
    /// Build from a parsed artifact, validating the schema
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        if artifact.feature_names.len() != FEATURE_COUNT
            || artifact.feature_names.iter().zip(FEATURE_NAMES).any(|(a, b)| a != b)
        {
            return Err(RiskError::ModelUnavailable(format!(
                "feature schema mismatch: expected {:?}, got {:?}",
                FEATURE_NAMES, artifact.feature_names
            )));
        }

        let weights = checked_array("coefficients", artifact.coefficients)?;
        let means = match artifact.means {
            Some(m) => checked_array("means", m)?,
            None => Array1::zeros(FEATURE_COUNT),
        };
        let scales = match artifact.scales {
            Some(s) => checked_array("scales", s)?,
            None => Array1::ones(FEATURE_COUNT),
        };
        if scales.iter().any(|s| *s == 0.0) {
            return Err(RiskError::ModelUnavailable("scales must be non-zero".into()));
        }
        if !artifact.intercept.is_finite() || !(0.0..1.0).contains(&artifact.threshold) {
            return Err(RiskError::ModelUnavailable("invalid intercept or threshold".into()));
        }

        Ok(Self {
            weights,
            intercept: artifact.intercept,
            means,
            scales,
            threshold: artifact.threshold,
        })
    }

    /// Parse an artifact from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_str(json)
            .map_err(|e| RiskError::ModelUnavailable(format!("malformed model artifact: {e}")))?;
        Self::from_artifact(artifact)
    }

    /// Load model from path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading risk model from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            RiskError::ModelUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let model = Self::from_json_str(&content)?;
        tracing::info!(threshold = model.threshold, "Risk model loaded");
        Ok(model)
    }

    fn logit(&self, features: &EncodedFeatureVector) -> f64 {
        let x = Array1::from(features.to_vector().to_vec());
        let standardized = (x - &self.means) / &self.scales;
        standardized.dot(&self.weights) + self.intercept
    }
}

impl RiskClassifier for LogisticRiskModel {
    fn classify(&self, features: &EncodedFeatureVector) -> Result<RiskLabel> {
        let p = self.probability(features)?;
        Ok(if p > self.threshold { RiskLabel::AtRisk } else { RiskLabel::NotAtRisk })
    }

    fn probability(&self, features: &EncodedFeatureVector) -> Result<f64> {
        let z = self.logit(features);
        if !z.is_finite() {
            return Err(RiskError::ModelUnavailable("non-finite model output".into()));
        }
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

/// Reject probabilities a well-formed classifier cannot produce
pub(crate) fn checked_probability(p: f64) -> Result<f64> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(RiskError::ModelUnavailable(format!("malformed probability {p}")))
    }
}

fn checked_array(name: &str, values: Vec<f64>) -> Result<Array1<f64>> {
    if values.len() != FEATURE_COUNT {
        return Err(RiskError::ModelUnavailable(format!(
            "{name} has {} entries, expected {FEATURE_COUNT}",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(RiskError::ModelUnavailable(format!("{name} contains non-finite values")));
    }
    Ok(Array1::from(values))
}
