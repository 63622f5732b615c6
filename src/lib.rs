//! Pediatric Diabetes Risk Engine
//!
//! Estimates a child's diabetes risk from routine measurements and explains
//! the result with the single abnormal factor whose normalization would most
//! reduce that risk.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         RISK ENGINE                                 │
//! │                                                                     │
//! │  PatientAttributes                                                  │
//! │         │                                                           │
//! │  ┌──────▼───────┐      ┌──────────────────┐                         │
//! │  │   Feature    │─────▶│ Risk Classifier  │  (shared, read-only)    │
//! │  │   Encoder    │      │ classify + proba │                         │
//! │  └──────┬───────┘      └────────▲─────────┘                         │
//! │         │                       │ ≤ 3 single-factor probes          │
//! │  ┌──────▼───────┐      ┌────────┴─────────┐                         │
//! │  │  Suggestion  │─────▶│  Counterfactual  │  (AtRisk only)          │
//! │  │    Rules     │      │    Explainer     │                         │
//! │  └──────────────┘      └──────────────────┘                         │
//! │                                 │                                   │
//! │                        AssessmentResult                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod features;
pub mod models;
pub mod suggestions;
pub mod counterfactual;
pub mod inference;
pub mod config;
pub mod api;

use thiserror::Error;

pub use features::*;
pub use models::{LogisticRiskModel, ModelArtifact, RiskClassifier, RiskLabel};
pub use suggestions::{Severity, Suggestion, SuggestionKind};
pub use counterfactual::{CounterfactualResult, FactorProbe};
pub use inference::{AssessmentResult, RiskAssessment, RiskBand, RiskEngine};
pub use config::EngineConfig;

/// Risk engine error types
#[derive(Debug, Error)]
pub enum RiskError {
    /// Input that cannot be encoded
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),
    /// Classifier missing, malformed or too slow
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    /// Service configuration problem
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, RiskError>;
