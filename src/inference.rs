//! Assessment Engine

use crate::counterfactual::{self, CounterfactualResult};
use crate::features::{EncodedFeatureVector, PatientAttributes};
use crate::models::{checked_probability, RiskClassifier, RiskLabel};
use crate::suggestions::{self, Suggestion};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Coarse risk category, using the gauge cut points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    /// Up to 30%
    Low,
    /// Above 30%, up to 60%
    Moderate,
    /// Above 60%
    High,
}

impl RiskBand {
    /// Band for an AtRisk probability
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.6 {
            RiskBand::High
        } else if probability > 0.3 {
            RiskBand::Moderate
        } else {
            RiskBand::Low
        }
    }
}

/// Classifier verdict for one patient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Predicted class
    pub label: RiskLabel,
    /// Probability of the AtRisk class
    pub probability: f64,
}

/// Full response for one patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Predicted class
    pub label: RiskLabel,
    /// Probability of the AtRisk class
    pub probability: f64,
    /// Risk category
    pub band: RiskBand,
    /// BMI as sent to the classifier
    pub bmi: f64,
    /// Triggered rules, in table order
    pub suggestions: Vec<Suggestion>,
    /// Present only for AtRisk patients with an out-of-range factor
    pub counterfactual: Option<CounterfactualResult>,
}

/// Runs assessments against a shared, read-only classifier
pub struct RiskEngine {
    classifier: Arc<dyn RiskClassifier>,
}

impl RiskEngine {
    /// Wrap a loaded classifier
    pub fn new(classifier: Arc<dyn RiskClassifier>) -> Self {
        Self { classifier }
    }

    /// Classify an encoded vector
    pub fn classify(&self, features: &EncodedFeatureVector) -> Result<RiskAssessment> {
        let label = self.classifier.classify(features)?;
        let probability = checked_probability(self.classifier.probability(features)?)?;
        Ok(RiskAssessment { label, probability })
    }

    /// Encode, classify, suggest and, for AtRisk patients, explain
    pub fn assess(&self, attributes: &PatientAttributes) -> Result<AssessmentResult> {
        let start = Instant::now();

        let features = EncodedFeatureVector::encode(attributes)?;
        let RiskAssessment { label, probability } = self.classify(&features)?;
        let suggestions = suggestions::suggest(attributes, features.bmi);

        let counterfactual = match label {
            RiskLabel::AtRisk => {
                let eligible = suggestions::eligible_factors(&suggestions);
                counterfactual::explain(self.classifier.as_ref(), &features, probability, &eligible)?
            }
            RiskLabel::NotAtRisk => None,
        };

        tracing::debug!(
            ?label,
            probability,
            suggestions = suggestions.len(),
            factor = ?counterfactual.map(|c| c.factor),
            elapsed_us = start.elapsed().as_micros() as u64,
            "assessment complete"
        );

        Ok(AssessmentResult {
            label,
            probability,
            band: RiskBand::from_probability(probability),
            bmi: features.bmi,
            suggestions,
            counterfactual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{fixtures::*, Factor};
    use crate::models::testing::{ScriptedClassifier, UnavailableClassifier, REFERENCE_ARTIFACT};
    use crate::models::LogisticRiskModel;
    use crate::suggestions::SuggestionKind;
    use crate::RiskError;

    fn scripted(score: impl Fn(&EncodedFeatureVector) -> f64 + Send + Sync + 'static) -> (Arc<ScriptedClassifier>, RiskEngine) {
        let clf = Arc::new(ScriptedClassifier::new(score));
        (clf.clone(), RiskEngine::new(clf))
    }

    #[test]
    fn test_end_to_end_example() {
        let (clf, engine) = scripted(|v| if v.insulin == 20.0 { 0.55 } else { 0.85 });
        let result = engine.assess(&at_risk_child()).unwrap();

        assert_eq!(result.label, RiskLabel::AtRisk);
        assert_eq!(result.bmi, 24.31);
        assert_eq!(result.band, RiskBand::High);
        assert_eq!(
            result.suggestions.iter().map(|s| s.kind).collect::<Vec<_>>(),
            vec![
                SuggestionKind::BmiHigh,
                SuggestionKind::GlucoseElevated,
                SuggestionKind::InsulinElevated,
                SuggestionKind::FamilyHistory,
            ]
        );

        let cf = result.counterfactual.unwrap();
        assert_eq!(cf.factor, Factor::Insulin);
        assert_eq!(cf.risk_reduction_pct(), 30.0);

        // base probability + one probe per eligible factor
        let probes = clf.probes();
        assert_eq!(probes.len(), 4);
        assert_eq!(probes[0].to_vector(), [10.0, 1.0, 24.31, 130.0, 30.0, 95.0, 0.0, 1.0]);
        assert_eq!(clf.classify_calls(), 1);
    }

    #[test]
    fn test_not_at_risk_skips_explainer() {
        let (clf, engine) = scripted(|_| 0.2);
        let result = engine.assess(&at_risk_child()).unwrap();
        assert_eq!(result.label, RiskLabel::NotAtRisk);
        assert_eq!(result.band, RiskBand::Low);
        assert!(result.counterfactual.is_none());
        assert_eq!(clf.probes().len(), 1);
    }

    #[test]
    fn test_at_risk_without_eligible_factors() {
        let (clf, engine) = scripted(|_| 0.9);
        let attrs = PatientAttributes {
            blood_pressure: 140.0,
            family_history: true,
            ..healthy_child()
        };
        let result = engine.assess(&attrs).unwrap();
        assert_eq!(result.label, RiskLabel::AtRisk);
        assert_eq!(result.suggestions.len(), 2);
        assert!(result.counterfactual.is_none());
        assert_eq!(clf.probes().len(), 1);
    }

    #[test]
    fn test_zero_height_aborts_before_classifier() {
        let (clf, engine) = scripted(|_| 0.9);
        let attrs = PatientAttributes { height: 0.0, ..at_risk_child() };
        assert!(matches!(engine.assess(&attrs), Err(RiskError::InvalidAttribute(_))));
        assert_eq!(clf.total_calls(), 0);
    }

    #[test]
    fn test_model_unavailable_is_fatal() {
        let engine = RiskEngine::new(Arc::new(UnavailableClassifier));
        assert!(matches!(
            engine.assess(&at_risk_child()),
            Err(RiskError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_malformed_probability_is_fatal() {
        let (_, engine) = scripted(|_| 1.5);
        assert!(matches!(
            engine.assess(&healthy_child()),
            Err(RiskError::ModelUnavailable(_))
        ));

        let (_, engine) = scripted(|v| if v.bmi == 20.0 { f64::NAN } else { 0.9 });
        assert!(matches!(
            engine.assess(&at_risk_child()),
            Err(RiskError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let model = LogisticRiskModel::from_json_str(REFERENCE_ARTIFACT).unwrap();
        let engine = RiskEngine::new(Arc::new(model));
        let a = engine.assess(&at_risk_child()).unwrap();
        let b = engine.assess(&at_risk_child()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.probability.to_bits(), b.probability.to_bits());
    }

    #[test]
    fn test_reference_model_explains_glucose() {
        let model = LogisticRiskModel::from_json_str(REFERENCE_ARTIFACT).unwrap();
        let engine = RiskEngine::new(Arc::new(model));
        let result = engine.assess(&at_risk_child()).unwrap();
        assert_eq!(result.label, RiskLabel::AtRisk);
        assert_eq!(result.counterfactual.unwrap().factor, Factor::Glucose);
    }

    #[test]
    fn test_risk_bands() {
        assert_eq!(RiskBand::from_probability(0.3), RiskBand::Low);
        assert_eq!(RiskBand::from_probability(0.31), RiskBand::Moderate);
        assert_eq!(RiskBand::from_probability(0.6), RiskBand::Moderate);
        assert_eq!(RiskBand::from_probability(0.61), RiskBand::High);
    }
}
