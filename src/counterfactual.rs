//! Single-Factor Counterfactual Explanations
//!
//! Each eligible factor is reset to its reference healthy value in a fresh
//! copy of the encoded vector, the classifier is re-queried, and the factor
//! with the largest drop in AtRisk probability is reported. Probes never
//! combine factors and never touch the caller's vector.

use crate::features::{round_to, EncodedFeatureVector, Factor};
use crate::models::{checked_probability, RiskClassifier};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Outcome of one probe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorProbe {
    /// Factor reset to its reference value
    pub factor: Factor,
    /// Value substituted into the probe
    pub reference_value: f64,
    /// AtRisk probability of the probe
    pub probability: f64,
    /// Base probability minus probe probability
    pub risk_delta: f64,
}

/// Most impactful single-factor intervention
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualResult {
    /// Factor to normalize
    pub factor: Factor,
    /// Base probability minus probe probability (positive = risk reduction)
    pub risk_delta: f64,
}

impl CounterfactualResult {
    /// Risk reduction in percentage points, 1 decimal
    pub fn risk_reduction_pct(&self) -> f64 {
        round_to(self.risk_delta * 100.0, 1)
    }

    /// One-line recommendation
    pub fn summary(&self) -> String {
        format!(
            "If {} was regulated to healthy levels, the risk would drop by {:.1}%.",
            self.factor,
            self.risk_delta * 100.0
        )
    }
}

/// Probe every eligible factor independently, in the order given
pub fn probe_factors(
    classifier: &dyn RiskClassifier,
    original: &EncodedFeatureVector,
    base_probability: f64,
    eligible: &[Factor],
) -> Result<Vec<FactorProbe>> {
    eligible
        .iter()
        .map(|&factor| -> Result<FactorProbe> {
            let reference_value = factor.reference_value();
            let probe = original.with_factor(factor, reference_value);
            let probability = checked_probability(classifier.probability(&probe)?)?;
            let risk_delta = base_probability - probability;
            tracing::debug!(
                %factor,
                from = original.get(factor),
                to = reference_value,
                probability,
                risk_delta,
                "counterfactual probe"
            );
            Ok(FactorProbe {
                factor,
                reference_value,
                probability,
                risk_delta,
            })
        })
        .collect()
}

/// Pick the probe with the largest delta; the earliest wins ties
pub fn select_best(probes: &[FactorProbe]) -> Option<CounterfactualResult> {
    probes
        .iter()
        .fold(None::<&FactorProbe>, |best, probe| match best {
            Some(b) if probe.risk_delta <= b.risk_delta => Some(b),
            _ => Some(probe),
        })
        .map(|p| CounterfactualResult {
            factor: p.factor,
            risk_delta: p.risk_delta,
        })
}

/// Find the single factor whose normalization most reduces risk.
///
/// Eligible factors are probed in the fixed `Factor::ALL` order regardless of
/// the order supplied, so tie-breaking is reproducible.
pub fn explain(
    classifier: &dyn RiskClassifier,
    original: &EncodedFeatureVector,
    base_probability: f64,
    eligible: &[Factor],
) -> Result<Option<CounterfactualResult>> {
    let ordered: Vec<Factor> = Factor::ALL
        .into_iter()
        .filter(|f| eligible.contains(f))
        .collect();
    if ordered.is_empty() {
        return Ok(None);
    }

    let probes = probe_factors(classifier, original, base_probability, &ordered)?;
    Ok(select_best(&probes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{encode, fixtures::*};
    use crate::models::testing::{ScriptedClassifier, UnavailableClassifier};
    use crate::RiskError;

    fn example() -> EncodedFeatureVector {
        encode(&at_risk_child()).unwrap()
    }

    #[test]
    fn test_no_eligible_factors() {
        let clf = ScriptedClassifier::new(|_| 0.9);
        let result = explain(&clf, &example(), 0.9, &[]).unwrap();
        assert!(result.is_none());
        assert_eq!(clf.total_calls(), 0);
    }

    #[test]
    fn test_picks_largest_drop() {
        // glucose normalization matters most
        let clf = ScriptedClassifier::new(|v| {
            if v.glucose == 100.0 {
                0.4
            } else if v.bmi == 20.0 {
                0.7
            } else {
                0.9
            }
        });
        let result = explain(&clf, &example(), 0.9, &Factor::ALL).unwrap().unwrap();
        assert_eq!(result.factor, Factor::Glucose);
        assert!((result.risk_delta - 0.5).abs() < 1e-12);
        assert_eq!(clf.probes().len(), 3);
    }

    #[test]
    fn test_probes_are_single_factor() {
        let clf = ScriptedClassifier::new(|_| 0.5);
        let original = example();
        explain(&clf, &original, 0.9, &Factor::ALL).unwrap();

        let probes = clf.probes();
        assert_eq!(probes[0], original.with_factor(Factor::Bmi, 20.0));
        assert_eq!(probes[0].glucose, 130.0);
        assert_eq!(probes[0].insulin, 30.0);
        assert_eq!(probes[1], original.with_factor(Factor::Glucose, 100.0));
        assert_eq!(probes[1].bmi, 24.31);
        assert_eq!(probes[2], original.with_factor(Factor::Insulin, 20.0));
        assert_eq!(original, example());
    }

    #[test]
    fn test_tie_goes_to_earlier_factor() {
        let clf = ScriptedClassifier::new(|v| if v.insulin == 20.0 || v.glucose == 100.0 { 0.6 } else { 0.8 });
        let result = explain(&clf, &example(), 0.9, &[Factor::Insulin, Factor::Glucose])
            .unwrap()
            .unwrap();
        assert_eq!(result.factor, Factor::Glucose);

        let flat = ScriptedClassifier::new(|_| 0.7);
        let result = explain(&flat, &example(), 0.9, &Factor::ALL).unwrap().unwrap();
        assert_eq!(result.factor, Factor::Bmi);
    }

    #[test]
    fn test_negative_delta_still_reported() {
        let clf = ScriptedClassifier::new(|_| 0.95);
        let result = explain(&clf, &example(), 0.9, &[Factor::Insulin]).unwrap().unwrap();
        assert_eq!(result.factor, Factor::Insulin);
        assert!(result.risk_delta < 0.0);
    }

    #[test]
    fn test_classifier_failure_propagates() {
        let err = explain(&UnavailableClassifier, &example(), 0.9, &[Factor::Bmi]).unwrap_err();
        assert!(matches!(err, RiskError::ModelUnavailable(_)));
    }

    #[test]
    fn test_display_rounding() {
        let result = CounterfactualResult { factor: Factor::Bmi, risk_delta: 0.12345 };
        assert_eq!(result.risk_reduction_pct(), 12.3);
        assert_eq!(
            result.summary(),
            "If BMI was regulated to healthy levels, the risk would drop by 12.3%."
        );
    }

    #[test]
    fn test_display_ties_round_to_even() {
        let result = CounterfactualResult { factor: Factor::Glucose, risk_delta: 0.0625 };
        assert_eq!(result.risk_reduction_pct(), 6.2);
        assert_eq!(
            result.summary(),
            "If Glucose was regulated to healthy levels, the risk would drop by 6.2%."
        );
    }
}
