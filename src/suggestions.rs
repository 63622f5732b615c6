//! Health Suggestion Rules

use crate::features::{Factor, PatientAttributes};
use serde::{Deserialize, Serialize};

/// BMI above this is flagged (strict)
pub const BMI_THRESHOLD: f64 = 22.0;
/// Glucose (mg/dL) above this is flagged (strict)
pub const GLUCOSE_THRESHOLD: f64 = 110.0;
/// Insulin (μU/mL) above this is flagged (strict)
pub const INSULIN_THRESHOLD: f64 = 25.0;
/// Blood pressure (mmHg) above this is flagged (strict)
pub const BLOOD_PRESSURE_THRESHOLD: f64 = 120.0;

/// Suggestion severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Measurement out of range
    Warning,
    /// Background risk
    Info,
}

/// Rule that produced a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionKind {
    /// BMI above 22
    BmiHigh,
    /// Glucose above 110 mg/dL
    GlucoseElevated,
    /// Insulin above 25 μU/mL
    InsulinElevated,
    /// Blood pressure above 120 mmHg
    HighBloodPressure,
    /// Family history of diabetes
    FamilyHistory,
}

impl SuggestionKind {
    /// Severity of the rule
    pub fn severity(self) -> Severity {
        match self {
            SuggestionKind::FamilyHistory => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// Advisory text shown to staff
    pub fn message(self) -> &'static str {
        match self {
            SuggestionKind::BmiHigh => "BMI is high for age. Consider weight management.",
            SuggestionKind::GlucoseElevated => "Glucose is elevated. Consider dietary monitoring.",
            SuggestionKind::InsulinElevated => "Insulin is elevated. Consult a pediatrician.",
            SuggestionKind::HighBloodPressure => "High blood pressure. Needs monitoring.",
            SuggestionKind::FamilyHistory => "Family history increases risk. Take preventive measures.",
        }
    }

    /// Factor the explainer may probe for this rule, if any.
    ///
    /// Blood pressure and family history are advisory only.
    pub fn factor(self) -> Option<Factor> {
        match self {
            SuggestionKind::BmiHigh => Some(Factor::Bmi),
            SuggestionKind::GlucoseElevated => Some(Factor::Glucose),
            SuggestionKind::InsulinElevated => Some(Factor::Insulin),
            SuggestionKind::HighBloodPressure | SuggestionKind::FamilyHistory => None,
        }
    }
}

/// Health suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Rule that fired
    pub kind: SuggestionKind,
    /// Severity of the rule
    pub severity: Severity,
    /// Advisory text
    pub message: String,
}

impl From<SuggestionKind> for Suggestion {
    fn from(kind: SuggestionKind) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: kind.message().to_string(),
        }
    }
}

/// Evaluate the threshold rules, in table order
pub fn suggest(attributes: &PatientAttributes, bmi: f64) -> Vec<Suggestion> {
    let rules = [
        (bmi > BMI_THRESHOLD, SuggestionKind::BmiHigh),
        (attributes.glucose > GLUCOSE_THRESHOLD, SuggestionKind::GlucoseElevated),
        (attributes.insulin > INSULIN_THRESHOLD, SuggestionKind::InsulinElevated),
        (attributes.blood_pressure > BLOOD_PRESSURE_THRESHOLD, SuggestionKind::HighBloodPressure),
        (attributes.family_history, SuggestionKind::FamilyHistory),
    ];

    rules
        .into_iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, kind)| Suggestion::from(kind))
        .collect()
}

/// Factors eligible for counterfactual probing, in evaluation order
pub fn eligible_factors(suggestions: &[Suggestion]) -> Vec<Factor> {
    suggestions.iter().filter_map(|s| s.kind.factor()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::fixtures::*;

    fn kinds(s: &[Suggestion]) -> Vec<SuggestionKind> {
        s.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_example_order() {
        let attrs = at_risk_child();
        let s = suggest(&attrs, 24.31);
        assert_eq!(
            kinds(&s),
            vec![
                SuggestionKind::BmiHigh,
                SuggestionKind::GlucoseElevated,
                SuggestionKind::InsulinElevated,
                SuggestionKind::FamilyHistory,
            ]
        );
        assert_eq!(s[3].severity, Severity::Info);
        assert!(s[..3].iter().all(|s| s.severity == Severity::Warning));
    }

    #[test]
    fn test_bmi_threshold_is_strict() {
        let attrs = healthy_child();
        assert!(suggest(&attrs, 22.0).is_empty());
        assert_eq!(kinds(&suggest(&attrs, 22.01)), vec![SuggestionKind::BmiHigh]);
    }

    #[test]
    fn test_other_thresholds_are_strict() {
        let at = PatientAttributes {
            glucose: 110.0,
            insulin: 25.0,
            blood_pressure: 120.0,
            ..healthy_child()
        };
        assert!(suggest(&at, 18.0).is_empty());

        let above = PatientAttributes {
            glucose: 111.0,
            insulin: 26.0,
            blood_pressure: 121.0,
            ..healthy_child()
        };
        assert_eq!(
            kinds(&suggest(&above, 18.0)),
            vec![
                SuggestionKind::GlucoseElevated,
                SuggestionKind::InsulinElevated,
                SuggestionKind::HighBloodPressure,
            ]
        );
    }

    #[test]
    fn test_eligible_excludes_advisory_rules() {
        let attrs = PatientAttributes {
            blood_pressure: 150.0,
            family_history: true,
            ..healthy_child()
        };
        let s = suggest(&attrs, 18.0);
        assert_eq!(s.len(), 2);
        assert!(eligible_factors(&s).is_empty());

        let s = suggest(&at_risk_child(), 24.31);
        assert_eq!(eligible_factors(&s), Factor::ALL.to_vec());
    }
}
