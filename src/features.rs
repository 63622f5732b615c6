//! Feature Encoding

use crate::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// Number of fields in the classifier input
pub const FEATURE_COUNT: usize = 8;

/// Classifier input schema, in order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Age",
    "Sex",
    "BMI",
    "Glucose",
    "Insulin",
    "BloodPressure",
    "PhysicalActivityLevel",
    "FamilyHistory",
];

/// Biological sex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    /// Encoded as 1
    Male,
    /// Encoded as 0
    Female,
}

impl Sex {
    /// Classifier encoding (Male = 1)
    pub fn code(self) -> f64 {
        match self {
            Sex::Male => 1.0,
            Sex::Female => 0.0,
        }
    }

    /// Decode a classifier value
    pub fn from_code(code: f64) -> Option<Self> {
        match code {
            c if c == 1.0 => Some(Sex::Male),
            c if c == 0.0 => Some(Sex::Female),
            _ => None,
        }
    }
}

/// Physical activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    /// Encoded as 0
    Sedentary,
    /// Encoded as 1
    Moderate,
    /// Encoded as 2
    Active,
}

impl ActivityLevel {
    /// Classifier encoding (0/1/2)
    pub fn code(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 0.0,
            ActivityLevel::Moderate => 1.0,
            ActivityLevel::Active => 2.0,
        }
    }

    /// Decode a classifier value
    pub fn from_code(code: f64) -> Option<Self> {
        if code.fract() != 0.0 {
            return None;
        }
        match code as i64 {
            0 => Some(ActivityLevel::Sedentary),
            1 => Some(ActivityLevel::Moderate),
            2 => Some(ActivityLevel::Active),
            _ => None,
        }
    }
}

/// Raw patient measurements as entered by clinical staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientAttributes {
    /// Age in whole years
    pub age: u8,
    /// Sex
    pub sex: Sex,
    /// Height (cm)
    pub height: f64,
    /// Weight (kg)
    pub weight: f64,
    /// Glucose (mg/dL)
    pub glucose: f64,
    /// Insulin (μU/mL)
    pub insulin: f64,
    /// Blood pressure (mmHg)
    pub blood_pressure: f64,
    /// Activity level
    pub activity_level: ActivityLevel,
    /// Family history of diabetes
    pub family_history: bool,
}

impl PatientAttributes {
    /// Body mass index rounded to 2 decimals
    pub fn bmi(&self) -> Result<f64> {
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(RiskError::InvalidAttribute(format!(
                "height must be positive, got {}",
                self.height
            )));
        }
        let meters = self.height / 100.0;
        Ok(round_to(self.weight / (meters * meters), 2))
    }

    /// Intake ranges enforced by the entry form.
    ///
    /// The engine itself only rejects values it cannot encode; this check is
    /// for callers standing in for the form (the HTTP service).
    pub fn check_intake(&self) -> Result<()> {
        check_range("age", self.age as f64, 5.0, 18.0)?;
        check_range("height", self.height, 30.0, 200.0)?;
        check_range("weight", self.weight, 5.0, 150.0)?;
        check_range("blood_pressure", self.blood_pressure, 50.0, 200.0)?;
        check_range("glucose", self.glucose, 0.0, f64::MAX)?;
        check_range("insulin", self.insulin, 0.0, f64::MAX)?;
        Ok(())
    }

    fn check_encodable(&self) -> Result<()> {
        let numeric = [
            ("weight", self.weight),
            ("glucose", self.glucose),
            ("insulin", self.insulin),
            ("blood_pressure", self.blood_pressure),
        ];
        for (name, value) in numeric {
            if !value.is_finite() {
                return Err(RiskError::InvalidAttribute(format!("{name} is not a finite number")));
            }
        }
        for (name, value) in [("weight", self.weight), ("glucose", self.glucose), ("insulin", self.insulin)] {
            if value < 0.0 {
                return Err(RiskError::InvalidAttribute(format!("{name} must not be negative, got {value}")));
            }
        }
        Ok(())
    }
}

/// Factors the explainer may perturb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    /// Body mass index
    #[serde(rename = "BMI")]
    Bmi,
    /// Glucose (mg/dL)
    Glucose,
    /// Insulin (μU/mL)
    Insulin,
}

impl Factor {
    /// Evaluation order; also the tie-break order
    pub const ALL: [Factor; 3] = [Factor::Bmi, Factor::Glucose, Factor::Insulin];

    /// Healthy value substituted during probing
    pub fn reference_value(self) -> f64 {
        match self {
            Factor::Bmi => 20.0,
            Factor::Glucose => 100.0,
            Factor::Insulin => 20.0,
        }
    }

    /// Display name, matching the feature schema
    pub fn name(self) -> &'static str {
        match self {
            Factor::Bmi => "BMI",
            Factor::Glucose => "Glucose",
            Factor::Insulin => "Insulin",
        }
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classifier input vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeatureVector {
    /// Age (years)
    pub age: f64,
    /// Sex code
    pub sex: f64,
    /// BMI, 2 decimals
    pub bmi: f64,
    /// Glucose (mg/dL)
    pub glucose: f64,
    /// Insulin (μU/mL)
    pub insulin: f64,
    /// Blood pressure (mmHg)
    pub blood_pressure: f64,
    /// Activity code
    pub activity_level: f64,
    /// Family history flag
    pub family_history: f64,
}

impl EncodedFeatureVector {
    /// Encode raw attributes
    pub fn encode(attributes: &PatientAttributes) -> Result<Self> {
        let bmi = attributes.bmi()?;
        attributes.check_encodable()?;

        Ok(Self {
            age: attributes.age as f64,
            sex: attributes.sex.code(),
            bmi,
            glucose: attributes.glucose,
            insulin: attributes.insulin,
            blood_pressure: attributes.blood_pressure,
            activity_level: attributes.activity_level.code(),
            family_history: if attributes.family_history { 1.0 } else { 0.0 },
        })
    }

    /// Convert to feature vector, in `FEATURE_NAMES` order
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.sex,
            self.bmi,
            self.glucose,
            self.insulin,
            self.blood_pressure,
            self.activity_level,
            self.family_history,
        ]
    }

    /// Value of a probe-able factor
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Bmi => self.bmi,
            Factor::Glucose => self.glucose,
            Factor::Insulin => self.insulin,
        }
    }

    /// Copy with one factor replaced
    pub fn with_factor(&self, factor: Factor, value: f64) -> Self {
        let mut probe = *self;
        match factor {
            Factor::Bmi => probe.bmi = value,
            Factor::Glucose => probe.glucose = value,
            Factor::Insulin => probe.insulin = value,
        }
        probe
    }

    /// Decoded sex field
    pub fn decoded_sex(&self) -> Option<Sex> {
        Sex::from_code(self.sex)
    }

    /// Decoded activity field
    pub fn decoded_activity(&self) -> Option<ActivityLevel> {
        ActivityLevel::from_code(self.activity_level)
    }

    /// Decoded family history field
    pub fn decoded_family_history(&self) -> Option<bool> {
        match self.family_history {
            v if v == 1.0 => Some(true),
            v if v == 0.0 => Some(false),
            _ => None,
        }
    }
}

/// Encode raw attributes
pub fn encode(attributes: &PatientAttributes) -> Result<EncodedFeatureVector> {
    EncodedFeatureVector::encode(attributes)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    // half-to-even on exact ties
    (value * scale).round_ties_even() / scale
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(RiskError::InvalidAttribute(format!(
            "{name} {value} outside accepted range {min}..={max}"
        )));
    }
    Ok(())
}
