//! Derived health metrics: age, BMI, and obesity classification.
//!
//! Pure functions, no I/O. Derived values are never persisted; every
//! screen recomputes them from the stored raw inputs, so a stored value
//! can never drift from a fresh computation.
//!
//! The obesity thresholds are the canonical rule used everywhere in
//! this crate: BMI below 18.5 is Low, below 25 is Correct, and 25 or
//! above is High (the boundary itself classifies as High).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Obesity classification from BMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObesityLevel {
    /// BMI below 18.5
    Low,
    /// BMI in [18.5, 25)
    Correct,
    /// BMI of 25 or above
    High,
}

impl ObesityLevel {
    /// Classify a BMI value.
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Low
        } else if bmi < 25.0 {
            Self::Correct
        } else {
            Self::High
        }
    }
}

impl std::fmt::Display for ObesityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Correct => write!(f, "Correct"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Completed age in years on `today`, calendar-aware.
///
/// One year is subtracted while today's month/day precedes the birth
/// month/day, so the birthday itself counts as the new age.
#[must_use]
pub fn age_years(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Body mass index: `kg / m^2`, rounded to one decimal place.
///
/// Returns 0.0 if either input is non-positive.
#[must_use]
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    if height_cm <= 0.0 || weight_kg <= 0.0 {
        return 0.0;
    }
    let meters = height_cm / 100.0;
    let raw = weight_kg / (meters * meters);
    (raw * 10.0).round() / 10.0
}

/// Age, BMI, and obesity level derived from a patient's raw inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub age_years: i32,
    pub bmi: f64,
    pub obesity_level: ObesityLevel,
}

impl HealthSummary {
    /// Compute the summary for the given vitals as of `today`.
    #[must_use]
    pub fn compute(date_of_birth: NaiveDate, height_cm: f64, weight_kg: f64, today: NaiveDate) -> Self {
        let bmi = bmi(height_cm, weight_kg);
        Self {
            age_years: age_years(date_of_birth, today),
            bmi,
            obesity_level: ObesityLevel::from_bmi(bmi),
        }
    }
}
