//! Account record types for the four RapidCare roles.
//!
//! The backing tables disagree on column names and carry different
//! profile fields, so records are normalized at the storage boundary
//! into one internal shape: [`UserAccount`] with a role-discriminated
//! [`Profile`]. Parse, don't trust: row contents are validated into
//! these types when they leave the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::role::UserRole;

/// The seeded administrator account.
///
/// Admins are created by the `seed_admin` utility, never through the
/// application itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAccount {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Role-specific profile fields, discriminated by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Doctor {
        clinic_address: String,
        specialization: String,
    },
    Hospital {
        address: String,
    },
    #[serde(rename = "user")]
    Patient {
        date_of_birth: NaiveDate,
        height_cm: f64,
        weight_kg: f64,
    },
}

impl Profile {
    /// The role this profile belongs to.
    #[must_use]
    pub fn role(&self) -> UserRole {
        match self {
            Self::Doctor { .. } => UserRole::Doctor,
            Self::Hospital { .. } => UserRole::Hospital,
            Self::Patient { .. } => UserRole::Patient,
        }
    }
}

/// A doctor, hospital, or patient account in normalized shape.
///
/// Whatever the underlying column is called (`mobile`, `mobile_number`,
/// `village`, `clinic_village`), in memory the fields have one name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// 10-character generated identifier, unique within the role table.
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Free-text location used as the knowledge-based recovery factor.
    pub village: String,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// The role of this account, derived from its profile variant.
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.profile.role()
    }
}

/// Input for creating a new account through the admin-facing form.
///
/// Carries the plaintext password; it is hashed before anything reaches
/// storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub password: String,
    pub village: String,
    pub profile: Profile,
}

impl NewUser {
    /// Validate the registration input.
    ///
    /// # Errors
    /// Returns all validation failures as a vector of messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        if self.mobile.trim().is_empty() {
            errors.push("Mobile number is required".to_string());
        } else if !self.mobile.chars().all(|c| c.is_ascii_digit()) {
            errors.push(format!(
                "Mobile number must be digits only, got {} characters",
                self.mobile.len()
            ));
        }
        if !self.email.contains('@') || self.email.trim().is_empty() {
            errors.push("A valid email address is required".to_string());
        }
        if self.password.len() < 8 {
            errors.push("Password must be at least 8 characters".to_string());
        }
        if self.village.trim().is_empty() {
            errors.push("Village is required for account recovery".to_string());
        }

        if let Profile::Patient {
            date_of_birth,
            height_cm,
            weight_kg,
        } = &self.profile
        {
            if *date_of_birth > Utc::now().date_naive() {
                errors.push(format!("Date of birth {date_of_birth} is in the future"));
            }
            if *height_cm <= 0.0 {
                errors.push(format!("Height {height_cm} must be positive"));
            }
            if *weight_kg <= 0.0 {
                errors.push(format!("Weight {weight_kg} must be positive"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_patient() -> NewUser {
        NewUser {
            name: "Asha Rao".to_string(),
            mobile: "9876543210".to_string(),
            email: "asha@example.org".to_string(),
            password: "long-enough-password".to_string(),
            village: "Kodagu".to_string(),
            profile: Profile::Patient {
                date_of_birth: NaiveDate::from_ymd_opt(1990, 3, 12).unwrap(),
                height_cm: 165.0,
                weight_kg: 68.0,
            },
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(valid_patient().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut bad = valid_patient();
        bad.mobile = "98-76".to_string();
        bad.password = "short".to_string();
        bad.village = " ".to_string();

        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_rejects_nonpositive_vitals() {
        let mut bad = valid_patient();
        bad.profile = Profile::Patient {
            date_of_birth: NaiveDate::from_ymd_opt(1990, 3, 12).unwrap(),
            height_cm: 0.0,
            weight_kg: -2.0,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_profile_role() {
        assert_eq!(valid_patient().profile.role(), UserRole::Patient);
        let doc = Profile::Doctor {
            clinic_address: "12 Main Rd".to_string(),
            specialization: "Cardiology".to_string(),
        };
        assert_eq!(doc.role(), UserRole::Doctor);
    }
}
