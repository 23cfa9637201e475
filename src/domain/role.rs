//! Role definitions and the per-role storage schema map.
//!
//! The four RapidCare role tables grew independently and their column
//! names disagree: doctors store the phone number as `mobile` while
//! hospitals use `mobile_number`, and the recovery "village" field is
//! `clinic_village` for doctors but `village` elsewhere. Rather than
//! scattering those string literals through the storage code, each user
//! role carries a static [`RoleSchema`] with its column-name constants.

use serde::{Deserialize, Serialize};

/// Any authenticated principal: the seeded admin or one of the three
/// user roles stored in their own tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Hospital,
    /// Patients sign in as "user" in the application UI.
    #[serde(rename = "user")]
    Patient,
}

/// The three roles backed by generic account tables.
///
/// Admin is deliberately excluded: admins live in their own
/// `{username, password}` table, are seeded by an operator, and have no
/// self-service recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Doctor,
    Hospital,
    #[serde(rename = "user")]
    Patient,
}

/// Column-name constants for one role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSchema {
    /// Table holding this role's accounts.
    pub table: &'static str,
    /// Column holding the phone number (`mobile` vs `mobile_number`).
    pub mobile_column: &'static str,
    /// Column holding the knowledge-verification value
    /// (`village` vs `clinic_village`).
    pub village_column: &'static str,
}

const DOCTOR_SCHEMA: RoleSchema = RoleSchema {
    table: "doctors",
    mobile_column: "mobile",
    village_column: "clinic_village",
};

const HOSPITAL_SCHEMA: RoleSchema = RoleSchema {
    table: "hospitals",
    mobile_column: "mobile_number",
    village_column: "village",
};

const PATIENT_SCHEMA: RoleSchema = RoleSchema {
    table: "patients",
    mobile_column: "mobile",
    village_column: "village",
};

impl UserRole {
    /// Get the storage schema map for this role.
    #[must_use]
    pub fn schema(self) -> &'static RoleSchema {
        match self {
            Self::Doctor => &DOCTOR_SCHEMA,
            Self::Hospital => &HOSPITAL_SCHEMA,
            Self::Patient => &PATIENT_SCHEMA,
        }
    }

    /// Stable lowercase name used in session rows and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Hospital => "hospital",
            Self::Patient => "user",
        }
    }

    /// Parse from the stable lowercase name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "doctor" => Some(Self::Doctor),
            "hospital" => Some(Self::Hospital),
            // Accept both spellings: the UI says "user", the table says patient.
            "user" | "patient" => Some(Self::Patient),
            _ => None,
        }
    }
}

impl Role {
    /// Stable lowercase name used in session rows and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Hospital => "hospital",
            Self::Patient => "user",
        }
    }

    /// Parse from the stable lowercase name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            other => UserRole::parse(other).map(Self::from),
        }
    }

    /// The user role behind this principal, if it is not the admin.
    #[must_use]
    pub fn as_user_role(self) -> Option<UserRole> {
        match self {
            Self::Admin => None,
            Self::Doctor => Some(UserRole::Doctor),
            Self::Hospital => Some(UserRole::Hospital),
            Self::Patient => Some(UserRole::Patient),
        }
    }
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Doctor => Self::Doctor,
            UserRole::Hospital => Self::Hospital,
            UserRole::Patient => Self::Patient,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_column_names() {
        // The inherited inconsistency must survive exactly as-is.
        assert_eq!(UserRole::Doctor.schema().mobile_column, "mobile");
        assert_eq!(UserRole::Hospital.schema().mobile_column, "mobile_number");
        assert_eq!(UserRole::Patient.schema().mobile_column, "mobile");

        assert_eq!(UserRole::Doctor.schema().village_column, "clinic_village");
        assert_eq!(UserRole::Hospital.schema().village_column, "village");
        assert_eq!(UserRole::Patient.schema().village_column, "village");
    }

    #[test]
    fn test_role_name_roundtrip() {
        for role in [Role::Admin, Role::Doctor, Role::Hospital, Role::Patient] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("patient"), Some(Role::Patient));
        assert_eq!(Role::parse("nurse"), None);
    }

    #[test]
    fn test_admin_has_no_user_role() {
        assert!(Role::Admin.as_user_role().is_none());
        assert_eq!(Role::Doctor.as_user_role(), Some(UserRole::Doctor));
    }
}
