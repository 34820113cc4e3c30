//! Patient model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Patient sex, stored as the `patient_sex` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "patient_sex", rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

/// Patient entity, owned by exactly one clinic.
///
/// The email is unique across every clinic, not only within its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Sex,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Patient creation and update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    pub sex: Sex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Sex::Female).unwrap(), "\"female\"");
        let parsed: Sex = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(parsed, Sex::Other);
        assert!(serde_json::from_str::<Sex>("\"unknown\"").is_err());
    }
}
