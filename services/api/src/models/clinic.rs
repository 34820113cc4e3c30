//! Clinic (tenant root) and membership models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Clinic entity, the tenant boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Clinic creation and rename payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClinic {
    pub name: String,
}

/// Join record granting a user access to a clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub clinic_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a freshly authenticated user should go next
#[derive(Debug, Clone, PartialEq)]
pub enum Landing {
    /// No membership yet: the user has to create a clinic first
    ClinicForm,
    Dashboard(Dashboard),
}

/// Dashboard payload for a user with at least one clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub email: String,
    pub clinics: Vec<Clinic>,
}
