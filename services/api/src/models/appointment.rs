//! Appointment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Appointment binding one doctor and one patient of the same clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub clinic_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New appointment payload; the clinic comes from the request path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub date: DateTime<Utc>,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
}

/// Reschedule payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointment {
    pub date: DateTime<Utc>,
}

/// Query parameters for appointment listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentQuery {
    /// Only appointments with this doctor
    pub doctor_id: Option<Uuid>,
    /// Only appointments with this patient
    pub patient_id: Option<Uuid>,
}

impl AppointmentQuery {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.doctor_id.is_none_or(|id| id == appointment.doctor_id)
            && self.patient_id.is_none_or(|id| id == appointment.patient_id)
    }
}
