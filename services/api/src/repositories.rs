//! Repositories for database operations
//!
//! Each aggregate gets its own repository trait. Every clinic-scoped lookup
//! takes the clinic id alongside the entity id, so an entity belonging to a
//! different tenant is indistinguishable from a missing one. Two backends
//! implement all of them: [`postgres::PgStore`] and [`memory::MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentQuery, Clinic, Doctor, DoctorInput, Membership, NewAppointment,
    Patient, PatientInput,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Clinic repository
#[async_trait]
pub trait ClinicRepository: Send + Sync {
    /// Insert a clinic and the creator's membership as one atomic unit.
    ///
    /// The user row is upserted first so the membership can reference it.
    async fn create_clinic_with_member(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> DatabaseResult<(Clinic, Membership)>;

    async fn find_clinic(&self, clinic_id: Uuid) -> DatabaseResult<Option<Clinic>>;

    /// Clinics the user is a member of, oldest first
    async fn list_clinics_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Clinic>>;

    async fn rename_clinic(&self, clinic_id: Uuid, name: &str) -> DatabaseResult<Option<Clinic>>;

    /// Delete a clinic with its memberships, doctors, patients and appointments
    async fn delete_clinic(&self, clinic_id: Uuid) -> DatabaseResult<bool>;
}

/// Membership and user repository
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn find_membership(
        &self,
        user_id: Uuid,
        clinic_id: Uuid,
    ) -> DatabaseResult<Option<Membership>>;

    async fn list_memberships_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Membership>>;

    async fn list_member_ids(&self, clinic_id: Uuid) -> DatabaseResult<Vec<Uuid>>;

    /// Remove a user row; its memberships go with it
    async fn delete_user(&self, user_id: Uuid) -> DatabaseResult<bool>;
}

/// Doctor repository
#[async_trait]
pub trait DoctorRepository: Send + Sync {
    async fn create_doctor(&self, clinic_id: Uuid, input: &DoctorInput) -> DatabaseResult<Doctor>;

    async fn list_doctors(&self, clinic_id: Uuid) -> DatabaseResult<Vec<Doctor>>;

    async fn find_doctor(&self, clinic_id: Uuid, doctor_id: Uuid)
    -> DatabaseResult<Option<Doctor>>;

    async fn update_doctor(
        &self,
        clinic_id: Uuid,
        doctor_id: Uuid,
        input: &DoctorInput,
    ) -> DatabaseResult<Option<Doctor>>;

    /// Delete a doctor and the doctor's appointments
    async fn delete_doctor(&self, clinic_id: Uuid, doctor_id: Uuid) -> DatabaseResult<bool>;
}

/// Patient repository
#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn create_patient(&self, clinic_id: Uuid, input: &PatientInput)
    -> DatabaseResult<Patient>;

    async fn list_patients(&self, clinic_id: Uuid) -> DatabaseResult<Vec<Patient>>;

    async fn find_patient(
        &self,
        clinic_id: Uuid,
        patient_id: Uuid,
    ) -> DatabaseResult<Option<Patient>>;

    async fn update_patient(
        &self,
        clinic_id: Uuid,
        patient_id: Uuid,
        input: &PatientInput,
    ) -> DatabaseResult<Option<Patient>>;

    /// Delete a patient and the patient's appointments
    async fn delete_patient(&self, clinic_id: Uuid, patient_id: Uuid) -> DatabaseResult<bool>;
}

/// Appointment repository
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn create_appointment(
        &self,
        clinic_id: Uuid,
        input: &NewAppointment,
    ) -> DatabaseResult<Appointment>;

    /// Appointments of a clinic ordered by date
    async fn list_appointments(
        &self,
        clinic_id: Uuid,
        query: &AppointmentQuery,
    ) -> DatabaseResult<Vec<Appointment>>;

    async fn find_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
    ) -> DatabaseResult<Option<Appointment>>;

    async fn reschedule_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
        date: DateTime<Utc>,
    ) -> DatabaseResult<Option<Appointment>>;

    async fn delete_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
    ) -> DatabaseResult<bool>;
}

/// Complete storage backend
#[async_trait]
pub trait Store:
    ClinicRepository
    + MembershipRepository
    + DoctorRepository
    + PatientRepository
    + AppointmentRepository
{
    /// True when the backend can serve queries
    async fn health_check(&self) -> DatabaseResult<bool>;
}
