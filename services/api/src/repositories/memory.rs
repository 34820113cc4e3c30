//! In-memory store
//!
//! Mirrors the relational rules of the PostgreSQL schema: foreign keys must
//! point at existing rows, `(user_id, clinic_id)` and patient emails are
//! unique, and deletes cascade. Every operation runs under a single lock so
//! multi-step writes are atomic. Used by tests and local runs without a
//! database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    AppointmentRepository, ClinicRepository, DoctorRepository, MembershipRepository,
    PatientRepository, Store,
};
use crate::models::{
    Appointment, AppointmentQuery, Clinic, Doctor, DoctorInput, Membership, NewAppointment,
    Patient, PatientInput,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashSet<Uuid>,
    clinics: HashMap<Uuid, Clinic>,
    memberships: HashMap<Uuid, Membership>,
    doctors: HashMap<Uuid, Doctor>,
    patients: HashMap<Uuid, Patient>,
    appointments: HashMap<Uuid, Appointment>,
}

fn foreign_key(constraint: &str) -> DatabaseError {
    DatabaseError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

fn unique(constraint: &str) -> DatabaseError {
    DatabaseError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

impl Tables {
    fn require_clinic(&self, clinic_id: Uuid, constraint: &str) -> DatabaseResult<()> {
        if self.clinics.contains_key(&clinic_id) {
            Ok(())
        } else {
            Err(foreign_key(constraint))
        }
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.patients
            .values()
            .any(|p| p.email == email && Some(p.id) != except)
    }

    fn remove_clinic_cascade(&mut self, clinic_id: Uuid) -> bool {
        if self.clinics.remove(&clinic_id).is_none() {
            return false;
        }
        self.memberships.retain(|_, m| m.clinic_id != clinic_id);
        self.doctors.retain(|_, d| d.clinic_id != clinic_id);
        self.patients.retain(|_, p| p.clinic_id != clinic_id);
        self.appointments.retain(|_, a| a.clinic_id != clinic_id);
        true
    }
}

/// Store keeping every table in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows referencing `clinic_id` across every dependent table
    pub async fn dependent_row_count(&self, clinic_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables
            .memberships
            .values()
            .filter(|m| m.clinic_id == clinic_id)
            .count()
            + tables
                .doctors
                .values()
                .filter(|d| d.clinic_id == clinic_id)
                .count()
            + tables
                .patients
                .values()
                .filter(|p| p.clinic_id == clinic_id)
                .count()
            + tables
                .appointments
                .values()
                .filter(|a| a.clinic_id == clinic_id)
                .count()
    }

    /// Total number of clinics and memberships
    pub async fn clinic_and_membership_count(&self) -> (usize, usize) {
        let tables = self.tables.read().await;
        (tables.clinics.len(), tables.memberships.len())
    }
}

#[async_trait]
impl ClinicRepository for MemoryStore {
    async fn create_clinic_with_member(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> DatabaseResult<(Clinic, Membership)> {
        info!("Creating clinic for user: {}", user_id);

        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let clinic = Clinic {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        let membership = Membership {
            id: Uuid::new_v4(),
            user_id,
            clinic_id: clinic.id,
            created_at: now,
            updated_at: now,
        };

        tables.users.insert(user_id);
        tables.clinics.insert(clinic.id, clinic.clone());
        tables.memberships.insert(membership.id, membership.clone());

        Ok((clinic, membership))
    }

    async fn find_clinic(&self, clinic_id: Uuid) -> DatabaseResult<Option<Clinic>> {
        Ok(self.tables.read().await.clinics.get(&clinic_id).cloned())
    }

    async fn list_clinics_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Clinic>> {
        let tables = self.tables.read().await;
        let mut clinics: Vec<Clinic> = tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.clinics.get(&m.clinic_id).cloned())
            .collect();
        clinics.sort_by(|a, b| (a.created_at, &a.name).cmp(&(b.created_at, &b.name)));
        Ok(clinics)
    }

    async fn rename_clinic(&self, clinic_id: Uuid, name: &str) -> DatabaseResult<Option<Clinic>> {
        info!("Renaming clinic: {}", clinic_id);

        let mut tables = self.tables.write().await;
        Ok(tables.clinics.get_mut(&clinic_id).map(|clinic| {
            clinic.name = name.to_string();
            clinic.updated_at = Utc::now();
            clinic.clone()
        }))
    }

    async fn delete_clinic(&self, clinic_id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting clinic: {}", clinic_id);
        Ok(self.tables.write().await.remove_clinic_cascade(clinic_id))
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn find_membership(
        &self,
        user_id: Uuid,
        clinic_id: Uuid,
    ) -> DatabaseResult<Option<Membership>> {
        Ok(self
            .tables
            .read()
            .await
            .memberships
            .values()
            .find(|m| m.user_id == user_id && m.clinic_id == clinic_id)
            .cloned())
    }

    async fn list_memberships_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Membership>> {
        let tables = self.tables.read().await;
        let mut memberships: Vec<Membership> = tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        memberships.sort_by_key(|m| m.created_at);
        Ok(memberships)
    }

    async fn list_member_ids(&self, clinic_id: Uuid) -> DatabaseResult<Vec<Uuid>> {
        Ok(self
            .tables
            .read()
            .await
            .memberships
            .values()
            .filter(|m| m.clinic_id == clinic_id)
            .map(|m| m.user_id)
            .collect())
    }

    async fn delete_user(&self, user_id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting user: {}", user_id);

        let mut tables = self.tables.write().await;
        if !tables.users.remove(&user_id) {
            return Ok(false);
        }
        tables.memberships.retain(|_, m| m.user_id != user_id);
        Ok(true)
    }
}

#[async_trait]
impl DoctorRepository for MemoryStore {
    async fn create_doctor(&self, clinic_id: Uuid, input: &DoctorInput) -> DatabaseResult<Doctor> {
        info!("Creating doctor in clinic: {}", clinic_id);

        let mut tables = self.tables.write().await;
        tables.require_clinic(clinic_id, "doctors_clinic_id_fkey")?;

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            clinic_id,
            name: input.name.clone(),
            avatar_image_url: input.avatar_image_url.clone(),
            available_from_weekday: input.available_from_weekday,
            available_to_weekday: input.available_to_weekday,
            available_from_time: input.available_from_time,
            available_to_time: input.available_to_time,
            license_id: input.license_id.clone(),
            specialty: input.specialty.clone(),
            price_in_cents: input.price_in_cents,
            created_at: now,
            updated_at: now,
        };
        tables.doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    async fn list_doctors(&self, clinic_id: Uuid) -> DatabaseResult<Vec<Doctor>> {
        let tables = self.tables.read().await;
        let mut doctors: Vec<Doctor> = tables
            .doctors
            .values()
            .filter(|d| d.clinic_id == clinic_id)
            .cloned()
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn find_doctor(
        &self,
        clinic_id: Uuid,
        doctor_id: Uuid,
    ) -> DatabaseResult<Option<Doctor>> {
        Ok(self
            .tables
            .read()
            .await
            .doctors
            .get(&doctor_id)
            .filter(|d| d.clinic_id == clinic_id)
            .cloned())
    }

    async fn update_doctor(
        &self,
        clinic_id: Uuid,
        doctor_id: Uuid,
        input: &DoctorInput,
    ) -> DatabaseResult<Option<Doctor>> {
        info!("Updating doctor: {}", doctor_id);

        let mut tables = self.tables.write().await;
        let Some(doctor) = tables
            .doctors
            .get_mut(&doctor_id)
            .filter(|d| d.clinic_id == clinic_id)
        else {
            return Ok(None);
        };

        doctor.name = input.name.clone();
        doctor.avatar_image_url = input.avatar_image_url.clone();
        doctor.available_from_weekday = input.available_from_weekday;
        doctor.available_to_weekday = input.available_to_weekday;
        doctor.available_from_time = input.available_from_time;
        doctor.available_to_time = input.available_to_time;
        doctor.license_id = input.license_id.clone();
        doctor.specialty = input.specialty.clone();
        doctor.price_in_cents = input.price_in_cents;
        doctor.updated_at = Utc::now();

        Ok(Some(doctor.clone()))
    }

    async fn delete_doctor(&self, clinic_id: Uuid, doctor_id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting doctor: {}", doctor_id);

        let mut tables = self.tables.write().await;
        let owned = tables
            .doctors
            .get(&doctor_id)
            .is_some_and(|d| d.clinic_id == clinic_id);
        if !owned {
            return Ok(false);
        }

        tables.doctors.remove(&doctor_id);
        tables.appointments.retain(|_, a| a.doctor_id != doctor_id);
        Ok(true)
    }
}

#[async_trait]
impl PatientRepository for MemoryStore {
    async fn create_patient(
        &self,
        clinic_id: Uuid,
        input: &PatientInput,
    ) -> DatabaseResult<Patient> {
        info!("Creating patient in clinic: {}", clinic_id);

        let mut tables = self.tables.write().await;
        tables.require_clinic(clinic_id, "patients_clinic_id_fkey")?;
        if tables.email_taken(&input.email, None) {
            return Err(unique("patients_email_key"));
        }

        let now = Utc::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            clinic_id,
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            birth_date: input.birth_date,
            sex: input.sex,
            created_at: now,
            updated_at: now,
        };
        tables.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn list_patients(&self, clinic_id: Uuid) -> DatabaseResult<Vec<Patient>> {
        let tables = self.tables.read().await;
        let mut patients: Vec<Patient> = tables
            .patients
            .values()
            .filter(|p| p.clinic_id == clinic_id)
            .cloned()
            .collect();
        patients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(patients)
    }

    async fn find_patient(
        &self,
        clinic_id: Uuid,
        patient_id: Uuid,
    ) -> DatabaseResult<Option<Patient>> {
        Ok(self
            .tables
            .read()
            .await
            .patients
            .get(&patient_id)
            .filter(|p| p.clinic_id == clinic_id)
            .cloned())
    }

    async fn update_patient(
        &self,
        clinic_id: Uuid,
        patient_id: Uuid,
        input: &PatientInput,
    ) -> DatabaseResult<Option<Patient>> {
        info!("Updating patient: {}", patient_id);

        let mut tables = self.tables.write().await;
        let owned = tables
            .patients
            .get(&patient_id)
            .is_some_and(|p| p.clinic_id == clinic_id);
        if !owned {
            return Ok(None);
        }
        if tables.email_taken(&input.email, Some(patient_id)) {
            return Err(unique("patients_email_key"));
        }

        let Some(patient) = tables.patients.get_mut(&patient_id) else {
            return Ok(None);
        };
        patient.name = input.name.clone();
        patient.email = input.email.clone();
        patient.phone = input.phone.clone();
        patient.birth_date = input.birth_date;
        patient.sex = input.sex;
        patient.updated_at = Utc::now();

        Ok(Some(patient.clone()))
    }

    async fn delete_patient(&self, clinic_id: Uuid, patient_id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting patient: {}", patient_id);

        let mut tables = self.tables.write().await;
        let owned = tables
            .patients
            .get(&patient_id)
            .is_some_and(|p| p.clinic_id == clinic_id);
        if !owned {
            return Ok(false);
        }

        tables.patients.remove(&patient_id);
        tables.appointments.retain(|_, a| a.patient_id != patient_id);
        Ok(true)
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn create_appointment(
        &self,
        clinic_id: Uuid,
        input: &NewAppointment,
    ) -> DatabaseResult<Appointment> {
        info!("Creating appointment in clinic: {}", clinic_id);

        let mut tables = self.tables.write().await;
        tables.require_clinic(clinic_id, "appointments_clinic_id_fkey")?;
        if !tables.patients.contains_key(&input.patient_id) {
            return Err(foreign_key("appointments_patient_id_fkey"));
        }
        if !tables.doctors.contains_key(&input.doctor_id) {
            return Err(foreign_key("appointments_doctor_id_fkey"));
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            date: input.date,
            clinic_id,
            patient_id: input.patient_id,
            doctor_id: input.doctor_id,
            created_at: now,
            updated_at: now,
        };
        tables
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn list_appointments(
        &self,
        clinic_id: Uuid,
        query: &AppointmentQuery,
    ) -> DatabaseResult<Vec<Appointment>> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.clinic_id == clinic_id && query.matches(a))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.date);
        Ok(appointments)
    }

    async fn find_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
    ) -> DatabaseResult<Option<Appointment>> {
        Ok(self
            .tables
            .read()
            .await
            .appointments
            .get(&appointment_id)
            .filter(|a| a.clinic_id == clinic_id)
            .cloned())
    }

    async fn reschedule_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
        date: DateTime<Utc>,
    ) -> DatabaseResult<Option<Appointment>> {
        info!("Rescheduling appointment: {}", appointment_id);

        let mut tables = self.tables.write().await;
        Ok(tables
            .appointments
            .get_mut(&appointment_id)
            .filter(|a| a.clinic_id == clinic_id)
            .map(|appointment| {
                appointment.date = date;
                appointment.updated_at = Utc::now();
                appointment.clone()
            }))
    }

    async fn delete_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
    ) -> DatabaseResult<bool> {
        info!("Deleting appointment: {}", appointment_id);

        let mut tables = self.tables.write().await;
        let owned = tables
            .appointments
            .get(&appointment_id)
            .is_some_and(|a| a.clinic_id == clinic_id);
        if owned {
            tables.appointments.remove(&appointment_id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}
