//! PostgreSQL store
//!
//! Cascades and uniqueness are enforced by the schema in
//! `libs/common/migrations`; this module only maps rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
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

const CLINIC_COLUMNS: &str = "id, name, created_at, updated_at";
const MEMBERSHIP_COLUMNS: &str = "id, user_id, clinic_id, created_at, updated_at";
const DOCTOR_COLUMNS: &str = "id, clinic_id, name, avatar_image_url, available_from_weekday, \
     available_to_weekday, available_from_time, available_to_time, license_id, specialty, \
     price_in_cents, created_at, updated_at";
const PATIENT_COLUMNS: &str =
    "id, clinic_id, name, email, phone, birth_date, sex, created_at, updated_at";
const APPOINTMENT_COLUMNS: &str =
    "id, date, clinic_id, patient_id, doctor_id, created_at, updated_at";

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an already migrated pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClinicRepository for PgStore {
    async fn create_clinic_with_member(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> DatabaseResult<(Clinic, Membership)> {
        info!("Creating clinic for user: {}", user_id);

        // Dropping the transaction without commit rolls every write back
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;

        sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_query)?;

        let sql = format!(
            "INSERT INTO clinics (name) VALUES ($1) RETURNING {}",
            CLINIC_COLUMNS
        );
        let clinic = sqlx::query_as::<_, Clinic>(&sql)
            .bind(name)
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseError::from_query)?;

        let sql = format!(
            "INSERT INTO user_clinic_memberships (user_id, clinic_id) VALUES ($1, $2) RETURNING {}",
            MEMBERSHIP_COLUMNS
        );
        let membership = sqlx::query_as::<_, Membership>(&sql)
            .bind(user_id)
            .bind(clinic.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseError::from_query)?;

        tx.commit().await.map_err(DatabaseError::from_query)?;

        info!("Clinic {} created with owner {}", clinic.id, user_id);
        Ok((clinic, membership))
    }

    async fn find_clinic(&self, clinic_id: Uuid) -> DatabaseResult<Option<Clinic>> {
        let sql = format!("SELECT {} FROM clinics WHERE id = $1", CLINIC_COLUMNS);
        sqlx::query_as::<_, Clinic>(&sql)
            .bind(clinic_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list_clinics_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Clinic>> {
        sqlx::query_as::<_, Clinic>(
            r#"
            SELECT c.id, c.name, c.created_at, c.updated_at
            FROM clinics c
            JOIN user_clinic_memberships m ON m.clinic_id = c.id
            WHERE m.user_id = $1
            ORDER BY c.created_at, c.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn rename_clinic(&self, clinic_id: Uuid, name: &str) -> DatabaseResult<Option<Clinic>> {
        info!("Renaming clinic: {}", clinic_id);

        let sql = format!(
            "UPDATE clinics SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            CLINIC_COLUMNS
        );
        sqlx::query_as::<_, Clinic>(&sql)
            .bind(name)
            .bind(clinic_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn delete_clinic(&self, clinic_id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting clinic: {}", clinic_id);

        let result = sqlx::query("DELETE FROM clinics WHERE id = $1")
            .bind(clinic_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MembershipRepository for PgStore {
    async fn find_membership(
        &self,
        user_id: Uuid,
        clinic_id: Uuid,
    ) -> DatabaseResult<Option<Membership>> {
        let sql = format!(
            "SELECT {} FROM user_clinic_memberships WHERE user_id = $1 AND clinic_id = $2",
            MEMBERSHIP_COLUMNS
        );
        sqlx::query_as::<_, Membership>(&sql)
            .bind(user_id)
            .bind(clinic_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list_memberships_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Membership>> {
        let sql = format!(
            "SELECT {} FROM user_clinic_memberships WHERE user_id = $1 ORDER BY created_at",
            MEMBERSHIP_COLUMNS
        );
        sqlx::query_as::<_, Membership>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list_member_ids(&self, clinic_id: Uuid) -> DatabaseResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT user_id FROM user_clinic_memberships WHERE clinic_id = $1")
            .bind(clinic_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn delete_user(&self, user_id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting user: {}", user_id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DoctorRepository for PgStore {
    async fn create_doctor(&self, clinic_id: Uuid, input: &DoctorInput) -> DatabaseResult<Doctor> {
        info!("Creating doctor in clinic: {}", clinic_id);

        let sql = format!(
            r#"
            INSERT INTO doctors (clinic_id, name, avatar_image_url, available_from_weekday,
                                 available_to_weekday, available_from_time, available_to_time,
                                 license_id, specialty, price_in_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            DOCTOR_COLUMNS
        );
        sqlx::query_as::<_, Doctor>(&sql)
            .bind(clinic_id)
            .bind(&input.name)
            .bind(&input.avatar_image_url)
            .bind(input.available_from_weekday)
            .bind(input.available_to_weekday)
            .bind(input.available_from_time)
            .bind(input.available_to_time)
            .bind(&input.license_id)
            .bind(&input.specialty)
            .bind(input.price_in_cents)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list_doctors(&self, clinic_id: Uuid) -> DatabaseResult<Vec<Doctor>> {
        let sql = format!(
            "SELECT {} FROM doctors WHERE clinic_id = $1 ORDER BY name",
            DOCTOR_COLUMNS
        );
        sqlx::query_as::<_, Doctor>(&sql)
            .bind(clinic_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_doctor(
        &self,
        clinic_id: Uuid,
        doctor_id: Uuid,
    ) -> DatabaseResult<Option<Doctor>> {
        let sql = format!(
            "SELECT {} FROM doctors WHERE clinic_id = $1 AND id = $2",
            DOCTOR_COLUMNS
        );
        sqlx::query_as::<_, Doctor>(&sql)
            .bind(clinic_id)
            .bind(doctor_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn update_doctor(
        &self,
        clinic_id: Uuid,
        doctor_id: Uuid,
        input: &DoctorInput,
    ) -> DatabaseResult<Option<Doctor>> {
        info!("Updating doctor: {}", doctor_id);

        let sql = format!(
            r#"
            UPDATE doctors
            SET name = $3, avatar_image_url = $4, available_from_weekday = $5,
                available_to_weekday = $6, available_from_time = $7, available_to_time = $8,
                license_id = $9, specialty = $10, price_in_cents = $11, updated_at = NOW()
            WHERE clinic_id = $1 AND id = $2
            RETURNING {}
            "#,
            DOCTOR_COLUMNS
        );
        sqlx::query_as::<_, Doctor>(&sql)
            .bind(clinic_id)
            .bind(doctor_id)
            .bind(&input.name)
            .bind(&input.avatar_image_url)
            .bind(input.available_from_weekday)
            .bind(input.available_to_weekday)
            .bind(input.available_from_time)
            .bind(input.available_to_time)
            .bind(&input.license_id)
            .bind(&input.specialty)
            .bind(input.price_in_cents)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn delete_doctor(&self, clinic_id: Uuid, doctor_id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting doctor: {}", doctor_id);

        let result = sqlx::query("DELETE FROM doctors WHERE clinic_id = $1 AND id = $2")
            .bind(clinic_id)
            .bind(doctor_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PatientRepository for PgStore {
    async fn create_patient(
        &self,
        clinic_id: Uuid,
        input: &PatientInput,
    ) -> DatabaseResult<Patient> {
        info!("Creating patient in clinic: {}", clinic_id);

        let sql = format!(
            r#"
            INSERT INTO patients (clinic_id, name, email, phone, birth_date, sex)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PATIENT_COLUMNS
        );
        sqlx::query_as::<_, Patient>(&sql)
            .bind(clinic_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(input.birth_date)
            .bind(input.sex)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list_patients(&self, clinic_id: Uuid) -> DatabaseResult<Vec<Patient>> {
        let sql = format!(
            "SELECT {} FROM patients WHERE clinic_id = $1 ORDER BY name",
            PATIENT_COLUMNS
        );
        sqlx::query_as::<_, Patient>(&sql)
            .bind(clinic_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_patient(
        &self,
        clinic_id: Uuid,
        patient_id: Uuid,
    ) -> DatabaseResult<Option<Patient>> {
        let sql = format!(
            "SELECT {} FROM patients WHERE clinic_id = $1 AND id = $2",
            PATIENT_COLUMNS
        );
        sqlx::query_as::<_, Patient>(&sql)
            .bind(clinic_id)
            .bind(patient_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn update_patient(
        &self,
        clinic_id: Uuid,
        patient_id: Uuid,
        input: &PatientInput,
    ) -> DatabaseResult<Option<Patient>> {
        info!("Updating patient: {}", patient_id);

        let sql = format!(
            r#"
            UPDATE patients
            SET name = $3, email = $4, phone = $5, birth_date = $6, sex = $7, updated_at = NOW()
            WHERE clinic_id = $1 AND id = $2
            RETURNING {}
            "#,
            PATIENT_COLUMNS
        );
        sqlx::query_as::<_, Patient>(&sql)
            .bind(clinic_id)
            .bind(patient_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(input.birth_date)
            .bind(input.sex)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn delete_patient(&self, clinic_id: Uuid, patient_id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting patient: {}", patient_id);

        let result = sqlx::query("DELETE FROM patients WHERE clinic_id = $1 AND id = $2")
            .bind(clinic_id)
            .bind(patient_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AppointmentRepository for PgStore {
    async fn create_appointment(
        &self,
        clinic_id: Uuid,
        input: &NewAppointment,
    ) -> DatabaseResult<Appointment> {
        info!("Creating appointment in clinic: {}", clinic_id);

        let sql = format!(
            r#"
            INSERT INTO appointments (date, clinic_id, patient_id, doctor_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(input.date)
            .bind(clinic_id)
            .bind(input.patient_id)
            .bind(input.doctor_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list_appointments(
        &self,
        clinic_id: Uuid,
        query: &AppointmentQuery,
    ) -> DatabaseResult<Vec<Appointment>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE clinic_id = $1
              AND ($2::uuid IS NULL OR doctor_id = $2)
              AND ($3::uuid IS NULL OR patient_id = $3)
            ORDER BY date
            "#,
            APPOINTMENT_COLUMNS
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(clinic_id)
            .bind(query.doctor_id)
            .bind(query.patient_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
    ) -> DatabaseResult<Option<Appointment>> {
        let sql = format!(
            "SELECT {} FROM appointments WHERE clinic_id = $1 AND id = $2",
            APPOINTMENT_COLUMNS
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(clinic_id)
            .bind(appointment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn reschedule_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
        date: DateTime<Utc>,
    ) -> DatabaseResult<Option<Appointment>> {
        info!("Rescheduling appointment: {}", appointment_id);

        let sql = format!(
            r#"
            UPDATE appointments SET date = $3, updated_at = NOW()
            WHERE clinic_id = $1 AND id = $2
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(clinic_id)
            .bind(appointment_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn delete_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
    ) -> DatabaseResult<bool> {
        info!("Deleting appointment: {}", appointment_id);

        let result = sqlx::query("DELETE FROM appointments WHERE clinic_id = $1 AND id = $2")
            .bind(clinic_id)
            .bind(appointment_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.pool).await
    }
}
