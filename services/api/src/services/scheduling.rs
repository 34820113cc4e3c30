//! Clinic-scoped scheduling: doctors, patients and appointments
//!
//! Every operation first checks that the acting user belongs to the target
//! clinic, then works only on rows of that clinic.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::tenancy::require_membership;
use crate::{
    context::RequestContext,
    error::{ApiError, ApiResult},
    models::{
        Appointment, AppointmentQuery, Doctor, DoctorInput, NewAppointment, Patient,
        PatientInput,
    },
    repositories::Store,
    validation,
};

/// Scheduling service
#[derive(Clone)]
pub struct SchedulingService {
    store: Arc<dyn Store>,
}

impl SchedulingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn guard(&self, ctx: &RequestContext, clinic_id: Uuid) -> ApiResult<()> {
        require_membership(self.store.as_ref(), ctx, clinic_id).await?;
        Ok(())
    }

    // Doctors

    pub async fn create_doctor(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        input: DoctorInput,
    ) -> ApiResult<Doctor> {
        self.guard(ctx, clinic_id).await?;
        let input = validation::doctor(input).map_err(ApiError::BadRequest)?;

        let doctor = self.store.create_doctor(clinic_id, &input).await?;
        info!("Doctor {} added to clinic {}", doctor.id, clinic_id);
        Ok(doctor)
    }

    pub async fn list_doctors(&self, ctx: &RequestContext, clinic_id: Uuid) -> ApiResult<Vec<Doctor>> {
        self.guard(ctx, clinic_id).await?;
        Ok(self.store.list_doctors(clinic_id).await?)
    }

    pub async fn get_doctor(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        doctor_id: Uuid,
    ) -> ApiResult<Doctor> {
        self.guard(ctx, clinic_id).await?;
        self.store
            .find_doctor(clinic_id, doctor_id)
            .await?
            .ok_or(ApiError::NotFound("Doctor"))
    }

    pub async fn update_doctor(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        doctor_id: Uuid,
        input: DoctorInput,
    ) -> ApiResult<Doctor> {
        self.guard(ctx, clinic_id).await?;
        let input = validation::doctor(input).map_err(ApiError::BadRequest)?;

        self.store
            .update_doctor(clinic_id, doctor_id, &input)
            .await?
            .ok_or(ApiError::NotFound("Doctor"))
    }

    /// Remove a doctor; the doctor's appointments go too
    pub async fn delete_doctor(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        doctor_id: Uuid,
    ) -> ApiResult<()> {
        self.guard(ctx, clinic_id).await?;
        if !self.store.delete_doctor(clinic_id, doctor_id).await? {
            return Err(ApiError::NotFound("Doctor"));
        }
        info!("Doctor {} removed from clinic {}", doctor_id, clinic_id);
        Ok(())
    }

    // Patients

    pub async fn create_patient(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        input: PatientInput,
    ) -> ApiResult<Patient> {
        self.guard(ctx, clinic_id).await?;
        let input = validation::patient(input).map_err(ApiError::BadRequest)?;

        let patient = self.store.create_patient(clinic_id, &input).await?;
        info!("Patient {} registered in clinic {}", patient.id, clinic_id);
        Ok(patient)
    }

    pub async fn list_patients(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
    ) -> ApiResult<Vec<Patient>> {
        self.guard(ctx, clinic_id).await?;
        Ok(self.store.list_patients(clinic_id).await?)
    }

    pub async fn get_patient(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        patient_id: Uuid,
    ) -> ApiResult<Patient> {
        self.guard(ctx, clinic_id).await?;
        self.store
            .find_patient(clinic_id, patient_id)
            .await?
            .ok_or(ApiError::NotFound("Patient"))
    }

    pub async fn update_patient(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        patient_id: Uuid,
        input: PatientInput,
    ) -> ApiResult<Patient> {
        self.guard(ctx, clinic_id).await?;
        let input = validation::patient(input).map_err(ApiError::BadRequest)?;

        self.store
            .update_patient(clinic_id, patient_id, &input)
            .await?
            .ok_or(ApiError::NotFound("Patient"))
    }

    /// Remove a patient; the patient's appointments go too
    pub async fn delete_patient(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        patient_id: Uuid,
    ) -> ApiResult<()> {
        self.guard(ctx, clinic_id).await?;
        if !self.store.delete_patient(clinic_id, patient_id).await? {
            return Err(ApiError::NotFound("Patient"));
        }
        info!("Patient {} removed from clinic {}", patient_id, clinic_id);
        Ok(())
    }

    // Appointments

    /// Book an appointment between a doctor and a patient of the clinic.
    ///
    /// A date outside the doctor's availability window is accepted and
    /// logged.
    pub async fn create_appointment(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        input: NewAppointment,
    ) -> ApiResult<Appointment> {
        self.guard(ctx, clinic_id).await?;

        let doctor = self
            .store
            .find_doctor(clinic_id, input.doctor_id)
            .await?
            .ok_or(ApiError::NotFound("Doctor"))?;
        self.store
            .find_patient(clinic_id, input.patient_id)
            .await?
            .ok_or(ApiError::NotFound("Patient"))?;
        warn_outside_availability(&doctor, input.date);

        let appointment = self.store.create_appointment(clinic_id, &input).await?;
        info!(
            "Appointment {} booked in clinic {} for {}",
            appointment.id, clinic_id, appointment.date
        );
        Ok(appointment)
    }

    pub async fn list_appointments(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        query: AppointmentQuery,
    ) -> ApiResult<Vec<Appointment>> {
        self.guard(ctx, clinic_id).await?;
        Ok(self.store.list_appointments(clinic_id, &query).await?)
    }

    pub async fn get_appointment(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        appointment_id: Uuid,
    ) -> ApiResult<Appointment> {
        self.guard(ctx, clinic_id).await?;
        self.store
            .find_appointment(clinic_id, appointment_id)
            .await?
            .ok_or(ApiError::NotFound("Appointment"))
    }

    pub async fn reschedule_appointment(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        appointment_id: Uuid,
        date: DateTime<Utc>,
    ) -> ApiResult<Appointment> {
        self.guard(ctx, clinic_id).await?;

        let current = self
            .store
            .find_appointment(clinic_id, appointment_id)
            .await?
            .ok_or(ApiError::NotFound("Appointment"))?;
        if let Some(doctor) = self.store.find_doctor(clinic_id, current.doctor_id).await? {
            warn_outside_availability(&doctor, date);
        }

        self.store
            .reschedule_appointment(clinic_id, appointment_id, date)
            .await?
            .ok_or(ApiError::NotFound("Appointment"))
    }

    pub async fn delete_appointment(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        appointment_id: Uuid,
    ) -> ApiResult<()> {
        self.guard(ctx, clinic_id).await?;
        if !self
            .store
            .delete_appointment(clinic_id, appointment_id)
            .await?
        {
            return Err(ApiError::NotFound("Appointment"));
        }
        Ok(())
    }
}

fn warn_outside_availability(doctor: &Doctor, date: DateTime<Utc>) {
    if !doctor.availability().covers(date) {
        warn!(
            "Appointment at {} is outside the availability of doctor {}",
            date, doctor.id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::SessionUser,
        models::{Clinic, Sex},
        repositories::{ClinicRepository, MemoryStore},
    };
    use chrono::{NaiveTime, TimeZone};

    fn ctx(id: Uuid) -> RequestContext {
        RequestContext::new(SessionUser {
            id,
            email: "staff@example.com".to_string(),
        })
    }

    fn doctor_input() -> DoctorInput {
        DoctorInput {
            name: "Dr. Souza".to_string(),
            avatar_image_url: Some("  ".to_string()),
            available_from_weekday: 1,
            available_to_weekday: 5,
            available_from_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            available_to_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            license_id: "CRM-123".to_string(),
            specialty: "Cardiologia".to_string(),
            price_in_cents: 25000,
        }
    }

    fn patient_input(email: &str) -> PatientInput {
        PatientInput {
            name: "João".to_string(),
            email: email.to_string(),
            phone: "+55 21 98888-7777".to_string(),
            birth_date: None,
            sex: Sex::Male,
        }
    }

    async fn setup() -> (MemoryStore, SchedulingService, RequestContext, Clinic) {
        let store = MemoryStore::new();
        let service = SchedulingService::new(Arc::new(store.clone()));
        let owner = ctx(Uuid::new_v4());
        let (clinic, _) = store
            .create_clinic_with_member(owner.user_id(), "Clínica Central")
            .await
            .unwrap();
        (store, service, owner, clinic)
    }

    #[tokio::test]
    async fn test_doctor_crud_within_clinic() {
        let (_, service, owner, clinic) = setup().await;

        let doctor = service
            .create_doctor(&owner, clinic.id, doctor_input())
            .await
            .unwrap();
        assert_eq!(doctor.clinic_id, clinic.id);
        assert!(doctor.avatar_image_url.is_none());

        let mut changed = doctor_input();
        changed.price_in_cents = 30000;
        let updated = service
            .update_doctor(&owner, clinic.id, doctor.id, changed)
            .await
            .unwrap();
        assert_eq!(updated.price_in_cents, 30000);

        service.delete_doctor(&owner, clinic.id, doctor.id).await.unwrap();
        assert!(matches!(
            service.get_doctor(&owner, clinic.id, doctor.id).await,
            Err(ApiError::NotFound("Doctor"))
        ));
    }

    #[tokio::test]
    async fn test_invalid_doctor_is_rejected() {
        let (store, service, owner, clinic) = setup().await;
        let mut input = doctor_input();
        input.price_in_cents = -1;

        let result = service.create_doctor(&owner, clinic.id, input).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert_eq!(store.dependent_row_count(clinic.id).await, 1);
    }

    #[tokio::test]
    async fn test_outsider_is_forbidden_everywhere() {
        let (_, service, owner, clinic) = setup().await;
        let outsider = ctx(Uuid::new_v4());
        let doctor = service
            .create_doctor(&owner, clinic.id, doctor_input())
            .await
            .unwrap();

        assert!(matches!(
            service.list_doctors(&outsider, clinic.id).await,
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            service.get_doctor(&outsider, clinic.id, doctor.id).await,
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            service
                .create_patient(&outsider, clinic.id, patient_input("x@example.com"))
                .await,
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            service
                .list_appointments(&outsider, clinic.id, AppointmentQuery::default())
                .await,
            Err(ApiError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_patient_email_is_normalized_and_globally_unique() {
        let (store, service, owner, clinic) = setup().await;
        let patient = service
            .create_patient(&owner, clinic.id, patient_input("  Joao@Example.COM "))
            .await
            .unwrap();
        assert_eq!(patient.email, "joao@example.com");

        let (other, _) = store
            .create_clinic_with_member(owner.user_id(), "Clínica Norte")
            .await
            .unwrap();
        let duplicate = service
            .create_patient(&owner, other.id, patient_input("joao@example.com"))
            .await;
        assert!(matches!(
            duplicate,
            Err(ApiError::Database(
                common::error::DatabaseError::UniqueViolation { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_appointment_rejects_foreign_doctor() {
        let (store, service, owner, clinic) = setup().await;
        let (other, _) = store
            .create_clinic_with_member(owner.user_id(), "Clínica Norte")
            .await
            .unwrap();
        let foreign_doctor = service
            .create_doctor(&owner, other.id, doctor_input())
            .await
            .unwrap();
        let patient = service
            .create_patient(&owner, clinic.id, patient_input("ana@example.com"))
            .await
            .unwrap();

        let result = service
            .create_appointment(
                &owner,
                clinic.id,
                NewAppointment {
                    date: Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap(),
                    patient_id: patient.id,
                    doctor_id: foreign_doctor.id,
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::NotFound("Doctor"))));
    }

    #[tokio::test]
    async fn test_appointment_outside_availability_is_accepted() {
        let (_, service, owner, clinic) = setup().await;
        let doctor = service
            .create_doctor(&owner, clinic.id, doctor_input())
            .await
            .unwrap();
        let patient = service
            .create_patient(&owner, clinic.id, patient_input("ana@example.com"))
            .await
            .unwrap();
        // 2025-06-01 is a Sunday
        let sunday = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();

        let appointment = service
            .create_appointment(
                &owner,
                clinic.id,
                NewAppointment {
                    date: sunday,
                    patient_id: patient.id,
                    doctor_id: doctor.id,
                },
            )
            .await
            .unwrap();
        assert_eq!(appointment.date, sunday);

        let monday = Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap();
        let moved = service
            .reschedule_appointment(&owner, clinic.id, appointment.id, monday)
            .await
            .unwrap();
        assert_eq!(moved.date, monday);

        let listed = service
            .list_appointments(
                &owner,
                clinic.id,
                AppointmentQuery {
                    doctor_id: Some(doctor.id),
                    patient_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(listed, vec![moved]);
    }

    #[tokio::test]
    async fn test_deleting_patient_removes_appointments() {
        let (_, service, owner, clinic) = setup().await;
        let doctor = service
            .create_doctor(&owner, clinic.id, doctor_input())
            .await
            .unwrap();
        let patient = service
            .create_patient(&owner, clinic.id, patient_input("ana@example.com"))
            .await
            .unwrap();
        let appointment = service
            .create_appointment(
                &owner,
                clinic.id,
                NewAppointment {
                    date: Utc.with_ymd_and_hms(2025, 6, 3, 11, 0, 0).unwrap(),
                    patient_id: patient.id,
                    doctor_id: doctor.id,
                },
            )
            .await
            .unwrap();

        service
            .delete_patient(&owner, clinic.id, patient.id)
            .await
            .unwrap();

        assert!(matches!(
            service
                .get_appointment(&owner, clinic.id, appointment.id)
                .await,
            Err(ApiError::NotFound("Appointment"))
        ));
        assert!(matches!(
            service
                .delete_appointment(&owner, clinic.id, appointment.id)
                .await,
            Err(ApiError::NotFound("Appointment"))
        ));
    }
}
