//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get},
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{
    AppState,
    context::RequestContext,
    error::ApiError,
    middleware::session_middleware,
    models::{
        AppointmentQuery, DoctorInput, Landing, NewAppointment, NewClinic, PatientInput,
        RescheduleAppointment,
    },
};

/// Where users without any clinic are sent
pub const CLINIC_FORM_PATH: &str = "/clinic-form";

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/account", delete(delete_account))
        .route("/clinics", get(list_clinics).post(create_clinic))
        .route(
            "/clinics/:clinic_id",
            get(get_clinic).patch(rename_clinic).delete(delete_clinic),
        )
        .route(
            "/clinics/:clinic_id/doctors",
            get(list_doctors).post(create_doctor),
        )
        .route(
            "/clinics/:clinic_id/doctors/:doctor_id",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
        .route(
            "/clinics/:clinic_id/patients",
            get(list_patients).post(create_patient),
        )
        .route(
            "/clinics/:clinic_id/patients/:patient_id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route(
            "/clinics/:clinic_id/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/clinics/:clinic_id/appointments/:appointment_id",
            get(get_appointment)
                .patch(reschedule_appointment)
                .delete(delete_appointment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    match state.store.health_check().await {
        Ok(true) => Ok(Json(json!({
            "status": "ok",
            "service": "clinic-api"
        }))),
        Ok(false) => Err(ApiError::InternalServerError),
        Err(e) => {
            error!("Health check failed: {}", e);
            Err(ApiError::InternalServerError)
        }
    }
}

/// Landing page: the dashboard, or clinic creation for users without a clinic
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Response, ApiError> {
    match state.clinics.landing(&ctx).await? {
        Landing::ClinicForm => Ok(Redirect::to(CLINIC_FORM_PATH).into_response()),
        Landing::Dashboard(dashboard) => Ok(Json(dashboard).into_response()),
    }
}

/// Account deletion hook for the auth service: drops the caller's user row
/// and memberships, keeping the clinics
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, ApiError> {
    state.clinics.remove_user(ctx.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Clinics

pub async fn list_clinics(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.clinics.list_clinics(&ctx).await?))
}

/// Create a clinic owned by the caller
pub async fn create_clinic(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<NewClinic>,
) -> Result<impl IntoResponse, ApiError> {
    let clinic = state.clinics.create_clinic(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(clinic)))
}

pub async fn get_clinic(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(clinic_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.clinics.get_clinic(&ctx, clinic_id).await?))
}

pub async fn rename_clinic(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(clinic_id): Path<Uuid>,
    Json(payload): Json<NewClinic>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.clinics.rename_clinic(&ctx, clinic_id, payload).await?,
    ))
}

pub async fn delete_clinic(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(clinic_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.clinics.delete_clinic(&ctx, clinic_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Doctors

pub async fn list_doctors(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(clinic_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.scheduling.list_doctors(&ctx, clinic_id).await?))
}

pub async fn create_doctor(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(clinic_id): Path<Uuid>,
    Json(payload): Json<DoctorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let doctor = state
        .scheduling
        .create_doctor(&ctx, clinic_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

pub async fn get_doctor(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((clinic_id, doctor_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .scheduling
            .get_doctor(&ctx, clinic_id, doctor_id)
            .await?,
    ))
}

pub async fn update_doctor(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((clinic_id, doctor_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<DoctorInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .scheduling
            .update_doctor(&ctx, clinic_id, doctor_id, payload)
            .await?,
    ))
}

pub async fn delete_doctor(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((clinic_id, doctor_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .scheduling
        .delete_doctor(&ctx, clinic_id, doctor_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Patients

pub async fn list_patients(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(clinic_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.scheduling.list_patients(&ctx, clinic_id).await?))
}

pub async fn create_patient(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(clinic_id): Path<Uuid>,
    Json(payload): Json<PatientInput>,
) -> Result<impl IntoResponse, ApiError> {
    let patient = state
        .scheduling
        .create_patient(&ctx, clinic_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((clinic_id, patient_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .scheduling
            .get_patient(&ctx, clinic_id, patient_id)
            .await?,
    ))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((clinic_id, patient_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PatientInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .scheduling
            .update_patient(&ctx, clinic_id, patient_id, payload)
            .await?,
    ))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((clinic_id, patient_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .scheduling
        .delete_patient(&ctx, clinic_id, patient_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Appointments

/// List appointments, optionally filtered by `doctor_id` or `patient_id`
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(clinic_id): Path<Uuid>,
    Query(query): Query<AppointmentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .scheduling
            .list_appointments(&ctx, clinic_id, query)
            .await?,
    ))
}

pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(clinic_id): Path<Uuid>,
    Json(payload): Json<NewAppointment>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = state
        .scheduling
        .create_appointment(&ctx, clinic_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((clinic_id, appointment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .scheduling
            .get_appointment(&ctx, clinic_id, appointment_id)
            .await?,
    ))
}

pub async fn reschedule_appointment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((clinic_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RescheduleAppointment>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .scheduling
            .reschedule_appointment(&ctx, clinic_id, appointment_id, payload.date)
            .await?,
    ))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((clinic_id, appointment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .scheduling
        .delete_appointment(&ctx, clinic_id, appointment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
