// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentType, CancelAppointmentRequest, CreateAppointmentRequest,
    CreateUnplannedAppointmentRequest, UpdateTechnicianRequest,
};
use crate::services::booking::AppointmentBookingService;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub appointment_type: AppointmentType,
}

fn map_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::InvalidSlot(_)
        | AppointmentError::OutsideBusinessHours(_)
        | AppointmentError::TypeNotAllowedForBrand { .. }
        | AppointmentError::LicensePlateRestricted(_)
        | AppointmentError::ReworkNotBookableOnline => AppError::BadRequest(e.to_string()),

        AppointmentError::VehicleHasActiveAppointment
        | AppointmentError::NoAvailableTechnician
        | AppointmentError::TechnicianSlotOccupied
        | AppointmentError::AlreadyCancelled => AppError::Conflict(e.to_string()),

        AppointmentError::NotFound
        | AppointmentError::VehicleNotFound
        | AppointmentError::TechnicianNotFound => AppError::NotFound(e.to_string()),

        AppointmentError::NotVehicleOwner => AppError::Auth(e.to_string()),

        AppointmentError::DatabaseError(msg) => AppError::Internal(msg),
    }
}

fn client_id_of(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}

/// Book an appointment for one of the authenticated client's vehicles.
#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let client_id = client_id_of(&user)?;

    let service = AppointmentBookingService::new(&state);
    let appointment = service
        .create_appointment(request, client_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

/// Staff-created appointment for walk-in or shop-initiated work.
#[axum::debug_handler]
pub async fn create_unplanned_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateUnplannedAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Auth(
            "Only workshop staff can create unplanned appointments".to_string(),
        ));
    }

    let service = AppointmentBookingService::new(&state);
    let appointment = service
        .create_unplanned_appointment(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let slots = service
        .get_available_slots(query.date, query.appointment_type, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "date": query.date,
        "appointment_type": query.appointment_type,
        "available_slots": slots,
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service
        .cancel_appointment(appointment_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn update_technician(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateTechnicianRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Auth(
            "Only workshop staff can reassign technicians".to_string(),
        ));
    }

    let service = AppointmentBookingService::new(&state);
    let appointment = service
        .update_technician(appointment_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn get_vehicle_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointments = service
        .get_vehicle_appointments(vehicle_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "vehicle_id": vehicle_id,
        "appointments": appointments,
    })))
}

/// A client may only read their own history; staff can read anyone's.
#[axum::debug_handler]
pub async fn get_client_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && client_id_of(&user)? != client_id {
        return Err(AppError::Auth(
            "Not authorized to view appointments for this client".to_string(),
        ));
    }

    let service = AppointmentBookingService::new(&state);
    let appointments = service
        .get_client_appointments(client_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "client_id": client_id,
        "appointments": appointments,
    })))
}

/// The workshop's day sheet.
#[axum::debug_handler]
pub async fn get_appointments_for_date(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Auth(
            "Only workshop staff can view the daily schedule".to_string(),
        ));
    }

    let service = AppointmentBookingService::new(&state);
    let appointments = service
        .get_appointments_for_date(date, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "date": date,
        "appointments": appointments,
    })))
}
