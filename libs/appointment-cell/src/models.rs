// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub appointment_type: AppointmentType,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    /// Always `start_time + duration(appointment_type)`; persisted so the
    /// store can run overlap filters without re-deriving it.
    pub end_time: NaiveTime,
    pub technician_id: Option<Uuid>,
    pub status: AppointmentStatus,
    pub current_mileage: Option<i32>,
    pub client_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    OilChange,
    QuickService,
    ManualWarrantyReview,
    AutecoWarranty,
    Maintenance,
    Rework,
    Unplanned,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::OilChange => write!(f, "oil_change"),
            AppointmentType::QuickService => write!(f, "quick_service"),
            AppointmentType::ManualWarrantyReview => write!(f, "manual_warranty_review"),
            AppointmentType::AutecoWarranty => write!(f, "auteco_warranty"),
            AppointmentType::Maintenance => write!(f, "maintenance"),
            AppointmentType::Rework => write!(f, "rework"),
            AppointmentType::Unplanned => write!(f, "unplanned"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Rejected,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub vehicle_id: Uuid,
    pub appointment_type: AppointmentType,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub current_mileage: Option<i32>,
    pub client_notes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUnplannedAppointmentRequest {
    pub vehicle_id: Uuid,
    /// Always `unplanned` on the wire; anything else is rejected.
    pub appointment_type: AppointmentType,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub current_mileage: Option<i32>,
    pub technician_id: Option<Uuid>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
    pub notify_client: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTechnicianRequest {
    pub technician_id: Uuid,
    pub notify_client: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub id: Uuid,
    pub brand: String,
    pub license_plate: String,
    pub client_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianSummary {
    pub id: Uuid,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub vehicle: VehicleSummary,
    pub client: ClientSummary,
    pub technician: Option<TechnicianSummary>,
    pub client_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One bookable slot for a given date and type, with the number of active
/// technicians still free for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub free_technicians: usize,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Invalid appointment slot: {0}")]
    InvalidSlot(String),

    #[error("Outside business hours: {0}")]
    OutsideBusinessHours(String),

    #[error("Appointment type {appointment_type} is only available for {brand} vehicles")]
    TypeNotAllowedForBrand {
        appointment_type: AppointmentType,
        brand: String,
    },

    #[error("License plate {0} is restricted from circulating on the requested date")]
    LicensePlateRestricted(String),

    #[error("Rework appointments cannot be booked online")]
    ReworkNotBookableOnline,

    #[error("Vehicle already has an active appointment")]
    VehicleHasActiveAppointment,

    #[error("No technician available for the requested slot")]
    NoAvailableTechnician,

    #[error("Technician already has an appointment overlapping that slot")]
    TechnicianSlotOccupied,

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Vehicle not found")]
    VehicleNotFound,

    #[error("Technician not found")]
    TechnicianNotFound,

    #[error("Vehicle does not belong to the requesting client")]
    NotVehicleOwner,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
