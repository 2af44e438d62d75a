use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

/// Everything the mail template needs about an appointment. Owned data so
/// the dispatch task can outlive the request that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentNotice {
    pub appointment_id: Uuid,
    pub client_email: Option<String>,
    pub appointment_type: String,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub license_plate: String,
}
