use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workshop employee who can be assigned to appointments. Only active
/// technicians participate in assignment and availability counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub id: Uuid,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TechnicianError {
    #[error("Technician not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
