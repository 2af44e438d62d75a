use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client's motorcycle as registered in the workshop. The scheduling core
/// only reads it for ownership, brand and plate-restriction checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub client_id: Uuid,
    pub brand: String,
    pub license_plate: String,
    pub model: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    pub fn is_brand(&self, brand: &str) -> bool {
        self.brand.eq_ignore_ascii_case(brand)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum VehicleError {
    #[error("Vehicle not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
