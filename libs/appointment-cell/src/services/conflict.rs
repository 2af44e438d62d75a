// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::AppointmentError;
use crate::services::store::AppointmentStore;

/// Answers "is this technician busy in this interval?" against persisted
/// appointments.
pub struct ConflictCheckService {
    store: Arc<AppointmentStore>,
}

impl ConflictCheckService {
    pub fn new(store: Arc<AppointmentStore>) -> Self {
        Self { store }
    }

    /// True iff the technician has a non-cancelled, non-rejected,
    /// non-no-show appointment on `date` strictly overlapping
    /// `[start_time, end_time)`.
    pub async fn has_conflict(
        &self,
        technician_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Conflict check for technician {} on {} [{} - {})",
            technician_id, date, start_time, end_time
        );

        let busy = self
            .store
            .has_technician_conflict(technician_id, date, start_time, end_time, auth_token)
            .await?;

        if busy {
            warn!(
                "Technician {} already booked on {} overlapping [{} - {})",
                technician_id, date, start_time, end_time
            );
        }

        Ok(busy)
    }
}
