// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use technician_cell::services::lookup::TechnicianLookupService;

use crate::models::{AppointmentError, AppointmentType, AvailableSlot};
use crate::services::assignment::TechnicianAssignmentService;
use crate::services::catalog::ScheduleCatalog;

/// Composes the slot catalog with the conflict tally to report which slots
/// still have at least one free technician.
pub struct AvailabilityService {
    technicians: Arc<TechnicianLookupService>,
    assigner: Arc<TechnicianAssignmentService>,
}

impl AvailabilityService {
    pub fn new(
        technicians: Arc<TechnicianLookupService>,
        assigner: Arc<TechnicianAssignmentService>,
    ) -> Self {
        Self { technicians, assigner }
    }

    /// Slots for `date` and `appointment_type` that still have a free
    /// technician, in catalog order. A type without a catalog (rework,
    /// unplanned) yields an empty list, not an error.
    pub async fn get_available_slots(
        &self,
        date: NaiveDate,
        appointment_type: AppointmentType,
        auth_token: &str,
    ) -> Result<Vec<AvailableSlot>, AppointmentError> {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Err(AppointmentError::OutsideBusinessHours(format!(
                "the workshop is closed on weekends ({})",
                date
            )));
        }

        let slots = ScheduleCatalog::slots_for(appointment_type);
        if slots.is_empty() {
            debug!("No slot catalog for {}, returning empty availability", appointment_type);
            return Ok(Vec::new());
        }

        let roster = self
            .technicians
            .find_active_all(auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let duration = ScheduleCatalog::duration_for(appointment_type);
        let mut available = Vec::new();

        for start_time in slots {
            let end_time = start_time + duration;
            let free = self
                .assigner
                .count_free(&roster, date, start_time, end_time, auth_token)
                .await?;

            if free > 0 {
                available.push(AvailableSlot {
                    start_time,
                    end_time,
                    free_technicians: free,
                });
            }
        }

        debug!(
            "{} of {} catalog slots available for {} on {}",
            available.len(),
            ScheduleCatalog::slots_for(appointment_type).len(),
            appointment_type,
            date
        );

        Ok(available)
    }
}
