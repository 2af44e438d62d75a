// libs/appointment-cell/src/services/assignment.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info};
use uuid::Uuid;

use technician_cell::models::Technician;
use technician_cell::services::lookup::TechnicianLookupService;

use crate::models::AppointmentError;
use crate::services::conflict::ConflictCheckService;

/// First-fit technician assignment over the active roster. The roster
/// arrives ordered by id ascending, so given an unchanged roster and
/// conflict set the same technician is always picked.
pub struct TechnicianAssignmentService {
    technicians: Arc<TechnicianLookupService>,
    conflicts: Arc<ConflictCheckService>,
}

impl TechnicianAssignmentService {
    pub fn new(
        technicians: Arc<TechnicianLookupService>,
        conflicts: Arc<ConflictCheckService>,
    ) -> Self {
        Self { technicians, conflicts }
    }

    /// Pick the first active technician free for the interval.
    pub async fn assign(
        &self,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        auth_token: &str,
    ) -> Result<Technician, AppointmentError> {
        let roster = self
            .technicians
            .find_active_all(auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        debug!(
            "Assigning technician for {} [{} - {}) over a roster of {}",
            date,
            start_time,
            end_time,
            roster.len()
        );

        for technician in roster {
            let busy = self
                .conflicts
                .has_conflict(technician.id, date, start_time, end_time, auth_token)
                .await?;

            if !busy {
                info!(
                    "Assigned technician {} ({}) for {} [{} - {})",
                    technician.id, technician.full_name, date, start_time, end_time
                );
                return Ok(technician);
            }
        }

        Err(AppointmentError::NoAvailableTechnician)
    }

    /// Assign a specific technician. No fallback to automatic assignment:
    /// if the requested technician is busy the caller gets the conflict.
    pub async fn assign_manual(
        &self,
        technician_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        auth_token: &str,
    ) -> Result<Technician, AppointmentError> {
        let technician = self
            .technicians
            .find_by_id(technician_id, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::TechnicianNotFound)?;

        if !technician.is_active {
            return Err(AppointmentError::TechnicianNotFound);
        }

        let busy = self
            .conflicts
            .has_conflict(technician.id, date, start_time, end_time, auth_token)
            .await?;

        if busy {
            return Err(AppointmentError::TechnicianSlotOccupied);
        }

        Ok(technician)
    }

    /// How many of the given technicians are free for the interval. Used by
    /// availability reporting only; never selects anyone.
    pub async fn count_free(
        &self,
        technicians: &[Technician],
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        auth_token: &str,
    ) -> Result<usize, AppointmentError> {
        let mut free = 0;
        for technician in technicians {
            let busy = self
                .conflicts
                .has_conflict(technician.id, date, start_time, end_time, auth_token)
                .await?;
            if !busy {
                free += 1;
            }
        }
        Ok(free)
    }
}
