// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError};

/// Persistence boundary for appointments. The `appointments` table is
/// expected to carry an exclusion constraint on
/// (technician_id, appointment_date, time range) so a lost
/// check-then-insert race surfaces as a database error instead of a
/// double-booked technician.
pub struct AppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl AppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn insert(
        &self,
        appointment_data: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))?;

        serde_json::from_value(row).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse created appointment: {}", e))
        })
    }

    pub async fn update(
        &self,
        appointment_id: Uuid,
        patch: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(patch), Some(headers))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to update appointment".to_string()))?;

        serde_json::from_value(row).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse updated appointment: {}", e))
        })
    }

    pub async fn find_by_id(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let appointment: Appointment = serde_json::from_value(row).map_err(|e| {
                    AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
                })?;
                Ok(Some(appointment))
            }
            None => Ok(None),
        }
    }

    /// Strict-overlap conflict predicate, evaluated by the store:
    /// an appointment of this technician on this date conflicts iff
    /// `existing_start < end AND existing_end > start`, ignoring
    /// cancelled/rejected/no-show rows.
    pub async fn has_technician_conflict(
        &self,
        technician_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking conflicts for technician {} on {} from {} to {}",
            technician_id, date, start_time, end_time
        );

        // PostgREST filter values carry colons; encode them like the
        // rfc3339 date filters elsewhere.
        let start = start_time.format("%H:%M:%S").to_string();
        let end = end_time.format("%H:%M:%S").to_string();

        let path = format!(
            "/rest/v1/appointments?technician_id=eq.{}&appointment_date=eq.{}&status=not.in.(cancelled,rejected,no_show)&start_time=lt.{}&end_time=gt.{}&limit=1",
            technician_id,
            date,
            urlencoding::encode(&end),
            urlencoding::encode(&start)
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(!result.is_empty())
    }

    /// Whether the vehicle already has a scheduled or in-progress
    /// appointment.
    pub async fn has_active_appointment(
        &self,
        vehicle_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?vehicle_id=eq.{}&status=in.(scheduled,in_progress)&limit=1",
            vehicle_id
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(!result.is_empty())
    }

    pub async fn find_by_vehicle(
        &self,
        vehicle_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?vehicle_id=eq.{}&order=appointment_date.desc,start_time.desc",
            vehicle_id
        );
        self.fetch_list(&path, auth_token).await
    }

    pub async fn find_by_vehicle_ids(
        &self,
        vehicle_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if vehicle_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = vehicle_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/appointments?vehicle_id=in.({})&order=appointment_date.desc,start_time.desc",
            ids
        );
        self.fetch_list(&path, auth_token).await
    }

    pub async fn find_for_date(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?appointment_date=eq.{}&order=start_time.asc",
            date
        );
        self.fetch_list(&path, auth_token).await
    }

    async fn fetch_list(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| {
                AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e))
            })
    }
}
