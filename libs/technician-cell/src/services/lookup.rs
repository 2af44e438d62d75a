use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{Technician, TechnicianError};

pub struct TechnicianLookupService {
    supabase: Arc<SupabaseClient>,
}

impl TechnicianLookupService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Active technicians ordered by id ascending. Assignment iterates this
    /// list first-fit, so the ordering is part of the contract: repeated
    /// calls against an unchanged roster must yield the same order.
    pub async fn find_active_all(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Technician>, TechnicianError> {
        debug!("Fetching active technician roster");

        let path = "/rest/v1/technicians?is_active=eq.true&order=id.asc";
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| TechnicianError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Technician>, _>>()
            .map_err(|e| {
                TechnicianError::DatabaseError(format!("Failed to parse technicians: {}", e))
            })
    }

    /// Fetch a technician by id regardless of active flag. `Ok(None)` when
    /// no row matches.
    pub async fn find_by_id(
        &self,
        technician_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Technician>, TechnicianError> {
        let path = format!("/rest/v1/technicians?id=eq.{}", technician_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| TechnicianError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let technician: Technician = serde_json::from_value(row).map_err(|e| {
                    TechnicianError::DatabaseError(format!("Failed to parse technician: {}", e))
                })?;
                Ok(Some(technician))
            }
            None => Ok(None),
        }
    }
}
