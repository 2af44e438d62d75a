use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{Vehicle, VehicleError};

pub struct VehicleLookupService {
    supabase: Arc<SupabaseClient>,
}

impl VehicleLookupService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Fetch a vehicle by id. `Ok(None)` when no row matches.
    pub async fn find_by_id(
        &self,
        vehicle_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Vehicle>, VehicleError> {
        debug!("Fetching vehicle: {}", vehicle_id);

        let path = format!("/rest/v1/vehicles?id=eq.{}", vehicle_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| VehicleError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let vehicle: Vehicle = serde_json::from_value(row).map_err(|e| {
                    VehicleError::DatabaseError(format!("Failed to parse vehicle: {}", e))
                })?;
                Ok(Some(vehicle))
            }
            None => Ok(None),
        }
    }

    /// All vehicles registered to a client, oldest first.
    pub async fn find_by_client(
        &self,
        client_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Vehicle>, VehicleError> {
        let path = format!(
            "/rest/v1/vehicles?client_id=eq.{}&order=created_at.asc",
            client_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| VehicleError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Vehicle>, _>>()
            .map_err(|e| VehicleError::DatabaseError(format!("Failed to parse vehicles: {}", e)))
    }
}
