// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use notification_cell::models::AppointmentNotice;
use notification_cell::services::mailer::NotificationService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use technician_cell::services::lookup::TechnicianLookupService;
use vehicle_cell::models::Vehicle;
use vehicle_cell::services::lookup::VehicleLookupService;

use crate::models::{
    Appointment, AppointmentError, AppointmentResponse, AppointmentStatus, AppointmentType,
    AvailableSlot, CancelAppointmentRequest, ClientSummary, CreateAppointmentRequest,
    CreateUnplannedAppointmentRequest, TechnicianSummary, UpdateTechnicianRequest,
    VehicleSummary,
};
use crate::services::assignment::TechnicianAssignmentService;
use crate::services::availability::AvailabilityService;
use crate::services::catalog::ScheduleCatalog;
use crate::services::conflict::ConflictCheckService;
use crate::services::mobility;
use crate::services::store::AppointmentStore;

/// Orchestrates the appointment lifecycle: validation pipeline, technician
/// assignment, persistence and the best-effort notifications around it.
pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    vehicles: Arc<VehicleLookupService>,
    technicians: Arc<TechnicianLookupService>,
    store: Arc<AppointmentStore>,
    assigner: Arc<TechnicianAssignmentService>,
    availability: AvailabilityService,
    notifications: NotificationService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let vehicles = Arc::new(VehicleLookupService::new(supabase.clone()));
        let technicians = Arc::new(TechnicianLookupService::new(supabase.clone()));
        let store = Arc::new(AppointmentStore::new(supabase.clone()));
        let conflicts = Arc::new(ConflictCheckService::new(store.clone()));
        let assigner = Arc::new(TechnicianAssignmentService::new(
            technicians.clone(),
            conflicts,
        ));
        let availability = AvailabilityService::new(technicians.clone(), assigner.clone());

        Self {
            supabase,
            vehicles,
            technicians,
            store,
            assigner,
            availability,
            notifications: NotificationService::new(config),
        }
    }

    pub async fn get_available_slots(
        &self,
        date: NaiveDate,
        appointment_type: AppointmentType,
        auth_token: &str,
    ) -> Result<Vec<AvailableSlot>, AppointmentError> {
        self.availability
            .get_available_slots(date, appointment_type, auth_token)
            .await
    }

    /// Client-facing booking. Each check short-circuits; the order is part
    /// of the contract (a rework request must fail before any lookup runs).
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        client_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentResponse, AppointmentError> {
        if request.appointment_type == AppointmentType::Rework {
            return Err(AppointmentError::ReworkNotBookableOnline);
        }
        if request.appointment_type == AppointmentType::Unplanned {
            return Err(AppointmentError::InvalidSlot(
                "Unplanned appointments can only be created by workshop staff".to_string(),
            ));
        }
        if !ScheduleCatalog::is_online_bookable(request.appointment_type) {
            return Err(AppointmentError::InvalidSlot(format!(
                "{} appointments cannot be booked online",
                request.appointment_type
            )));
        }

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::VehicleNotFound)?;

        if vehicle.client_id != client_id {
            return Err(AppointmentError::NotVehicleOwner);
        }

        if mobility::is_restricted(&vehicle.license_plate, request.appointment_date) {
            return Err(AppointmentError::LicensePlateRestricted(
                vehicle.license_plate.clone(),
            ));
        }

        if ScheduleCatalog::is_brand_restricted(request.appointment_type)
            && !vehicle.is_brand(ScheduleCatalog::restricted_brand())
        {
            return Err(AppointmentError::TypeNotAllowedForBrand {
                appointment_type: request.appointment_type,
                brand: vehicle.brand.clone(),
            });
        }

        if !ScheduleCatalog::slots_for(request.appointment_type).contains(&request.start_time) {
            return Err(AppointmentError::InvalidSlot(format!(
                "{} is not a bookable start time for {}",
                request.start_time.format("%H:%M"),
                request.appointment_type
            )));
        }

        self.check_working_day(request.appointment_date, request.start_time)?;

        if self
            .store
            .has_active_appointment(request.vehicle_id, auth_token)
            .await?
        {
            return Err(AppointmentError::VehicleHasActiveAppointment);
        }

        let end_time = request.start_time + ScheduleCatalog::duration_for(request.appointment_type);
        let technician = self
            .assigner
            .assign(request.appointment_date, request.start_time, end_time, auth_token)
            .await?;

        let client_notes = request
            .client_notes
            .filter(|notes| !notes.is_empty())
            .map(|notes| notes.join("; "));

        let appointment = self
            .store
            .insert(
                json!({
                    "vehicle_id": request.vehicle_id,
                    "appointment_type": request.appointment_type,
                    "appointment_date": request.appointment_date,
                    "start_time": request.start_time,
                    "end_time": end_time,
                    "technician_id": technician.id,
                    "status": AppointmentStatus::Scheduled,
                    "current_mileage": request.current_mileage,
                    "client_notes": client_notes,
                }),
                auth_token,
            )
            .await?;

        info!(
            "Created {} appointment {} for vehicle {} with technician {}",
            appointment.appointment_type, appointment.id, vehicle.id, technician.id
        );

        let client = self.fetch_client_summary(vehicle.client_id, auth_token).await;
        self.notifications
            .notify_created(Self::notice(&appointment, &vehicle, &client));

        Ok(self.assemble(
            appointment,
            &vehicle,
            client,
            Some(TechnicianSummary {
                id: technician.id,
                full_name: technician.full_name,
            }),
        ))
    }

    /// Staff path for walk-ins and shop-initiated work. No slot catalog
    /// applies; the technician may be named or auto-assigned. Admin-authored,
    /// so no created notification goes out.
    pub async fn create_unplanned_appointment(
        &self,
        request: CreateUnplannedAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentResponse, AppointmentError> {
        if request.appointment_type != AppointmentType::Unplanned {
            return Err(AppointmentError::InvalidSlot(format!(
                "{} appointments cannot be created through the unplanned path",
                request.appointment_type
            )));
        }

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::VehicleNotFound)?;

        if mobility::is_restricted(&vehicle.license_plate, request.appointment_date) {
            return Err(AppointmentError::LicensePlateRestricted(
                vehicle.license_plate.clone(),
            ));
        }

        self.check_working_day(request.appointment_date, request.start_time)?;

        let end_time =
            request.start_time + ScheduleCatalog::duration_for(AppointmentType::Unplanned);

        let technician = match request.technician_id {
            Some(technician_id) => {
                self.assigner
                    .assign_manual(
                        technician_id,
                        request.appointment_date,
                        request.start_time,
                        end_time,
                        auth_token,
                    )
                    .await?
            }
            None => {
                self.assigner
                    .assign(request.appointment_date, request.start_time, end_time, auth_token)
                    .await?
            }
        };

        let appointment = self
            .store
            .insert(
                json!({
                    "vehicle_id": request.vehicle_id,
                    "appointment_type": AppointmentType::Unplanned,
                    "appointment_date": request.appointment_date,
                    "start_time": request.start_time,
                    "end_time": end_time,
                    "technician_id": technician.id,
                    "status": AppointmentStatus::Scheduled,
                    "current_mileage": request.current_mileage,
                    "admin_notes": request.admin_notes,
                }),
                auth_token,
            )
            .await?;

        info!(
            "Created unplanned appointment {} for vehicle {} with technician {}",
            appointment.id, vehicle.id, technician.id
        );

        let client = self.fetch_client_summary(vehicle.client_id, auth_token).await;
        Ok(self.assemble(
            appointment,
            &vehicle,
            client,
            Some(TechnicianSummary {
                id: technician.id,
                full_name: technician.full_name,
            }),
        ))
    }

    /// Cancellation is not idempotent: cancelling an already-cancelled
    /// appointment fails so a duplicate request is visible to the caller.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentResponse, AppointmentError> {
        let appointment = self
            .store
            .find_by_id(appointment_id, auth_token)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.status == AppointmentStatus::Cancelled {
            return Err(AppointmentError::AlreadyCancelled);
        }

        let cancelled = self
            .store
            .update(
                appointment_id,
                json!({
                    "status": AppointmentStatus::Cancelled,
                    "cancellation_reason": request.reason,
                    "updated_at": Utc::now(),
                }),
                auth_token,
            )
            .await?;

        info!("Cancelled appointment {}: {}", appointment_id, request.reason);

        let (vehicle, client) = self.context_for(&cancelled, auth_token).await;

        if request.notify_client {
            if let Some(vehicle) = &vehicle {
                self.notifications
                    .notify_cancelled(Self::notice(&cancelled, vehicle, &client), request.reason);
            }
        }

        let technician = self.fetch_technician_summary(cancelled.technician_id, auth_token).await;
        self.assemble_with_context(cancelled, vehicle, client, technician)
    }

    /// Move an appointment to a different technician, keeping its slot.
    pub async fn update_technician(
        &self,
        appointment_id: Uuid,
        request: UpdateTechnicianRequest,
        auth_token: &str,
    ) -> Result<AppointmentResponse, AppointmentError> {
        let appointment = self
            .store
            .find_by_id(appointment_id, auth_token)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let technician = self
            .assigner
            .assign_manual(
                request.technician_id,
                appointment.appointment_date,
                appointment.start_time,
                appointment.end_time,
                auth_token,
            )
            .await?;

        let updated = self
            .store
            .update(
                appointment_id,
                json!({
                    "technician_id": technician.id,
                    "updated_at": Utc::now(),
                }),
                auth_token,
            )
            .await?;

        info!(
            "Reassigned appointment {} to technician {}",
            appointment_id, technician.id
        );

        let (vehicle, client) = self.context_for(&updated, auth_token).await;

        if request.notify_client {
            if let Some(vehicle) = &vehicle {
                self.notifications
                    .notify_updated(Self::notice(&updated, vehicle, &client));
            }
        }

        self.assemble_with_context(
            updated,
            vehicle,
            client,
            Some(TechnicianSummary {
                id: technician.id,
                full_name: technician.full_name,
            }),
        )
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentResponse, AppointmentError> {
        let appointment = self
            .store
            .find_by_id(appointment_id, auth_token)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let (vehicle, client) = self.context_for(&appointment, auth_token).await;
        let technician = self
            .fetch_technician_summary(appointment.technician_id, auth_token)
            .await;
        self.assemble_with_context(appointment, vehicle, client, technician)
    }

    pub async fn get_vehicle_appointments(
        &self,
        vehicle_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AppointmentResponse>, AppointmentError> {
        let appointments = self.store.find_by_vehicle(vehicle_id, auth_token).await?;
        self.assemble_list(appointments, auth_token).await
    }

    /// A client's history across all their vehicles.
    pub async fn get_client_appointments(
        &self,
        client_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AppointmentResponse>, AppointmentError> {
        let vehicles = self
            .vehicles
            .find_by_client(client_id, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let vehicle_ids: Vec<Uuid> = vehicles.iter().map(|v| v.id).collect();
        let appointments = self
            .store
            .find_by_vehicle_ids(&vehicle_ids, auth_token)
            .await?;
        self.assemble_list(appointments, auth_token).await
    }

    /// The workshop's day sheet, ordered by start time.
    pub async fn get_appointments_for_date(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AppointmentResponse>, AppointmentError> {
        let appointments = self.store.find_for_date(date, auth_token).await?;
        self.assemble_list(appointments, auth_token).await
    }

    fn check_working_day(
        &self,
        date: NaiveDate,
        start: chrono::NaiveTime,
    ) -> Result<(), AppointmentError> {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Err(AppointmentError::OutsideBusinessHours(format!(
                "the workshop is closed on weekends ({})",
                date
            )));
        }
        if !ScheduleCatalog::is_within_working_hours(start) {
            return Err(AppointmentError::OutsideBusinessHours(format!(
                "{} is outside working hours or falls in the lunch break",
                start.format("%H:%M")
            )));
        }
        Ok(())
    }

    fn notice(appointment: &Appointment, vehicle: &Vehicle, client: &ClientSummary) -> AppointmentNotice {
        AppointmentNotice {
            appointment_id: appointment.id,
            client_email: client.email.clone(),
            appointment_type: appointment.appointment_type.to_string(),
            appointment_date: appointment.appointment_date,
            start_time: appointment.start_time,
            license_plate: vehicle.license_plate.clone(),
        }
    }

    /// Client rows live outside this cell's tables; a missing or unreadable
    /// row degrades to an id-only summary rather than failing the request.
    async fn fetch_client_summary(&self, client_id: Uuid, auth_token: &str) -> ClientSummary {
        let path = format!(
            "/rest/v1/clients?id=eq.{}&select=id,full_name,email",
            client_id
        );
        let result: Result<Vec<ClientSummary>, _> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await;

        match result {
            Ok(rows) => rows.into_iter().next().unwrap_or(ClientSummary {
                id: client_id,
                full_name: None,
                email: None,
            }),
            Err(e) => {
                warn!("Failed to fetch client {}: {}", client_id, e);
                ClientSummary {
                    id: client_id,
                    full_name: None,
                    email: None,
                }
            }
        }
    }

    async fn fetch_technician_summary(
        &self,
        technician_id: Option<Uuid>,
        auth_token: &str,
    ) -> Option<TechnicianSummary> {
        let technician_id = technician_id?;
        match self.technicians.find_by_id(technician_id, auth_token).await {
            Ok(Some(technician)) => Some(TechnicianSummary {
                id: technician.id,
                full_name: technician.full_name,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to fetch technician {}: {}", technician_id, e);
                None
            }
        }
    }

    async fn context_for(
        &self,
        appointment: &Appointment,
        auth_token: &str,
    ) -> (Option<Vehicle>, ClientSummary) {
        let vehicle = match self.vehicles.find_by_id(appointment.vehicle_id, auth_token).await {
            Ok(vehicle) => vehicle,
            Err(e) => {
                warn!("Failed to fetch vehicle {}: {}", appointment.vehicle_id, e);
                None
            }
        };

        let client = match &vehicle {
            Some(vehicle) => self.fetch_client_summary(vehicle.client_id, auth_token).await,
            None => ClientSummary {
                id: Uuid::nil(),
                full_name: None,
                email: None,
            },
        };

        (vehicle, client)
    }

    fn assemble(
        &self,
        appointment: Appointment,
        vehicle: &Vehicle,
        client: ClientSummary,
        technician: Option<TechnicianSummary>,
    ) -> AppointmentResponse {
        AppointmentResponse {
            id: appointment.id,
            appointment_type: appointment.appointment_type,
            status: appointment.status,
            appointment_date: appointment.appointment_date,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            vehicle: VehicleSummary {
                id: vehicle.id,
                brand: vehicle.brand.clone(),
                license_plate: vehicle.license_plate.clone(),
                client_id: vehicle.client_id,
            },
            client,
            technician,
            client_notes: appointment.client_notes,
            admin_notes: appointment.admin_notes,
            cancellation_reason: appointment.cancellation_reason,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }

    fn assemble_with_context(
        &self,
        appointment: Appointment,
        vehicle: Option<Vehicle>,
        client: ClientSummary,
        technician: Option<TechnicianSummary>,
    ) -> Result<AppointmentResponse, AppointmentError> {
        let vehicle = vehicle.ok_or(AppointmentError::VehicleNotFound)?;
        Ok(self.assemble(appointment, &vehicle, client, technician))
    }

    async fn assemble_list(
        &self,
        appointments: Vec<Appointment>,
        auth_token: &str,
    ) -> Result<Vec<AppointmentResponse>, AppointmentError> {
        let mut vehicles: HashMap<Uuid, Vehicle> = HashMap::new();
        let mut clients: HashMap<Uuid, ClientSummary> = HashMap::new();
        let mut technicians: HashMap<Uuid, Option<TechnicianSummary>> = HashMap::new();
        let mut responses = Vec::with_capacity(appointments.len());

        for appointment in appointments {
            if !vehicles.contains_key(&appointment.vehicle_id) {
                let vehicle = self
                    .vehicles
                    .find_by_id(appointment.vehicle_id, auth_token)
                    .await
                    .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
                    .ok_or(AppointmentError::VehicleNotFound)?;
                vehicles.insert(appointment.vehicle_id, vehicle);
            }
            let vehicle = &vehicles[&appointment.vehicle_id];

            if !clients.contains_key(&vehicle.client_id) {
                let client = self.fetch_client_summary(vehicle.client_id, auth_token).await;
                clients.insert(vehicle.client_id, client);
            }
            let client = clients[&vehicle.client_id].clone();

            let technician = match appointment.technician_id {
                Some(technician_id) => {
                    if !technicians.contains_key(&technician_id) {
                        let summary = self
                            .fetch_technician_summary(Some(technician_id), auth_token)
                            .await;
                        technicians.insert(technician_id, summary);
                    }
                    technicians[&technician_id].clone()
                }
                None => None,
            };

            let vehicle = vehicle.clone();
            responses.push(self.assemble(appointment, &vehicle, client, technician));
        }

        Ok(responses)
    }
}
