// libs/appointment-cell/tests/booking_test.rs
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, AppointmentType, CancelAppointmentRequest,
    CreateAppointmentRequest, CreateUnplannedAppointmentRequest, UpdateTechnicianRequest,
};
use appointment_cell::services::booking::AppointmentBookingService;
use shared_config::AppConfig;
use shared_utils::test_utils::MockSupabaseResponses;

const TOKEN: &str = "test-token";

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
        mail_service_url: String::new(),
        mail_service_api_key: String::new(),
    }
}

// 2025-01-06 is a Monday (restricted plate digits {1, 2}).
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

fn saturday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 11).unwrap()
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn oil_change_request(vehicle_id: Uuid, start: NaiveTime) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        vehicle_id,
        appointment_type: AppointmentType::OilChange,
        appointment_date: monday(),
        start_time: start,
        current_mileage: Some(12500),
        client_notes: None,
    }
}

async fn mock_vehicle(server: &MockServer, vehicle_id: Uuid, client_id: Uuid, brand: &str, plate: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/vehicles"))
        .and(query_param("id", format!("eq.{}", vehicle_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::vehicle_response(vehicle_id, client_id, brand, plate)
        ])))
        .mount(server)
        .await;
}

async fn mock_no_active_appointment(server: &MockServer, vehicle_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("vehicle_id", format!("eq.{}", vehicle_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

async fn mock_roster(server: &MockServer, technicians: &[(Uuid, &str)]) {
    let rows: Vec<serde_json::Value> = technicians
        .iter()
        .map(|(id, name)| MockSupabaseResponses::technician_response(*id, name))
        .collect();

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

async fn mock_technician_schedule(server: &MockServer, technician_id: Uuid, busy: bool) {
    let body = if busy {
        json!([MockSupabaseResponses::appointment_response(
            Uuid::new_v4(),
            Uuid::new_v4(),
            technician_id,
            "maintenance",
            "2025-01-06",
            "07:00:00",
            "09:00:00",
            "scheduled",
        )])
    } else {
        json!([])
    };

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("technician_id", format!("eq.{}", technician_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_insert(server: &MockServer, row: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row])))
        .mount(server)
        .await;
}

// ==============================================================================
// CREATE - VALIDATION PIPELINE
// ==============================================================================

#[tokio::test]
async fn rework_is_rejected_before_any_lookup() {
    let server = MockServer::start().await;
    let service = AppointmentBookingService::new(&test_config(&server));

    let mut request = oil_change_request(Uuid::new_v4(), t(7, 0));
    request.appointment_type = AppointmentType::Rework;

    let result = service.create_appointment(request, Uuid::new_v4(), TOKEN).await;

    assert_matches!(result, Err(AppointmentError::ReworkNotBookableOnline));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unplanned_type_is_rejected_on_client_path() {
    let server = MockServer::start().await;
    let service = AppointmentBookingService::new(&test_config(&server));

    let mut request = oil_change_request(Uuid::new_v4(), t(7, 0));
    request.appointment_type = AppointmentType::Unplanned;

    let result = service.create_appointment(request, Uuid::new_v4(), TOKEN).await;

    assert_matches!(result, Err(AppointmentError::InvalidSlot(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_vehicle_fails() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/vehicles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .create_appointment(oil_change_request(vehicle_id, t(7, 0)), Uuid::new_v4(), TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::VehicleNotFound));
}

#[tokio::test]
async fn vehicle_owned_by_someone_else_fails() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();
    let other_client = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, owner_id, "Yamaha", "ABC563").await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .create_appointment(oil_change_request(vehicle_id, t(7, 0)), other_client, TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::NotVehicleOwner));
}

#[tokio::test]
async fn restricted_plate_fails_on_matching_weekday() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();

    // Plate ends in 1; Monday restricts {1, 2}.
    mock_vehicle(&server, vehicle_id, client_id, "Yamaha", "ABC561").await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .create_appointment(oil_change_request(vehicle_id, t(7, 0)), client_id, TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::LicensePlateRestricted(plate)) => {
        assert_eq!(plate, "ABC561");
    });
}

#[tokio::test]
async fn warranty_type_requires_restricted_brand() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, client_id, "Yamaha", "ABC563").await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let mut request = oil_change_request(vehicle_id, t(7, 0));
    request.appointment_type = AppointmentType::AutecoWarranty;

    let result = service.create_appointment(request, client_id, TOKEN).await;

    assert_matches!(result, Err(AppointmentError::TypeNotAllowedForBrand { brand, .. }) => {
        assert_eq!(brand, "Yamaha");
    });
}

#[tokio::test]
async fn warranty_brand_check_is_case_insensitive() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let technician_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, client_id, "auteco", "ABC563").await;
    mock_no_active_appointment(&server, vehicle_id).await;
    mock_roster(&server, &[(technician_id, "Ana Rojas")]).await;
    mock_technician_schedule(&server, technician_id, false).await;
    mock_insert(
        &server,
        MockSupabaseResponses::appointment_response(
            Uuid::new_v4(),
            vehicle_id,
            technician_id,
            "manual_warranty_review",
            "2025-01-06",
            "07:00:00",
            "08:00:00",
            "scheduled",
        ),
    )
    .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let mut request = oil_change_request(vehicle_id, t(7, 0));
    request.appointment_type = AppointmentType::ManualWarrantyReview;

    let result = service.create_appointment(request, client_id, TOKEN).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn slot_outside_catalog_names_requested_time() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, client_id, "Yamaha", "ABC563").await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .create_appointment(oil_change_request(vehicle_id, t(13, 30)), client_id, TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidSlot(msg)) => {
        assert!(msg.contains("13:30"), "message should name the slot: {}", msg);
    });
}

#[tokio::test]
async fn weekend_booking_is_rejected() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, client_id, "Yamaha", "ABC563").await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let mut request = oil_change_request(vehicle_id, t(7, 0));
    request.appointment_date = saturday();

    let result = service.create_appointment(request, client_id, TOKEN).await;
    assert_matches!(result, Err(AppointmentError::OutsideBusinessHours(_)));
}

#[tokio::test]
async fn vehicle_with_active_appointment_cannot_book() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, client_id, "Yamaha", "ABC563").await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("vehicle_id", format!("eq.{}", vehicle_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                Uuid::new_v4(),
                vehicle_id,
                Uuid::new_v4(),
                "maintenance",
                "2025-01-08",
                "09:00:00",
                "11:00:00",
                "scheduled",
            )
        ])))
        .mount(&server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .create_appointment(oil_change_request(vehicle_id, t(7, 0)), client_id, TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::VehicleHasActiveAppointment));
}

// ==============================================================================
// CREATE - ASSIGNMENT AND PERSISTENCE
// ==============================================================================

#[tokio::test]
async fn booking_assigns_first_free_technician() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, client_id, "Yamaha", "ABC563").await;
    mock_no_active_appointment(&server, vehicle_id).await;
    mock_roster(&server, &[(first, "Ana Rojas"), (second, "Luis Mora")]).await;
    mock_technician_schedule(&server, first, false).await;
    mock_insert(
        &server,
        MockSupabaseResponses::appointment_response(
            Uuid::new_v4(),
            vehicle_id,
            first,
            "oil_change",
            "2025-01-06",
            "07:00:00",
            "08:00:00",
            "scheduled",
        ),
    )
    .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let response = service
        .create_appointment(oil_change_request(vehicle_id, t(7, 0)), client_id, TOKEN)
        .await
        .unwrap();

    assert_eq!(response.status, AppointmentStatus::Scheduled);
    assert_eq!(response.technician.unwrap().id, first);
    assert_eq!(response.end_time, t(8, 0));
}

#[tokio::test]
async fn booking_skips_busy_technician() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, client_id, "Yamaha", "ABC563").await;
    mock_no_active_appointment(&server, vehicle_id).await;
    mock_roster(&server, &[(first, "Ana Rojas"), (second, "Luis Mora")]).await;
    mock_technician_schedule(&server, first, true).await;
    mock_technician_schedule(&server, second, false).await;
    mock_insert(
        &server,
        MockSupabaseResponses::appointment_response(
            Uuid::new_v4(),
            vehicle_id,
            second,
            "oil_change",
            "2025-01-06",
            "07:00:00",
            "08:00:00",
            "scheduled",
        ),
    )
    .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let response = service
        .create_appointment(oil_change_request(vehicle_id, t(7, 0)), client_id, TOKEN)
        .await
        .unwrap();

    assert_eq!(response.technician.unwrap().id, second);
}

#[tokio::test]
async fn booking_fails_when_all_technicians_busy() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, client_id, "Yamaha", "ABC563").await;
    mock_no_active_appointment(&server, vehicle_id).await;
    mock_roster(&server, &[(first, "Ana Rojas"), (second, "Luis Mora")]).await;
    mock_technician_schedule(&server, first, true).await;
    mock_technician_schedule(&server, second, true).await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .create_appointment(oil_change_request(vehicle_id, t(7, 0)), client_id, TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::NoAvailableTechnician));
}

#[tokio::test]
async fn client_notes_are_joined() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let technician_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, client_id, "Yamaha", "ABC563").await;
    mock_no_active_appointment(&server, vehicle_id).await;
    mock_roster(&server, &[(technician_id, "Ana Rojas")]).await;
    mock_technician_schedule(&server, technician_id, false).await;
    mock_insert(
        &server,
        MockSupabaseResponses::appointment_response(
            Uuid::new_v4(),
            vehicle_id,
            technician_id,
            "oil_change",
            "2025-01-06",
            "07:00:00",
            "08:00:00",
            "scheduled",
        ),
    )
    .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let mut request = oil_change_request(vehicle_id, t(7, 0));
    request.client_notes = Some(vec!["rattling noise".to_string(), "front brake soft".to_string()]);

    service
        .create_appointment(request, client_id, TOKEN)
        .await
        .unwrap();

    let insert = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("an insert should have been issued");
    let body: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    assert_eq!(body["client_notes"], json!("rattling noise; front brake soft"));
}

// ==============================================================================
// UNPLANNED (STAFF) PATH
// ==============================================================================

fn unplanned_request(vehicle_id: Uuid, technician_id: Option<Uuid>) -> CreateUnplannedAppointmentRequest {
    CreateUnplannedAppointmentRequest {
        vehicle_id,
        appointment_type: AppointmentType::Unplanned,
        appointment_date: monday(),
        start_time: t(10, 30),
        current_mileage: Some(8000),
        technician_id,
        admin_notes: Some("walk-in, chain replacement".to_string()),
    }
}

#[tokio::test]
async fn unplanned_accepts_off_catalog_start_times() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let technician_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, Uuid::new_v4(), "Yamaha", "ABC563").await;
    mock_roster(&server, &[(technician_id, "Ana Rojas")]).await;
    mock_technician_schedule(&server, technician_id, false).await;
    mock_insert(
        &server,
        MockSupabaseResponses::appointment_response(
            Uuid::new_v4(),
            vehicle_id,
            technician_id,
            "unplanned",
            "2025-01-06",
            "10:30:00",
            "11:30:00",
            "scheduled",
        ),
    )
    .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let response = service
        .create_unplanned_appointment(unplanned_request(vehicle_id, None), TOKEN)
        .await
        .unwrap();

    // 10:30 is not in any catalog, but the staff path only enforces
    // working hours.
    assert_eq!(response.appointment_type, AppointmentType::Unplanned);
    assert_eq!(response.end_time, t(11, 30));
}

#[tokio::test]
async fn unplanned_path_only_accepts_unplanned_type() {
    let server = MockServer::start().await;
    let service = AppointmentBookingService::new(&test_config(&server));

    let mut request = unplanned_request(Uuid::new_v4(), None);
    request.appointment_type = AppointmentType::OilChange;

    let result = service.create_unplanned_appointment(request, TOKEN).await;

    assert_matches!(result, Err(AppointmentError::InvalidSlot(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unplanned_during_lunch_is_rejected() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, Uuid::new_v4(), "Yamaha", "ABC563").await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let mut request = unplanned_request(vehicle_id, None);
    request.start_time = t(12, 30);

    let result = service.create_unplanned_appointment(request, TOKEN).await;
    assert_matches!(result, Err(AppointmentError::OutsideBusinessHours(_)));
}

#[tokio::test]
async fn unplanned_after_closing_is_rejected() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, Uuid::new_v4(), "Yamaha", "ABC563").await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let mut request = unplanned_request(vehicle_id, None);
    request.start_time = t(18, 0);

    let result = service.create_unplanned_appointment(request, TOKEN).await;
    assert_matches!(result, Err(AppointmentError::OutsideBusinessHours(_)));
}

#[tokio::test]
async fn unplanned_with_named_busy_technician_fails() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();
    let technician_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, Uuid::new_v4(), "Yamaha", "ABC563").await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .and(query_param("id", format!("eq.{}", technician_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::technician_response(technician_id, "Ana Rojas")
        ])))
        .mount(&server)
        .await;
    mock_technician_schedule(&server, technician_id, true).await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .create_unplanned_appointment(unplanned_request(vehicle_id, Some(technician_id)), TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::TechnicianSlotOccupied));
}

#[tokio::test]
async fn unplanned_with_unknown_technician_fails() {
    let server = MockServer::start().await;
    let vehicle_id = Uuid::new_v4();

    mock_vehicle(&server, vehicle_id, Uuid::new_v4(), "Yamaha", "ABC563").await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .create_unplanned_appointment(unplanned_request(vehicle_id, Some(Uuid::new_v4())), TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::TechnicianNotFound));
}

// ==============================================================================
// CANCELLATION
// ==============================================================================

async fn mock_appointment_by_id(server: &MockServer, appointment_id: Uuid, row: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn cancel_unknown_appointment_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .cancel_appointment(
            Uuid::new_v4(),
            CancelAppointmentRequest {
                reason: "client called".to_string(),
                notify_client: false,
            },
            TOKEN,
        )
        .await;

    assert_matches!(result, Err(AppointmentError::NotFound));
}

#[tokio::test]
async fn cancel_is_not_idempotent() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let vehicle_id = Uuid::new_v4();

    mock_appointment_by_id(
        &server,
        appointment_id,
        MockSupabaseResponses::appointment_response(
            appointment_id,
            vehicle_id,
            Uuid::new_v4(),
            "oil_change",
            "2025-01-06",
            "07:00:00",
            "08:00:00",
            "cancelled",
        ),
    )
    .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .cancel_appointment(
            appointment_id,
            CancelAppointmentRequest {
                reason: "again".to_string(),
                notify_client: false,
            },
            TOKEN,
        )
        .await;

    assert_matches!(result, Err(AppointmentError::AlreadyCancelled));
}

#[tokio::test]
async fn cancelling_scheduled_appointment_succeeds() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let vehicle_id = Uuid::new_v4();
    let technician_id = Uuid::new_v4();

    mock_appointment_by_id(
        &server,
        appointment_id,
        MockSupabaseResponses::appointment_response(
            appointment_id,
            vehicle_id,
            technician_id,
            "oil_change",
            "2025-01-06",
            "07:00:00",
            "08:00:00",
            "scheduled",
        ),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                appointment_id,
                vehicle_id,
                technician_id,
                "oil_change",
                "2025-01-06",
                "07:00:00",
                "08:00:00",
                "cancelled",
            )
        ])))
        .mount(&server)
        .await;

    mock_vehicle(&server, vehicle_id, Uuid::new_v4(), "Yamaha", "ABC563").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .and(query_param("id", format!("eq.{}", technician_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::technician_response(technician_id, "Ana Rojas")
        ])))
        .mount(&server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let response = service
        .cancel_appointment(
            appointment_id,
            CancelAppointmentRequest {
                reason: "client called".to_string(),
                notify_client: false,
            },
            TOKEN,
        )
        .await
        .unwrap();

    assert_eq!(response.status, AppointmentStatus::Cancelled);
}

// ==============================================================================
// TECHNICIAN REASSIGNMENT
// ==============================================================================

#[tokio::test]
async fn reassignment_to_busy_technician_fails() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let new_technician = Uuid::new_v4();

    mock_appointment_by_id(
        &server,
        appointment_id,
        MockSupabaseResponses::appointment_response(
            appointment_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            "maintenance",
            "2025-01-06",
            "09:00:00",
            "11:00:00",
            "scheduled",
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .and(query_param("id", format!("eq.{}", new_technician)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::technician_response(new_technician, "Luis Mora")
        ])))
        .mount(&server)
        .await;
    mock_technician_schedule(&server, new_technician, true).await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let result = service
        .update_technician(
            appointment_id,
            UpdateTechnicianRequest {
                technician_id: new_technician,
                notify_client: false,
            },
            TOKEN,
        )
        .await;

    assert_matches!(result, Err(AppointmentError::TechnicianSlotOccupied));
}

#[tokio::test]
async fn reassignment_succeeds_when_technician_is_free() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let vehicle_id = Uuid::new_v4();
    let new_technician = Uuid::new_v4();

    mock_appointment_by_id(
        &server,
        appointment_id,
        MockSupabaseResponses::appointment_response(
            appointment_id,
            vehicle_id,
            Uuid::new_v4(),
            "maintenance",
            "2025-01-06",
            "09:00:00",
            "11:00:00",
            "scheduled",
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .and(query_param("id", format!("eq.{}", new_technician)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::technician_response(new_technician, "Luis Mora")
        ])))
        .mount(&server)
        .await;
    mock_technician_schedule(&server, new_technician, false).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                appointment_id,
                vehicle_id,
                new_technician,
                "maintenance",
                "2025-01-06",
                "09:00:00",
                "11:00:00",
                "scheduled",
            )
        ])))
        .mount(&server)
        .await;

    mock_vehicle(&server, vehicle_id, Uuid::new_v4(), "Yamaha", "ABC563").await;

    let service = AppointmentBookingService::new(&test_config(&server));
    let response = service
        .update_technician(
            appointment_id,
            UpdateTechnicianRequest {
                technician_id: new_technician,
                notify_client: false,
            },
            TOKEN,
        )
        .await
        .unwrap();

    assert_eq!(response.technician.unwrap().id, new_technician);
}
