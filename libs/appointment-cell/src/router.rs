// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // Every appointment operation requires authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/unplanned", post(handlers::create_unplanned_appointment))
        .route("/availability", get(handlers::get_availability))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/technician", patch(handlers::update_technician))
        .route("/vehicles/{vehicle_id}", get(handlers::get_vehicle_appointments))
        .route("/clients/{client_id}", get(handlers::get_client_appointments))
        .route("/date/{date}", get(handlers::get_appointments_for_date))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
