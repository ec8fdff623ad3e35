//! Router setup and configuration.

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::api::handlers::{custom_id, element_types, health};
use crate::api::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    // Health and metrics routes
    let mut health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready));
    if state.config.observability.metrics_enabled {
        health_routes = health_routes.route(
            &state.config.observability.metrics_path,
            get(health::metrics),
        );
    }

    // Per-inventory configuration and generation
    let inventory_routes = Router::new()
        .route(
            "/{inventory_id}/custom-id",
            get(custom_id::get_configuration)
                .put(custom_id::save_configuration)
                .delete(custom_id::delete_configuration),
        )
        .route(
            "/{inventory_id}/custom-id/preview",
            post(custom_id::preview_for_inventory),
        )
        .route(
            "/{inventory_id}/custom-id/generate",
            post(custom_id::generate),
        )
        .route("/{inventory_id}/sequence", get(custom_id::sequence));

    // Versioned API
    let v1_routes = Router::new()
        .route("/element-types", get(element_types::list_element_types))
        .route("/custom-id/validate", post(custom_id::validate))
        .route("/custom-id/preview", post(custom_id::preview))
        .nest("/inventories", inventory_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(cors)
        .with_state(state)
}
