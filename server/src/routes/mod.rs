use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{events, guests, health_check, media, registrations};
use crate::state::AppState;

// Multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_routes(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let cors = create_cors_layer(&state.config.cors_allowed_origins);
    let security = create_security_headers_layer(state.config.production);

    let api = Router::new()
        .route("/media", post(media::upload))
        .route("/media/:id", get(media::download))
        .route("/events", get(events::list_upcoming).post(events::create))
        .route(
            "/events/:key",
            get(events::get_by_slug)
                .put(events::update)
                .delete(events::cancel),
        )
        .route(
            "/events/:key/registrations",
            get(registrations::list_for_event).post(registrations::submit),
        )
        .route("/events/:key/guests", get(guests::list_for_event))
        .route("/me/events", get(events::list_mine))
        .route("/me/registrations", get(registrations::list_mine))
        .route("/registrations/:id/status", put(registrations::set_status))
        .route("/guests/check-in", post(guests::check_in))
        .route("/guests/:id/status", put(guests::set_status));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(security)
        .layer(cors)
        .with_state(state)
}
