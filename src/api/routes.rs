//! API Routes
//!
//! Configures the Axum router with the booking and read-through endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cached_list_handler, cached_path_handler, clear_step_handler, close_handler,
    get_step_handler, health_handler, invalidate_handler, jump_handler, next_handler,
    previous_handler, reset_handler, save_step_handler, session_handler, stats_handler,
    submit_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Booking wizard
        .route(
            "/sessions/:id",
            get(session_handler).delete(reset_handler),
        )
        .route("/sessions/:id/close", post(close_handler))
        .route(
            "/sessions/:id/steps/:step",
            get(get_step_handler)
                .patch(save_step_handler)
                .delete(clear_step_handler),
        )
        .route("/sessions/:id/next", post(next_handler))
        .route("/sessions/:id/previous", post(previous_handler))
        .route("/sessions/:id/jump/:step", post(jump_handler))
        .route("/sessions/:id/submit", post(submit_handler))
        // Read-through cache
        .route("/api/:namespace", get(cached_list_handler))
        .route("/api/:namespace/*path", get(cached_path_handler))
        .route("/cache/:namespace/invalidate", post(invalidate_handler))
        // Service
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
