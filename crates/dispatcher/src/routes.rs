use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // LEAVE WORKFLOW
        // ========================================
        .route("/api/leave/state", get(handlers::leave::get_state))
        .route("/api/leave/drivers", get(handlers::leave::list_drivers))
        .route("/api/leave/range", post(handlers::leave::set_range))
        .route("/api/leave/capacity", get(handlers::leave::get_capacity))
        .route("/api/leave/submit", post(handlers::leave::submit))
        // Force override (3 working days from the conflicting date)
        .route(
            "/api/leave/force/confirm",
            post(handlers::leave::confirm_force),
        )
        .route(
            "/api/leave/force/cancel",
            post(handlers::leave::cancel_force),
        )
}
