pub mod auth;
pub mod auth_handlers;

use axum::{
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use auth::{AuthenticatedUser, OptionalAuth};

/// Create the main web router
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let session_routes = Router::new().route(
        ApiUrls::LOGOUT,
        get(auth_handlers::logout_page).post(auth_handlers::logout),
    );

    Router::new()
        .merge(crate::dashboards::configure_dashboard_routes())
        .merge(crate::workshops::configure_workshop_routes())
        .merge(session_routes)
        .route(ApiUrls::HEALTH, get(health_check))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
