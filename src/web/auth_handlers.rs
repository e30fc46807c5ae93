//! Logout. Sessions are issued elsewhere; this app only ends them.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::info;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

use super::auth::{clear_auth_cookie, OptionalAuth};

/// Handle logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    if let Some(user) = user {
        info!("User {} logging out", user.email);
    }

    clear_auth_cookie(&cookies);
    Redirect::to(&state.auth.login_url)
}

/// Logout only happens through a POST; a plain visit goes home.
pub async fn logout_page() -> impl IntoResponse {
    Redirect::to(ApiUrls::DASHBOARD)
}
