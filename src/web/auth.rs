//! Session handling: JWT in the `auth_token` cookie or a bearer header,
//! resolved to the stored user on every request.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::core::config::AuthSettings;
use crate::core::shared::models::User;
use crate::core::shared::schema::users;
use crate::core::shared::state::AppState;

pub const AUTH_COOKIE: &str = "auth_token";
pub const DEFAULT_TOKEN_HOURS: i64 = 24 * 14;

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|auth| {
            let (scheme, token) = auth.split_once(' ')?;
            scheme
                .eq_ignore_ascii_case("bearer")
                .then(|| token.trim().to_string())
        })
        .filter(|token| !token.is_empty())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub login_url: String,
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self {
            jwt_secret: settings.jwt_secret.clone(),
            jwt_expiry_hours: DEFAULT_TOKEN_HOURS,
            login_url: settings.login_url.clone(),
            cookie_secure: settings.cookie_secure,
        }
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("login_url", &self.login_url)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

/// Signs a session token for `user_id`.
pub fn issue_token(config: &AuthConfig, user_id: Uuid) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::hours(config.jwt_expiry_hours)).timestamp(),
        iat: now.timestamp(),
    };
    encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn decode_token(config: &AuthConfig, token: &str) -> Option<Claims> {
    decode::<Claims>(token, &config.decoding_key(), &Validation::default())
        .ok()
        .map(|data| data.claims)
}

/// Helper to create the session cookie
pub fn create_auth_cookie(config: &AuthConfig, token: &str) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token.to_string()))
        .path("/")
        .secure(config.cookie_secure)
        .http_only(true)
        .same_site(tower_cookies::cookie::SameSite::Lax)
        .max_age(tower_cookies::cookie::time::Duration::hours(config.jwt_expiry_hours))
        .build()
}

pub fn clear_auth_cookie(cookies: &Cookies) {
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build());
}

/// `login_url?next=<path>`, keeping slashes readable.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let next = urlencoding::encode(next).replace("%2F", "/");
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{login_url}{separator}next={next}")
}

#[derive(Debug)]
pub enum AuthRejection {
    /// No valid session: send the browser to the login page.
    Login(String),
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login(location) => Redirect::to(&location).into_response(),
            Self::Unavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Service unavailable").into_response()
            }
        }
    }
}

async fn session_token(parts: &mut Parts) -> Option<String> {
    if let Some(token) = extract_bearer_token(&parts.headers) {
        return Some(token);
    }
    let cookies = Cookies::from_request_parts(parts, &()).await.ok()?;
    cookies.get(AUTH_COOKIE).map(|c| c.value().to_string())
}

/// Active user behind the request's session token, if any.
async fn load_session_user(parts: &mut Parts, state: &AppState) -> Result<Option<User>, AuthRejection> {
    let Some(token) = session_token(parts).await else {
        return Ok(None);
    };
    let Some(user_id) = decode_token(&state.auth, &token).and_then(|c| Uuid::parse_str(&c.sub).ok())
    else {
        tracing::debug!("Rejected invalid session token");
        return Ok(None);
    };

    let pool = state.conn.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| {
            tracing::error!("Failed to get database connection: {e}");
            AuthRejection::Unavailable
        })?;
        users::table
            .find(user_id)
            .filter(users::is_active.eq(true))
            .select(User::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| {
                tracing::error!("Failed to load session user {user_id}: {e}");
                AuthRejection::Unavailable
            })
    })
    .await
    .map_err(|e| {
        tracing::error!("Session lookup task failed: {e}");
        AuthRejection::Unavailable
    })?
}

/// Authenticated user extractor
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);
        match load_session_user(parts, &state).await? {
            Some(user) => Ok(Self { user }),
            None => {
                let next = parts.uri.path().to_string();
                Err(AuthRejection::Login(login_redirect(
                    &state.auth.login_url,
                    &next,
                )))
            }
        }
    }
}

/// Optional authenticated user (doesn't fail if not authenticated)
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);
        Ok(Self(load_session_user(parts, &state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            jwt_expiry_hours: 1,
            login_url: "/accounts/login/".into(),
            cookie_secure: false,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let config = config();
        let user_id = Uuid::new_v4();
        let token = issue_token(&config, user_id).unwrap();
        let claims = decode_token(&config, &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let mut other = config();
        other.jwt_secret = "another-secret".into();
        let token = issue_token(&other, Uuid::new_v4()).unwrap();
        assert!(decode_token(&config(), &token).is_none());
        assert!(decode_token(&config(), "garbage").is_none());
    }

    #[test]
    fn test_bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_login_redirect() {
        assert_eq!(
            login_redirect("/accounts/login/", "/"),
            "/accounts/login/?next=/"
        );
        assert_eq!(
            login_redirect("/login?lang=fr", "/planning/"),
            "/login?lang=fr&next=/planning/"
        );
    }

    #[test]
    fn test_auth_cookie_flags() {
        let cookie = create_auth_cookie(&config(), "tok");
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("test-secret"));
    }
}
