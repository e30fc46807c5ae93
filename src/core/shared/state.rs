use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;
use crate::web::auth::AuthConfig;
use chrono_tz::Tz;

/// Shared application state handed to every handler behind an `Arc`.
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig) -> Self {
        let auth = AuthConfig::from_settings(&config.auth);
        Self { conn, config, auth }
    }

    pub fn time_zone(&self) -> Tz {
        self.config.time_zone
    }
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            config: self.config.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("conn", &"DbPool")
            .field("config", &self.config)
            .field("auth", &self.auth)
            .finish()
    }
}
