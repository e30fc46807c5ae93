use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;

pub const DEFAULT_TIME_ZONE: &str = "Europe/Paris";
pub const DEFAULT_LOGIN_URL: &str = "/accounts/login/";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    /// Zone used to interpret wall-clock input and to lay out the planner.
    pub time_zone: Tz,
    pub auth: AuthSettings,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub login_url: String,
    pub cookie_secure: bool,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a local `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, which keeps
    /// parsing testable without touching process-wide state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL not set"))?;
        let jwt_secret = get("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET not set"))?;

        let host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match get("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid SERVER_PORT: {raw}"))?,
            None => 8080,
        };
        let base_url = get("BASE_URL").unwrap_or_else(|| format!("http://{host}:{port}"));

        let time_zone_name = get("TIME_ZONE").unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string());
        let time_zone: Tz = time_zone_name
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid TIME_ZONE {time_zone_name}: {e}"))?;

        let cookie_secure = get("SESSION_COOKIE_SECURE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(AppConfig {
            server: ServerConfig {
                host,
                port,
                base_url,
            },
            database_url,
            time_zone,
            auth: AuthSettings {
                jwt_secret,
                login_url: get("LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
                cookie_secure,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/kitlast"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.time_zone, chrono_tz::Europe::Paris);
        assert_eq!(config.auth.login_url, DEFAULT_LOGIN_URL);
        assert!(!config.auth.cookie_secure);
    }

    #[test]
    fn test_missing_database_url_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "secret")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = [
            ("DATABASE_URL", "postgres://localhost/kitlast"),
            ("JWT_SECRET", "secret"),
        ];

        let mut with_port = base.to_vec();
        with_port.push(("SERVER_PORT", "eighty"));
        assert!(AppConfig::from_lookup(lookup_from(&with_port)).is_err());

        let mut with_zone = base.to_vec();
        with_zone.push(("TIME_ZONE", "Mars/Olympus"));
        assert!(AppConfig::from_lookup(lookup_from(&with_zone)).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/kitlast"),
            ("JWT_SECRET", "secret"),
            ("SERVER_PORT", "9000"),
            ("TIME_ZONE", "America/Montreal"),
            ("SESSION_COOKIE_SECURE", "true"),
            ("LOGIN_URL", "/login"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.time_zone, chrono_tz::America::Montreal);
        assert!(config.auth.cookie_secure);
        assert_eq!(config.auth.login_url, "/login");
    }
}
