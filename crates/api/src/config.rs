use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Push gateway used when `PUSH_GATEWAY_URL` is unset.
pub const DEFAULT_PUSH_GATEWAY_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long background services get to finish after the server stops.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Directory holding `<lang>.json` translation catalogs.
    pub locales_dir: PathBuf,
    pub default_locale: String,
    /// `None` disables push delivery.
    pub push_gateway_url: Option<String>,
    pub reminder_interval_secs: u64,
    pub reminder_window_mins: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                                  |
    /// |--------------------------|------------------------------------------|
    /// | `HOST`                   | `0.0.0.0`                                |
    /// | `PORT`                   | `3000`                                   |
    /// | `CORS_ORIGINS`           | `http://localhost:8081`                  |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                                     |
    /// | `LOCALES_DIR`            | `locales`                                |
    /// | `DEFAULT_LOCALE`         | `en`                                     |
    /// | `PUSH_GATEWAY_URL`       | `https://exp.host/--/api/v2/push/send`   |
    /// | `REMINDER_INTERVAL_SECS` | `60`                                     |
    /// | `REMINDER_WINDOW_MINS`   | `30`                                     |
    ///
    /// An empty `PUSH_GATEWAY_URL` disables push delivery. See
    /// [`JwtConfig::from_env`] for the JWT variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8081".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let locales_dir =
            PathBuf::from(std::env::var("LOCALES_DIR").unwrap_or_else(|_| "locales".into()));
        let default_locale = std::env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "en".into());

        let push_gateway_url = match std::env::var("PUSH_GATEWAY_URL") {
            Ok(url) if url.trim().is_empty() => None,
            Ok(url) => Some(url.trim().to_string()),
            Err(_) => Some(DEFAULT_PUSH_GATEWAY_URL.to_string()),
        };

        let reminder_interval_secs: u64 = std::env::var("REMINDER_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REMINDER_INTERVAL_SECS must be a valid u64");

        let reminder_window_mins: i64 = std::env::var("REMINDER_WINDOW_MINS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REMINDER_WINDOW_MINS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            locales_dir,
            default_locale,
            push_gateway_url,
            reminder_interval_secs,
            reminder_window_mins,
        }
    }
}
