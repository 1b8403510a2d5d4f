use std::{env, time::Duration};

use log::*;
use panen_common::{helpers::parse_boolean_flag, Secret};
use tripay_tools::TripayConfig;

use crate::errors::ServerError;

const DEFAULT_PANEN_HOST: &str = "127.0.0.1";
const DEFAULT_PANEN_PORT: u16 = 8480;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SETTLEMENT_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Upper bound on how long a request waits for a database connection.
    pub db_acquire_timeout: Duration,
    /// How often the settlement worker sweeps for expired campaigns.
    pub settlement_interval: Duration,
    /// If true, outstanding migrations are applied at startup. Otherwise the server refuses to start until an
    /// operator runs them.
    pub auto_migrate: bool,
    /// If true, the startup capability check is skipped. **DANGER**
    pub skip_preflight: bool,
    pub auth: AuthConfig,
    pub notifications: NotificationConfig,
    pub tripay: TripayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PANEN_HOST.to_string(),
            port: DEFAULT_PANEN_PORT,
            database_url: String::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            db_acquire_timeout: DEFAULT_DB_ACQUIRE_TIMEOUT,
            settlement_interval: DEFAULT_SETTLEMENT_INTERVAL,
            auto_migrate: true,
            skip_preflight: false,
            auth: AuthConfig::default(),
            notifications: NotificationConfig::default(),
            tripay: TripayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PANEN_HOST").ok().unwrap_or_else(|| DEFAULT_PANEN_HOST.into());
        let port = env::var("PANEN_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PANEN_PORT. {e} Using the default, {DEFAULT_PANEN_PORT}, \
                         instead."
                    );
                    DEFAULT_PANEN_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PANEN_PORT);
        let database_url = env::var("PANEN_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PANEN_DATABASE_URL is not set. Please set it to the URL for the PanenHub database.");
            String::default()
        });
        let db_max_connections = parse_env("PANEN_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let db_acquire_timeout =
            Duration::from_secs(parse_env("PANEN_DB_ACQUIRE_TIMEOUT", DEFAULT_DB_ACQUIRE_TIMEOUT.as_secs()));
        let settlement_interval =
            Duration::from_secs(parse_env("PANEN_SETTLEMENT_INTERVAL", DEFAULT_SETTLEMENT_INTERVAL.as_secs()));
        let auto_migrate = parse_boolean_flag(env::var("PANEN_AUTO_MIGRATE").ok(), true);
        let skip_preflight = parse_boolean_flag(env::var("PANEN_SKIP_PREFLIGHT").ok(), false);
        if skip_preflight {
            warn!("🚨️ PANEN_SKIP_PREFLIGHT is set. The database capability check will not run.");
        }
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            error!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Every \
                 authenticated request will be rejected."
            );
            AuthConfig::default()
        });
        let notifications = NotificationConfig::from_env_or_default();
        let tripay = TripayConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            db_acquire_timeout,
            settlement_interval,
            auto_migrate,
            skip_preflight,
            auth,
            notifications,
            tripay,
        }
    }
}

/// Reads a numeric variable. Unset variables silently use `default`, invalid ones log a warning and use it too.
/// Zero is never a useful value for these settings, so it is treated as invalid.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + PartialEq + Default + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => match s.trim().parse::<T>() {
            Ok(v) if v != T::default() => v,
            Ok(_) => {
                warn!("🪛️ {name} cannot be zero. Using the default value of {default}.");
                default
            },
            Err(e) => {
                warn!("🪛️ Invalid configuration value for {name} ({s}). {e}. Using the default value of {default}.");
                default
            },
        },
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
/// Where bearer tokens are verified. Users sign in with the managed auth service, and every authenticated request is
/// checked against it.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Base URL of the auth service, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// The project's public API key, sent alongside the user's token.
    pub api_key: Secret<String>,
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let url = env::var("PANEN_AUTH_URL")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [PANEN_AUTH_URL]")))?
            .trim_end_matches('/')
            .to_string();
        if url.is_empty() {
            return Err(ServerError::ConfigurationError("PANEN_AUTH_URL is empty".into()));
        }
        let api_key = env::var("PANEN_AUTH_API_KEY")
            .map(Secret::new)
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [PANEN_AUTH_API_KEY]")))?;
        Ok(Self { url, api_key })
    }

    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && self.api_key.is_set()
    }
}

//---------------------------------------------  NotificationConfig  ---------------------------------------------------
/// The push-notification function. Notifications are switched off when no URL is configured.
#[derive(Clone, Debug, Default)]
pub struct NotificationConfig {
    pub url: Option<String>,
    pub api_key: Secret<String>,
}

impl NotificationConfig {
    pub fn from_env_or_default() -> Self {
        let url = env::var("PANEN_NOTIFICATION_URL").ok().filter(|s| !s.trim().is_empty());
        if url.is_none() {
            info!("🪛️ PANEN_NOTIFICATION_URL is not set. Push notifications are disabled.");
        }
        let api_key = Secret::new(env::var("PANEN_NOTIFICATION_KEY").unwrap_or_default());
        if url.is_some() && !api_key.is_set() {
            warn!("🪛️ PANEN_NOTIFICATION_KEY is not set. Notification requests will not be authenticated.");
        }
        Self { url, api_key }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }
}
