use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_FACILITY_NAME: &str = "Municipal Jail";
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;
const DEFAULT_CREDENTIAL_VERSION: &str = "1.0";
const MAX_OFFSET_MINUTES: i32 = 23 * 60 + 59;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub facility: FacilityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let facility_name =
            env::var("FACILITY_NAME").unwrap_or_else(|_| DEFAULT_FACILITY_NAME.to_string());
        if facility_name.trim().is_empty() {
            return Err(ConfigError::EmptyFacilityName);
        }

        let utc_offset_minutes = match env::var("FACILITY_UTC_OFFSET_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|minutes| minutes.abs() <= MAX_OFFSET_MINUTES)
                .ok_or_else(|| ConfigError::InvalidUtcOffset { value: raw.clone() })?,
            Err(_) => DEFAULT_UTC_OFFSET_MINUTES,
        };

        let credential_version = env::var("CREDENTIAL_VERSION")
            .unwrap_or_else(|_| DEFAULT_CREDENTIAL_VERSION.to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            facility: FacilityConfig {
                name: facility_name.trim().to_string(),
                utc_offset_minutes,
                credential_version,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Facility identity stamped into credentials, and the local clock that
/// visit dates and times are expressed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityConfig {
    pub name: String,
    pub utc_offset_minutes: i32,
    pub credential_version: String,
}

impl FacilityConfig {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Wall-clock time at the facility for an instant.
    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset()).naive_local()
    }

    /// Instant for a facility wall-clock reading.
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let offset_seconds = i64::from(self.offset().local_minus_utc());
        (local - chrono::Duration::seconds(offset_seconds)).and_utc()
    }
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_FACILITY_NAME.to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            credential_version: DEFAULT_CREDENTIAL_VERSION.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUtcOffset { value: String },
    EmptyFacilityName,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUtcOffset { value } => write!(
                f,
                "FACILITY_UTC_OFFSET_MINUTES must be whole minutes within +/-1439 (found '{value}')"
            ),
            ConfigError::EmptyFacilityName => write!(f, "FACILITY_NAME must not be blank"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidUtcOffset { .. }
            | ConfigError::EmptyFacilityName => None,
        }
    }
}
