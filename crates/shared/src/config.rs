//! Application configuration management.

use chrono_tz::Tz;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Identity-provider token configuration.
    pub identity: IdentityConfig,
    /// Leave policy configuration.
    #[serde(default)]
    pub leave: LeavePolicyConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Identity-provider token configuration.
///
/// Tokens are issued by an external provider and only verified here.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Shared HS256 secret the provider signs tokens with.
    pub jwt_secret: String,
    /// Expected `iss` claim, if the provider sets one.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Expected `aud` claim, if the provider sets one.
    #[serde(default)]
    pub audience: Option<String>,
    /// Clock skew tolerated on `exp`.
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

fn default_leeway_secs() -> u64 {
    30
}

/// Which pending requests full approvers see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalVisibility {
    /// Only requests from the approver's own organization.
    #[default]
    Organization,
    /// Requests from every organization.
    Global,
}

/// Leave policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LeavePolicyConfig {
    /// IANA timezone used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Number of days from January 1st during which settlement may run
    /// without being forced.
    #[serde(default = "default_settlement_window_days")]
    pub settlement_window_days: u32,
    /// Casual allotment used when an organization has no settings row.
    #[serde(default = "default_allotment")]
    pub default_casual_leaves: u32,
    /// Medical allotment used when an organization has no settings row.
    #[serde(default = "default_allotment")]
    pub default_medical_leaves: u32,
    /// Approval queue visibility for full approvers.
    #[serde(default)]
    pub approval_scope: ApprovalVisibility,
}

impl Default for LeavePolicyConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            settlement_window_days: default_settlement_window_days(),
            default_casual_leaves: default_allotment(),
            default_medical_leaves: default_allotment(),
            approval_scope: ApprovalVisibility::default(),
        }
    }
}

impl LeavePolicyConfig {
    /// Parses the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a known IANA timezone.
    pub fn tz(&self) -> Result<Tz, config::ConfigError> {
        self.timezone.parse::<Tz>().map_err(|e| {
            config::ConfigError::Message(format!("invalid leave.timezone '{}': {e}", self.timezone))
        })
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_settlement_window_days() -> u32 {
    7
}

fn default_allotment() -> u32 {
    12
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEAVEDESK").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.leave.tz()?;
        Ok(app)
    }
}
