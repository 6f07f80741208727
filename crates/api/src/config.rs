use serde::Deserialize;
use shared::jwt::{JwtError, SigningAlgorithm, TokenVerifier};
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Access token verification
    pub jwt: JwtAuthConfig,
    /// Browsing-session tracking
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Allowed CORS origins; empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// RS256 (default) or HS256
    #[serde(default = "default_jwt_algorithm")]
    pub algorithm: String,

    /// RSA public key in PEM format, for RS256
    #[serde(default)]
    pub public_key: String,

    /// Shared secret, for HS256
    #[serde(default)]
    pub secret: String,

    /// Leeway in seconds for clock skew tolerance
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl JwtAuthConfig {
    /// Builds the token verifier for the configured algorithm.
    pub fn verifier(&self) -> Result<TokenVerifier, JwtError> {
        match self.algorithm.parse::<SigningAlgorithm>()? {
            SigningAlgorithm::Rs256 => TokenVerifier::rs256(&self.public_key, self.leeway_secs),
            SigningAlgorithm::Hs256 => Ok(TokenVerifier::hs256(&self.secret, self.leeway_secs)),
        }
    }
}

/// Where open sessions are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    /// Process-local map; sessions do not survive a restart.
    Memory,
    /// The `user_sessions` table.
    Database,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_session_max_age")]
    pub max_age_secs: i64,

    /// Adds the Secure attribute to the cookie.
    #[serde(default)]
    pub secure: bool,

    #[serde(default = "default_session_store")]
    pub store: SessionStoreKind,

    /// Path prefixes on which an authenticated request opens a session.
    #[serde(default = "default_tracked_prefixes")]
    pub tracked_path_prefixes: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_age_secs: default_session_max_age(),
            secure: false,
            store: default_session_store(),
            tracked_path_prefixes: default_tracked_prefixes(),
        }
    }
}

impl SessionConfig {
    pub fn is_tracked(&self, path: &str) -> bool {
        self.tracked_path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_jwt_algorithm() -> String {
    "RS256".to_string()
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_cookie_name() -> String {
    "session-id".to_string()
}
fn default_session_max_age() -> i64 {
    7 * 24 * 60 * 60
}
fn default_session_store() -> SessionStoreKind {
    SessionStoreKind::Memory
}
fn default_tracked_prefixes() -> Vec<String> {
    vec!["/dashboard".into(), "/admin".into(), "/api".into()]
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with FM__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("FM")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .with_list_parse_key("session.tracked_path_prefixes")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration from embedded defaults plus overrides, without
    /// touching the file system. Validation is skipped.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [jwt]
            algorithm = "HS256"
            secret = "test_secret_key_for_jwt_testing_12345"
            leeway_secs = 0

            [session]
            cookie_name = "session-id"
            max_age_secs = 604800
            secure = false
            store = "memory"
            tracked_path_prefixes = ["/dashboard", "/admin", "/api"]
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FM__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.session.max_age_secs <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "session.max_age_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
