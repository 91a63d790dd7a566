//! Server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Default request body limit for uploads: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Server port to listen on.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// CORS allowed origins (comma-separated or "*" for all).
    pub cors_origin: String,
    /// Secret for signing access tokens.
    pub access_token_secret: String,
    /// Secret for signing refresh tokens.
    pub refresh_token_secret: String,
    /// Access token lifetime in minutes.
    pub access_token_expiry_minutes: i64,
    /// Refresh token lifetime in days.
    pub refresh_token_expiry_days: i64,
    /// Mark auth cookies `Secure`.
    pub secure_cookies: bool,
    /// Maximum request body size for multipart uploads.
    pub max_upload_bytes: usize,
    /// Directory for spooled uploads; OS temp dir when unset.
    pub upload_tmp_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `ACCESS_TOKEN_SECRET`: Access token signing secret
    /// - `REFRESH_TOKEN_SECRET`: Refresh token signing secret
    ///
    /// Optional:
    /// - `PORT`: Server port (default: 8000)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    /// - `CORS_ORIGIN`: Allowed CORS origins (default: "*")
    /// - `ACCESS_TOKEN_EXPIRY_MINUTES`: default 1440
    /// - `REFRESH_TOKEN_EXPIRY_DAYS`: default 10
    /// - `APP_ENV`: "production" enables secure cookies
    /// - `MAX_UPLOAD_BYTES`: default 100 MiB
    /// - `UPLOAD_TMP_DIR`: spool directory for uploads
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_token_secret = required("ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret = required("REFRESH_TOKEN_SECRET")?;

        let port = parsed("PORT", 8000)?;
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let cors_origin = env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string());

        let access_token_expiry_minutes = parsed("ACCESS_TOKEN_EXPIRY_MINUTES", 1440)?;
        let refresh_token_expiry_days = parsed("REFRESH_TOKEN_EXPIRY_DAYS", 10)?;
        if access_token_expiry_minutes <= 0 || refresh_token_expiry_days <= 0 {
            return Err(ConfigError::InvalidValue {
                name: "TOKEN_EXPIRY".to_string(),
                reason: "token lifetimes must be positive".to_string(),
            });
        }

        let secure_cookies = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let max_upload_bytes = parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let upload_tmp_dir = env::var("UPLOAD_TMP_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            port,
            log_level,
            cors_origin,
            access_token_secret,
            refresh_token_secret,
            access_token_expiry_minutes,
            refresh_token_expiry_days,
            secure_cookies,
            max_upload_bytes,
            upload_tmp_dir,
        })
    }

    /// Get the socket address for the server.
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("cors_origin", &self.cors_origin)
            .field("access_token_expiry_minutes", &self.access_token_expiry_minutes)
            .field("refresh_token_expiry_days", &self.refresh_token_expiry_days)
            .field("secure_cookies", &self.secure_cookies)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("upload_tmp_dir", &self.upload_tmp_dir)
            .finish_non_exhaustive()
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("could not parse {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid environment variable value.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
