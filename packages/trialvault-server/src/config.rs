use std::env;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Bind address (0.0.0.0 for LAN, 127.0.0.1 for localhost)
    pub bind_addr: String,
    /// PostgreSQL database URL
    pub database_url: String,
    /// CORS allowed origins (comma-separated in env var)
    pub cors_origins: Vec<String>,
    /// Row cap applied to stats and export fetches
    pub max_export_rows: i64,
    /// Enable coordinate resolution for sites
    pub enable_geocoding: bool,
    /// Base URL of the geocoding API
    pub geocode_base_url: String,
    /// Request timeout for geocoding calls
    pub geocode_timeout_seconds: u64,
    /// How long cached coordinates stay valid
    pub geocode_cache_ttl_seconds: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        // No default for the database URL - it names credentials
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let max_export_rows: i64 = env::var("MAX_EXPORT_ROWS")
            .unwrap_or_else(|_| "50000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("MAX_EXPORT_ROWS must be an integer".to_string()))?;
        if max_export_rows <= 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_EXPORT_ROWS must be positive".to_string(),
            ));
        }

        Ok(Self {
            port: env::var("TRIALVAULT_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            bind_addr: env::var("TRIALVAULT_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            database_url,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| {
                    vec![
                        "http://localhost:3000".to_string(),
                        "http://127.0.0.1:3000".to_string(),
                    ]
                }),
            max_export_rows,
            enable_geocoding: env::var("ENABLE_GEOCODING")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(true),
            geocode_base_url: env::var("GEOCODE_BASE_URL")
                .unwrap_or_else(|_| "https://geocoding-api.open-meteo.com".to_string()),
            geocode_timeout_seconds: env::var("GEOCODE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            geocode_cache_ttl_seconds: env::var("GEOCODE_CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86400),
        })
    }

    /// Get the full bind address (addr:port)
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
