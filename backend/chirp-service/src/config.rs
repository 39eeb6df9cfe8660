/// Configuration management for Chirp Service
///
/// Loads configuration from environment variables (optionally seeded from a
/// `.env` file by `main`).
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

const DEV_JWT_SECRET: &str = "chirp-development-secret-change-me-please";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Storage backend configuration
    pub storage: StorageConfig,
    /// Bearer token validation
    pub auth: AuthConfig,
    /// Timeline paging
    pub timeline: TimelineConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Storage configuration. Pool sizing is read separately by `db_pool::DbConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Run embedded migrations at startup
    pub run_migrations: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Cheeps per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    32
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("CHIRP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: match std::env::var("CHIRP_PORT") {
                Ok(raw) => raw
                    .parse()
                    .with_context(|| format!("CHIRP_PORT='{}' is not a valid port", raw))?,
                Err(_) => 8090,
            },
        };

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if app.is_production() => {
                    bail!("CORS_ALLOWED_ORIGINS must be set in production")
                }
                Err(_) => "http://localhost:3000".to_string(),
            };

            if app.is_production() && allowed_origins.trim() == "*" {
                bail!("CORS_ALLOWED_ORIGINS cannot be '*' in production");
            }

            CorsConfig { allowed_origins }
        };

        let storage = StorageConfig {
            backend: match std::env::var("CHIRP_STORAGE")
                .unwrap_or_else(|_| "postgres".to_string())
                .to_ascii_lowercase()
                .as_str()
            {
                "postgres" | "postgresql" => StorageBackend::Postgres,
                "memory" | "in-memory" => StorageBackend::Memory,
                other => bail!("CHIRP_STORAGE='{}' must be 'postgres' or 'memory'", other),
            },
            run_migrations: std::env::var("CHIRP_RUN_MIGRATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        };

        if storage.backend == StorageBackend::Postgres && std::env::var("DATABASE_URL").is_err() {
            bail!("DATABASE_URL environment variable not set (or use CHIRP_STORAGE=memory)");
        }

        let auth = AuthConfig {
            jwt_secret: match std::env::var("JWT_SECRET") {
                Ok(secret) => {
                    if app.is_production() && secret.len() < 32 {
                        bail!("JWT_SECRET must be at least 32 bytes in production");
                    }
                    secret
                }
                Err(_) if app.is_production() => bail!("JWT_SECRET must be set in production"),
                Err(_) => DEV_JWT_SECRET.to_string(),
            },
        };

        let timeline = TimelineConfig {
            page_size: match std::env::var("CHIRP_PAGE_SIZE") {
                Ok(raw) => {
                    let size: u32 = raw
                        .parse()
                        .with_context(|| format!("Failed to parse CHIRP_PAGE_SIZE='{}'", raw))?;
                    if !(1..=200).contains(&size) {
                        bail!("CHIRP_PAGE_SIZE must be between 1 and 200, got {}", size);
                    }
                    size
                }
                Err(_) => default_page_size(),
            },
        };

        Ok(Config {
            app,
            cors,
            storage,
            auth,
            timeline,
        })
    }
}
