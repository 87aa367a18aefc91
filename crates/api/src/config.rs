//! Service configuration.
//!
//! Layered loading, later sources win:
//! 1. defaults in code
//! 2. `config/default.toml` (optional)
//! 3. `config/{SIFT_ENV}.toml` (optional, `SIFT_ENV` defaults to `development`)
//! 4. environment variables prefixed `SIFT__`, e.g. `SIFT__SERVER__PORT=8080`

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use siftledger_infra::LockPolicy;
use siftledger_observability::LogSettings;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// `development`, `production`, ...
    pub environment: String,
    pub server: ServerSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    pub locks: LockSettings,
    pub cors: CorsSettings,
    #[serde(default)]
    pub logging: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    /// HS256 shared secret. Required outside development.
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LockSettings {
    pub max_wait_ms: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CorsSettings {
    pub allow_any_origin: bool,
}

impl Settings {
    /// Load settings from files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("SIFT_ENV").unwrap_or_else(|_| "development".into());

        let settings = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("locks.max_wait_ms", 2000)?
            .set_default("locks.initial_backoff_ms", 5)?
            .set_default("locks.max_backoff_ms", 100)?
            .set_default("cors.allow_any_origin", true)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(
                Environment::with_prefix("SIFT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Development defaults with the given secret.
    pub fn with_jwt_secret(secret: impl Into<String>) -> Self {
        Self {
            auth: AuthSettings {
                jwt_secret: Some(secret.into()),
            },
            ..Self::default()
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// The token secret; falls back to an insecure default in development only.
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        match self.auth.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
            _ if self.is_development() => {
                tracing::warn!("auth.jwt_secret not set; using insecure dev default");
                Ok(DEV_JWT_SECRET.to_string())
            }
            _ => Err(ConfigError::NotFound("auth.jwt_secret".to_string())),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            auth: AuthSettings::default(),
            locks: LockSettings::from(LockPolicy::default()),
            cors: CorsSettings {
                allow_any_origin: true,
            },
            logging: LogSettings::default(),
        }
    }
}

impl From<LockPolicy> for LockSettings {
    fn from(policy: LockPolicy) -> Self {
        Self {
            max_wait_ms: policy.max_wait.as_millis() as u64,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
        }
    }
}

impl From<LockSettings> for LockPolicy {
    fn from(s: LockSettings) -> Self {
        Self {
            max_wait: Duration::from_millis(s.max_wait_ms),
            initial_backoff: Duration::from_millis(s.initial_backoff_ms),
            max_backoff: Duration::from_millis(s.max_backoff_ms),
        }
    }
}
