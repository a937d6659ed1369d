//! Server configuration
//!
//! Everything comes from the environment: listening port, interpreter
//! binary, limit profile, delivery mode, CORS allow-list, counters file.

use algebox_core::{DeliveryMode, LimitProfile, SandboxConfig};
use std::path::PathBuf;

/// Configuration for the HTTP daemon
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,

    /// Path to the interpreter binary (bare names resolve via PATH)
    pub interpreter_path: PathBuf,

    /// Resource-limit profile selected for this deployment
    pub profile: LimitProfile,

    /// Code delivery strategy for the primary request path
    pub delivery: DeliveryMode,

    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,

    /// Where the usage counters are persisted
    pub stats_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            interpreter_path: PathBuf::from("M2"),
            profile: LimitProfile::Conservative,
            delivery: DeliveryMode::Stdin,
            allowed_origins: vec![
                "http://localhost:5173".into(),
                "http://localhost:3000".into(),
            ],
            stats_file: PathBuf::from("algebox-stats.json"),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `ALGEBOX_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("ALGEBOX_PORT") {
            config.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid ALGEBOX_PORT {port:?}: {e}"))?;
        }
        if let Ok(path) = std::env::var("ALGEBOX_INTERPRETER") {
            config.interpreter_path = PathBuf::from(path);
        }
        if let Ok(profile) = std::env::var("ALGEBOX_PROFILE") {
            config.profile = profile.parse().map_err(anyhow::Error::msg)?;
        }
        if let Ok(delivery) = std::env::var("ALGEBOX_DELIVERY") {
            config.delivery = delivery.parse().map_err(anyhow::Error::msg)?;
        }
        if let Ok(origins) = std::env::var("ALGEBOX_ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(path) = std::env::var("ALGEBOX_STATS_FILE") {
            config.stats_file = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Sandbox configuration derived from this deployment's settings.
    #[must_use]
    pub fn sandbox_config(&self) -> SandboxConfig {
        SandboxConfig::builder()
            .interpreter_path(&self.interpreter_path)
            .profile(self.profile)
            .delivery(self.delivery)
            .build()
    }
}
