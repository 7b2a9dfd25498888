//! Demo configuration.
//!
//! Loaded from an optional JSON document handed over by the page; every field
//! has a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::biometric::AuthenticatorPolicy;
use crate::camera::MediaConstraints;
use crate::error::ConfigError;

/// Runtime configuration for the demo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Relying party display name (default: "Capgate Demo")
    pub rp_name: String,
    /// User name for new registrations (default: "demo-user")
    pub user_name: String,
    /// User display name for new registrations (default: "Demo User")
    pub user_display_name: String,
    /// Bound on each biometric prompt in milliseconds (default: 60000)
    pub biometric_timeout_ms: u64,
    /// Authenticator requirements (default: platform, user verification required)
    pub authenticator: AuthenticatorPolicy,
    /// How long the post-authentication camera preview stays open (default: 3000)
    pub preview_duration_ms: u64,
    /// Camera constraints (default: front camera, ideal 1280x720)
    pub camera: MediaConstraints,
    /// `tracing` filter directives (default: "capgate_core=debug,info")
    pub log_filter: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            rp_name: "Capgate Demo".to_string(),
            user_name: "demo-user".to_string(),
            user_display_name: "Demo User".to_string(),
            biometric_timeout_ms: 60_000,
            authenticator: AuthenticatorPolicy::default(),
            preview_duration_ms: 3_000,
            camera: MediaConstraints::default(),
            log_filter: "capgate_core=debug,info".to_string(),
        }
    }
}

impl DemoConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rp_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "rp_name",
                reason: "must not be empty".into(),
            });
        }
        if self.user_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "user_name",
                reason: "must not be empty".into(),
            });
        }
        if self.biometric_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "biometric_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.preview_duration_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "preview_duration_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.camera.ideal_width == 0 || self.camera.ideal_height == 0 {
            return Err(ConfigError::Invalid {
                field: "camera",
                reason: "ideal resolution must be non-zero".into(),
            });
        }
        Ok(())
    }

    pub fn biometric_timeout(&self) -> Duration {
        Duration::from_millis(self.biometric_timeout_ms)
    }

    pub fn preview_duration(&self) -> Duration {
        Duration::from_millis(self.preview_duration_ms)
    }
}
