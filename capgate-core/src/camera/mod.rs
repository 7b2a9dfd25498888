//! Camera capture capability.
//!
//! - `gateway`: [`CameraGateway`], owner of the single active stream
//! - `mock`: scripted [`MockCamera`] for tests and demos

mod gateway;
mod mock;

pub use gateway::{CameraGateway, StreamId};
pub use mock::{MockCamera, MockCameraOutcome};

use serde::{Deserialize, Serialize};

use crate::platform::PlatformCall;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front camera.
    #[default]
    User,
    /// Rear camera.
    Environment,
}

impl FacingMode {
    /// Value of the `facingMode` media constraint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Environment => "environment",
        }
    }
}

/// Capture constraints. All fields are preferences; the platform negotiates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// An open capture stream.
pub trait MediaStream {
    /// Stop every track of the stream, releasing the hardware.
    fn stop_tracks(&mut self);
}

/// Platform camera API (`navigator.mediaDevices`).
pub trait CameraPlatform {
    /// Whether the capture API exists at all.
    fn is_available(&self) -> bool;

    /// Request a stream. See [`PlatformCall`] for the eager-issue contract.
    fn request(&self, constraints: &MediaConstraints) -> PlatformCall<Box<dyn MediaStream>>;
}
