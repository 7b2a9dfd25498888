//! Error taxonomy for the camera and biometric capabilities.
//!
//! Platform failures arrive as a [`PlatformError`] (the DOMException name and
//! message). Each gateway classifies them exactly once into its own closed
//! kind enum; the two taxonomies never mix.

use std::fmt;

use thiserror::Error;

/// Raw failure reported by a browser capability API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct PlatformError {
    /// Error identity, e.g. `NotAllowedError`.
    pub name: String,
    /// Human-readable text supplied by the platform.
    pub message: String,
}

impl PlatformError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Camera failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraErrorKind {
    /// The user or a policy declined access.
    PermissionDenied,
    /// No capture device is present.
    NotFound,
    /// The device exists but cannot be read (busy or held by another app).
    InUse,
    /// The capture API is absent.
    NotSupported,
    Unknown,
}

impl CameraErrorKind {
    /// Map a platform error name onto a camera kind.
    pub fn classify(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                Self::PermissionDenied
            }
            "NotFoundError"
            | "DevicesNotFoundError"
            | "OverconstrainedError"
            | "ConstraintNotSatisfiedError" => Self::NotFound,
            "NotReadableError" | "TrackStartError" | "AbortError" => Self::InUse,
            "NotSupportedError" | "TypeError" => Self::NotSupported,
            _ => Self::Unknown,
        }
    }

    /// Stable kebab-case code.
    pub fn code(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::NotFound => "not-found",
            Self::InUse => "in-use",
            Self::NotSupported => "not-supported",
            Self::Unknown => "unknown",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Camera access was denied. Allow camera access in your browser settings and try again."
            }
            Self::NotFound => "No camera was found on this device.",
            Self::InUse => "The camera is already in use by another application.",
            Self::NotSupported => "Camera access is not supported in this browser.",
            Self::Unknown => "An unknown camera error occurred.",
        }
    }
}

impl fmt::Display for CameraErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Biometric (platform credential) failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BiometricErrorKind {
    /// No credential API, or no platform authenticator.
    NotSupported,
    /// Cancelled, denied, or no matching authenticator.
    NotAllowed,
    /// Credential already exists on register, or none found on authenticate.
    InvalidState,
    /// The bounded wait elapsed or the request was aborted.
    Timeout,
    Unknown,
}

impl BiometricErrorKind {
    /// Map a platform error name onto a biometric kind.
    pub fn classify(name: &str) -> Self {
        match name {
            "NotSupportedError" => Self::NotSupported,
            "NotAllowedError" | "SecurityError" => Self::NotAllowed,
            "InvalidStateError" => Self::InvalidState,
            "AbortError" | "TimeoutError" => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    /// Stable kebab-case code.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotSupported => "not-supported",
            Self::NotAllowed => "not-allowed",
            Self::InvalidState => "invalid-state",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Self::NotSupported => "Biometric authentication is not supported on this device.",
            Self::NotAllowed => "Biometric authentication was cancelled or not allowed.",
            Self::InvalidState => "This credential is not in a usable state.",
            Self::Timeout => "Biometric authentication timed out. Please try again.",
            Self::Unknown => "An unknown biometric error occurred.",
        }
    }
}

impl fmt::Display for BiometricErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified camera failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("camera {kind}: {message}")]
pub struct CameraError {
    pub kind: CameraErrorKind,
    pub message: String,
}

impl CameraError {
    pub fn new(kind: CameraErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Error carrying the kind's stock user-facing message.
    pub fn of_kind(kind: CameraErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }
}

impl From<PlatformError> for CameraError {
    fn from(err: PlatformError) -> Self {
        match CameraErrorKind::classify(&err.name) {
            CameraErrorKind::Unknown => Self::new(CameraErrorKind::Unknown, err.message),
            kind => Self::of_kind(kind),
        }
    }
}

/// A classified biometric failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("biometric {kind}: {message}")]
pub struct BiometricError {
    pub kind: BiometricErrorKind,
    pub message: String,
}

impl BiometricError {
    pub fn new(kind: BiometricErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn of_kind(kind: BiometricErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }
}

impl From<PlatformError> for BiometricError {
    fn from(err: PlatformError) -> Self {
        match BiometricErrorKind::classify(&err.name) {
            BiometricErrorKind::Unknown => Self::new(BiometricErrorKind::Unknown, err.message),
            kind => Self::of_kind(kind),
        }
    }
}

/// Failure of either capability, as surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Biometric(#[from] BiometricError),
}

impl CapabilityError {
    /// Whether the user can fix this by changing browser or OS settings.
    pub fn needs_remediation(&self) -> bool {
        match self {
            Self::Camera(e) => match e.kind {
                CameraErrorKind::PermissionDenied | CameraErrorKind::NotSupported => true,
                CameraErrorKind::NotFound | CameraErrorKind::InUse | CameraErrorKind::Unknown => {
                    false
                }
            },
            Self::Biometric(e) => match e.kind {
                BiometricErrorKind::NotAllowed | BiometricErrorKind::NotSupported => true,
                BiometricErrorKind::InvalidState
                | BiometricErrorKind::Timeout
                | BiometricErrorKind::Unknown => false,
            },
        }
    }

    /// Stable code of the underlying kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Camera(e) => e.kind.code(),
            Self::Biometric(e) => e.kind.code(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Camera(e) => &e.message,
            Self::Biometric(e) => &e.message,
        }
    }
}

/// Credential store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Stored credential is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage write failed: {0}")]
    Write(String),
}

impl From<StoreError> for BiometricError {
    fn from(err: StoreError) -> Self {
        Self::new(BiometricErrorKind::Unknown, err.to_string())
    }
}

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type CameraResult<T> = std::result::Result<T, CameraError>;
pub type BiometricResult<T> = std::result::Result<T, BiometricError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_classification_table() {
        let cases = [
            ("NotAllowedError", CameraErrorKind::PermissionDenied),
            ("PermissionDeniedError", CameraErrorKind::PermissionDenied),
            ("SecurityError", CameraErrorKind::PermissionDenied),
            ("NotFoundError", CameraErrorKind::NotFound),
            ("DevicesNotFoundError", CameraErrorKind::NotFound),
            ("OverconstrainedError", CameraErrorKind::NotFound),
            ("ConstraintNotSatisfiedError", CameraErrorKind::NotFound),
            ("NotReadableError", CameraErrorKind::InUse),
            ("TrackStartError", CameraErrorKind::InUse),
            ("AbortError", CameraErrorKind::InUse),
            ("NotSupportedError", CameraErrorKind::NotSupported),
            ("TypeError", CameraErrorKind::NotSupported),
            ("SomethingNewError", CameraErrorKind::Unknown),
        ];

        for (name, expected) in cases {
            assert_eq!(CameraErrorKind::classify(name), expected, "name: {name}");
        }
    }

    #[test]
    fn test_biometric_classification_table() {
        let cases = [
            ("NotSupportedError", BiometricErrorKind::NotSupported),
            ("NotAllowedError", BiometricErrorKind::NotAllowed),
            ("SecurityError", BiometricErrorKind::NotAllowed),
            ("InvalidStateError", BiometricErrorKind::InvalidState),
            ("AbortError", BiometricErrorKind::Timeout),
            ("TimeoutError", BiometricErrorKind::Timeout),
            ("UnknownError", BiometricErrorKind::Unknown),
            ("", BiometricErrorKind::Unknown),
        ];

        for (name, expected) in cases {
            assert_eq!(BiometricErrorKind::classify(name), expected, "name: {name}");
        }
    }

    #[test]
    fn test_unknown_keeps_platform_message() {
        let camera: CameraError = PlatformError::new("WeirdError", "device exploded").into();
        assert_eq!(camera.kind, CameraErrorKind::Unknown);
        assert_eq!(camera.message, "device exploded");

        let bio: BiometricError = PlatformError::new("WeirdError", "authenticator gone").into();
        assert_eq!(bio.kind, BiometricErrorKind::Unknown);
        assert_eq!(bio.message, "authenticator gone");
    }

    #[test]
    fn test_known_kinds_use_stock_message() {
        let err: CameraError = PlatformError::new("NotFoundError", "Requested device not found").into();
        assert_eq!(err.message, "No camera was found on this device.");
    }

    #[test]
    fn test_remediation_only_for_permission_and_support() {
        let yes = [
            CapabilityError::from(CameraError::of_kind(CameraErrorKind::PermissionDenied)),
            CapabilityError::from(CameraError::of_kind(CameraErrorKind::NotSupported)),
            CapabilityError::from(BiometricError::of_kind(BiometricErrorKind::NotAllowed)),
            CapabilityError::from(BiometricError::of_kind(BiometricErrorKind::NotSupported)),
        ];
        let no = [
            CapabilityError::from(CameraError::of_kind(CameraErrorKind::NotFound)),
            CapabilityError::from(CameraError::of_kind(CameraErrorKind::InUse)),
            CapabilityError::from(BiometricError::of_kind(BiometricErrorKind::Timeout)),
            CapabilityError::from(BiometricError::of_kind(BiometricErrorKind::InvalidState)),
        ];

        assert!(yes.iter().all(CapabilityError::needs_remediation));
        assert!(!no.iter().any(CapabilityError::needs_remediation));
    }

    #[test]
    fn test_store_error_maps_to_unknown() {
        let err: BiometricError = StoreError::Write("quota exceeded".into()).into();
        assert_eq!(err.kind, BiometricErrorKind::Unknown);
        assert!(err.message.contains("quota exceeded"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(CameraErrorKind::InUse.to_string(), "in-use");
        assert_eq!(BiometricErrorKind::InvalidState.to_string(), "invalid-state");
    }
}
