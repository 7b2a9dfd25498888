//! Notifications from the orchestrator to the rendering layer.

use crate::error::CapabilityError;
use crate::remediation::{BrowserFamily, Capability, Remediation};

/// Camera button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraUi {
    Off,
    Requesting,
    On,
}

impl CameraUi {
    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Enable Camera",
            Self::Requesting => "Starting Camera...",
            Self::On => "Disable Camera",
        }
    }

    /// Whether the button accepts clicks.
    pub fn enabled(self) -> bool {
        !matches!(self, Self::Requesting)
    }
}

/// Biometric button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiometricUi {
    pub busy: bool,
    pub authenticated: bool,
}

impl BiometricUi {
    pub fn label(self) -> &'static str {
        if self.busy {
            "Waiting for biometrics..."
        } else if self.authenticated {
            "Authenticated"
        } else {
            "Authenticate with Biometrics"
        }
    }

    pub fn enabled(self) -> bool {
        !self.busy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Info,
}

/// Error banner contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    /// Stable kind code, e.g. `permission-denied`.
    pub code: &'static str,
    pub message: String,
    /// Present only when the user can fix the problem in settings.
    pub remediation: Option<Remediation>,
}

impl ErrorNotice {
    pub fn new(err: &CapabilityError, browser: BrowserFamily, capability: Capability) -> Self {
        let remediation = err
            .needs_remediation()
            .then(|| Remediation::for_browser(browser, capability));
        Self {
            code: err.code(),
            message: err.message().to_string(),
            remediation,
        }
    }
}

/// The rendering layer (DOM in the browser, a recorder in tests).
pub trait UiSurface {
    fn camera_changed(&self, state: CameraUi);

    fn biometric_changed(&self, state: BiometricUi);

    fn show_status(&self, kind: StatusKind, text: &str);

    fn show_error(&self, notice: &ErrorNotice);

    /// Hide both the status and the error banner.
    fn clear_messages(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BiometricError, BiometricErrorKind, CameraError, CameraErrorKind};

    #[test]
    fn test_notice_includes_remediation_for_permission_kinds() {
        let err = CapabilityError::from(CameraError::of_kind(CameraErrorKind::PermissionDenied));
        let notice = ErrorNotice::new(&err, BrowserFamily::Chrome, Capability::Camera);

        assert_eq!(notice.code, "permission-denied");
        let remediation = notice.remediation.expect("remediation");
        assert_eq!(remediation.browser, BrowserFamily::Chrome);
        assert_eq!(remediation.capability, Capability::Camera);
    }

    #[test]
    fn test_notice_message_only_for_other_kinds() {
        let err = CapabilityError::from(BiometricError::of_kind(BiometricErrorKind::Timeout));
        let notice = ErrorNotice::new(&err, BrowserFamily::Safari, Capability::Biometric);

        assert_eq!(notice.code, "timeout");
        assert!(notice.remediation.is_none());
    }

    #[test]
    fn test_labels() {
        assert_eq!(CameraUi::Off.label(), "Enable Camera");
        assert!(!CameraUi::Requesting.enabled());
        let busy = BiometricUi {
            busy: true,
            authenticated: false,
        };
        assert!(!busy.enabled());
    }
}
