//! Interaction controller.
//!
//! Sequences the gesture-triggered flows over the two gateways and keeps the
//! activity flags and their UI reflection consistent.
//!
//! ## Flows
//!
//! - Biometric: `idle → busy → (authenticated | idle)`, followed on success by
//!   a short camera preview that is released on a timer. The busy state ends
//!   with the biometric result, before the preview asks for the camera.
//! - Camera toggle: `off → requesting → on → off`.
//!
//! Both flows share the camera gateway's single active stream. Everything
//! runs on one thread; flags are `Cell`s and no borrow is held across an
//! await.

mod ui;

pub use ui::{BiometricUi, CameraUi, ErrorNotice, StatusKind, UiSurface};

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::LocalBoxFuture;
use tracing::{debug, info, warn};

use crate::biometric::{
    BiometricGateway, BiometricMode, CapabilityResult, CredentialPlatform, RelyingParty,
};
use crate::camera::{CameraGateway, CameraPlatform, StreamId};
use crate::config::DemoConfig;
use crate::error::{BiometricError, BiometricErrorKind, CameraErrorKind, CapabilityError, StoreError};
use crate::platform::Scheduler;
use crate::remediation::{BrowserFamily, Capability};
use crate::store::CredentialStore;

const REGISTERED_TEXT: &str = "Biometric registered. Tap again to verify it.";
const AUTHENTICATED_TEXT: &str = "Authentication successful!";
const CREDENTIAL_CLEARED_TEXT: &str = "Stored credential removed. Tap to register again.";

/// Everything the orchestrator needs from the page.
pub struct Host {
    pub camera: Rc<dyn CameraPlatform>,
    pub credentials: Rc<dyn CredentialPlatform>,
    pub store: Rc<dyn CredentialStore>,
    pub scheduler: Rc<dyn Scheduler>,
    pub ui: Rc<dyn UiSurface>,
    /// `location.hostname` of the page.
    pub hostname: String,
    pub browser: BrowserFamily,
}

/// Snapshot of the activity flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityState {
    pub camera_active: bool,
    /// Camera toggle is waiting for the platform.
    pub camera_pending: bool,
    pub biometric_busy: bool,
    pub authenticated: bool,
}

/// How a biometric flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricOutcome {
    Registered,
    Authenticated,
    Failed(BiometricErrorKind),
}

/// How a camera toggle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraOutcome {
    Started(StreamId),
    Stopped,
    Failed(CameraErrorKind),
}

/// Result of handing a gesture to the orchestrator.
#[must_use = "a started flow does nothing until awaited"]
pub enum GestureOutcome {
    /// A flow of the same kind is in flight; the gesture was dropped.
    Ignored,
    Started(BiometricFlow),
}

impl fmt::Debug for GestureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored => f.write_str("Ignored"),
            Self::Started(_) => f.write_str("Started(..)"),
        }
    }
}

/// Remainder of a biometric flow after its platform request went out.
pub struct BiometricFlow(LocalBoxFuture<'static, BiometricOutcome>);

impl Future for BiometricFlow {
    type Output = BiometricOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

struct Inner {
    camera: CameraGateway,
    biometric: BiometricGateway,
    ui: Rc<dyn UiSurface>,
    scheduler: Rc<dyn Scheduler>,
    browser: BrowserFamily,
    preview_duration: Duration,
    camera_active: Cell<bool>,
    camera_pending: Cell<bool>,
    biometric_busy: Cell<bool>,
    authenticated: Cell<bool>,
}

/// The interaction controller. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Rc<Inner>,
}

impl Orchestrator {
    pub fn new(config: &DemoConfig, host: Host) -> Self {
        let rp = RelyingParty::for_hostname(&host.hostname, config.rp_name.clone());
        let biometric =
            BiometricGateway::new(host.credentials, host.store, rp, config.biometric_timeout())
                .with_user(config.user_name.clone(), config.user_display_name.clone())
                .with_policy(config.authenticator);
        let camera = CameraGateway::new(host.camera, config.camera.clone());

        let inner = Rc::new(Inner {
            camera,
            biometric,
            ui: host.ui,
            scheduler: host.scheduler,
            browser: host.browser,
            preview_duration: config.preview_duration(),
            camera_active: Cell::new(false),
            camera_pending: Cell::new(false),
            biometric_busy: Cell::new(false),
            authenticated: Cell::new(false),
        });

        inner.set_camera(CameraUi::Off);
        inner.publish_biometric();
        info!(
            browser = %host.browser,
            rp_id = %inner.biometric.relying_party().id,
            biometric_supported = inner.biometric.check_support(),
            "Orchestrator ready"
        );

        Self { inner }
    }

    pub fn state(&self) -> ActivityState {
        ActivityState {
            camera_active: self.inner.camera_active.get(),
            camera_pending: self.inner.camera_pending.get(),
            biometric_busy: self.inner.biometric_busy.get(),
            authenticated: self.inner.authenticated.get(),
        }
    }

    pub fn browser(&self) -> BrowserFamily {
        self.inner.browser
    }

    pub fn has_credential(&self) -> bool {
        self.inner.biometric.has_credential()
    }

    /// Ceremony the next biometric gesture would run.
    pub fn next_biometric_mode(&self) -> BiometricMode {
        if self.has_credential() {
            BiometricMode::Authenticate
        } else {
            BiometricMode::Register
        }
    }

    /// Handle a click on the biometric button.
    ///
    /// Call this synchronously from the gesture handler. No suspension may
    /// happen before it: the platform only shows the biometric prompt for a
    /// request made while the gesture is still on the stack, and rejects it
    /// silently otherwise. The register-or-authenticate request is issued
    /// before this returns; camera access is only reachable from the returned
    /// flow, after the biometric result.
    pub fn trigger_biometric(&self) -> GestureOutcome {
        let inner = &self.inner;
        if inner.biometric_busy.get() {
            debug!("Biometric flow already running; gesture ignored");
            return GestureOutcome::Ignored;
        }

        inner.biometric_busy.set(true);
        inner.ui.clear_messages();
        inner.publish_biometric();
        let busy = BusyGuard(Rc::clone(inner));

        let pending = inner.biometric.begin();
        if let Ok(pending) = &pending {
            debug!(mode = %pending.mode(), "Biometric request issued");
        }

        let inner = Rc::clone(inner);
        GestureOutcome::Started(BiometricFlow(Box::pin(async move {
            let result = match pending {
                Ok(pending) => pending.finish().await,
                Err(err) => Err(err),
            };

            let outcome = match result {
                Ok(result) => inner.on_biometric_success(result),
                Err(err) => inner.on_biometric_failure(err),
            };
            drop(busy);

            if !matches!(outcome, BiometricOutcome::Failed(_)) {
                inner.preview_camera().await;
            }
            outcome
        })))
    }

    /// Handle a click on the camera button.
    ///
    /// Returns `None` when a previous toggle is still waiting for the platform.
    pub async fn toggle_camera(&self) -> Option<CameraOutcome> {
        let inner = &self.inner;
        if inner.camera_pending.get() {
            debug!("Camera request in flight; gesture ignored");
            return None;
        }

        if inner.camera_active.get() || inner.camera.is_active() {
            inner.camera.stop();
            inner.set_camera(CameraUi::Off);
            return Some(CameraOutcome::Stopped);
        }

        inner.camera_pending.set(true);
        let _pending = ResetOnDrop(&inner.camera_pending);
        inner.ui.clear_messages();
        inner.set_camera(CameraUi::Requesting);

        match inner.camera.request_access().await {
            Ok(id) => {
                inner.set_camera(CameraUi::On);
                Some(CameraOutcome::Started(id))
            }
            Err(err) => {
                let kind = err.kind;
                inner.set_camera(CameraUi::Off);
                inner.show_error(&CapabilityError::Camera(err), Capability::Camera);
                Some(CameraOutcome::Failed(kind))
            }
        }
    }

    /// Forget the registered credential. The next biometric gesture registers.
    ///
    /// Returns `Ok(false)` without touching the store while a biometric
    /// request is in flight: its result would otherwise land on a credential
    /// that no longer exists.
    pub fn reset_credential(&self) -> Result<bool, StoreError> {
        let inner = &self.inner;
        if inner.biometric_busy.get() {
            debug!("Biometric flow running; reset ignored");
            return Ok(false);
        }

        inner.biometric.forget()?;
        inner.authenticated.set(false);
        inner.publish_biometric();
        inner.ui.show_status(StatusKind::Info, CREDENTIAL_CLEARED_TEXT);
        Ok(true)
    }

    /// End of the application lifecycle: release the camera.
    ///
    /// Pending preview timers become no-ops once the last clone is dropped.
    pub fn dispose(&self) {
        if self.inner.camera.stop() || self.inner.camera_active.get() {
            self.inner.set_camera(CameraUi::Off);
        }
        info!("Orchestrator disposed");
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state())
            .field("browser", &self.inner.browser)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn on_biometric_success(&self, result: CapabilityResult) -> BiometricOutcome {
        if result.is_new_registration {
            self.ui.show_status(StatusKind::Info, REGISTERED_TEXT);
            BiometricOutcome::Registered
        } else {
            self.authenticated.set(true);
            self.publish_biometric();
            self.ui.show_status(StatusKind::Success, AUTHENTICATED_TEXT);
            BiometricOutcome::Authenticated
        }
    }

    fn on_biometric_failure(&self, err: BiometricError) -> BiometricOutcome {
        let kind = err.kind;
        self.authenticated.set(false);
        self.publish_biometric();
        self.show_error(&CapabilityError::Biometric(err), Capability::Biometric);

        if self.camera.stop() || self.camera_active.get() {
            self.set_camera(CameraUi::Off);
        }
        BiometricOutcome::Failed(kind)
    }

    /// Best-effort preview after a biometric success.
    ///
    /// Failures are logged and dropped: the biometric result stands on its own
    /// and the camera has its own button for a real attempt.
    async fn preview_camera(self: &Rc<Self>) {
        let id = match self.camera.request_access().await {
            Ok(id) => id,
            Err(err) => {
                warn!(kind = %err.kind, message = %err.message, "Camera preview skipped");
                return;
            }
        };

        self.set_camera(CameraUi::On);
        debug!(
            stream_id = id.0,
            after_ms = self.preview_duration.as_millis() as u64,
            "Preview release scheduled"
        );

        let weak: Weak<Self> = Rc::downgrade(self);
        self.scheduler.schedule(
            self.preview_duration,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.release_preview(id);
                }
            }),
        );
    }

    fn release_preview(&self, id: StreamId) {
        if self.camera.stop_if(id) {
            info!(stream_id = id.0, "Camera preview released");
            self.set_camera(CameraUi::Off);
        }
    }

    fn show_error(&self, err: &CapabilityError, capability: Capability) {
        let notice = ErrorNotice::new(err, self.browser, capability);
        warn!(
            code = notice.code,
            remediation = notice.remediation.is_some(),
            "Showing capability error"
        );
        self.ui.show_error(&notice);
    }

    fn set_camera(&self, state: CameraUi) {
        self.camera_active.set(state == CameraUi::On);
        self.ui.camera_changed(state);
    }

    fn publish_biometric(&self) {
        self.ui.biometric_changed(BiometricUi {
            busy: self.biometric_busy.get(),
            authenticated: self.authenticated.get(),
        });
    }
}

/// Clears `biometric_busy` when the flow ends, however it ends.
struct BusyGuard(Rc<Inner>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.biometric_busy.set(false);
        self.0.publish_biometric();
    }
}

struct ResetOnDrop<'a>(&'a Cell<bool>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
