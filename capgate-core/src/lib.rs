//! Capgate Core - device capability gateways and gesture orchestration
//!
//! This crate coordinates two browser permission flows, camera capture and
//! biometric (platform credential) authentication, without tying them to a
//! particular host. The browser bindings live in `capgate-wasm`; tests and
//! offline demos use the doubles in [`mock`].
//!
//! # Features
//!
//! - Camera and biometric gateways with disjoint, exhaustively matched error kinds
//! - Browser-specific remediation steps for permission and support failures
//! - Gesture-ordered biometric flow: the platform request is issued before
//!   the first suspension
//! - Best-effort camera preview after biometric success, released on a timer
//!
//! # Example
//!
//! ```no_run
//! use std::rc::Rc;
//! use capgate_core::mock::{
//!     ManualScheduler, MemoryCredentialStore, MockAuthenticator, MockCamera, RecordingUi,
//! };
//! use capgate_core::{BrowserFamily, DemoConfig, GestureOutcome, Host, Orchestrator};
//!
//! # async fn example() {
//! let orchestrator = Orchestrator::new(
//!     &DemoConfig::default(),
//!     Host {
//!         camera: Rc::new(MockCamera::new()),
//!         credentials: Rc::new(MockAuthenticator::new(1)),
//!         store: Rc::new(MemoryCredentialStore::new()),
//!         scheduler: Rc::new(ManualScheduler::new()),
//!         ui: Rc::new(RecordingUi::new()),
//!         hostname: "localhost".into(),
//!         browser: BrowserFamily::Chrome,
//!     },
//! );
//!
//! // Inside the click handler: the platform request goes out right here.
//! if let GestureOutcome::Started(flow) = orchestrator.trigger_biometric() {
//!     let outcome = flow.await;
//!     println!("{outcome:?}");
//! }
//! # }
//! ```

pub mod biometric;
pub mod camera;
pub mod config;
pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod platform;
pub mod remediation;
pub mod store;

// Re-export main types for convenience
pub use biometric::{
    AuthenticatorPolicy, BiometricGateway, BiometricMode, CapabilityResult, CreationOptions,
    CredentialId, CredentialPlatform, PendingBiometric, RelyingParty, RequestOptions,
};
pub use camera::{CameraGateway, CameraPlatform, FacingMode, MediaConstraints, MediaStream, StreamId};
pub use config::DemoConfig;
pub use error::{
    BiometricError, BiometricErrorKind, CameraError, CameraErrorKind, CapabilityError,
    ConfigError, PlatformError, StoreError,
};
pub use orchestrator::{
    ActivityState, BiometricFlow, BiometricOutcome, BiometricUi, CameraOutcome, CameraUi,
    ErrorNotice, GestureOutcome, Host, Orchestrator, StatusKind, UiSurface,
};
pub use platform::{PlatformCall, Scheduler};
pub use remediation::{BrowserFamily, Capability, Remediation};
pub use store::{CredentialStore, CREDENTIAL_STORE_KEY};
