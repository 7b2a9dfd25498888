//! WebAssembly bindings for the capgate demo page.
//!
//! Wires the browser implementations of the camera, credential, storage,
//! timer and DOM seams into a [`capgate_core::Orchestrator`] and exposes the
//! two button handlers to JavaScript.
//!
//! ```js
//! import init, { CapgateApp } from "./pkg/capgate_wasm.js";
//!
//! await init();
//! const app = new CapgateApp();
//! // Call directly from the listener: no await before it.
//! biometricButton.addEventListener("click", () => app.onBiometricClick());
//! cameraButton.addEventListener("click", () => app.onCameraClick());
//! ```

mod logging;
mod platform;
mod store;
mod ui;

use std::rc::Rc;

use capgate_core::{
    BiometricMode, BiometricOutcome, BrowserFamily, CameraOutcome, DemoConfig, GestureOutcome,
    Host, Orchestrator,
};
use js_sys::Promise;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::HtmlVideoElement;

pub use platform::{BrowserCamera, BrowserCredentials, TimeoutScheduler};
pub use store::LocalStorageCredentialStore;
pub use ui::DomUi;

/// Id of the optional `<video>` element that mirrors the camera stream.
const PREVIEW_ELEMENT: &str = "camera-preview";

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Snapshot returned by [`CapgateApp::state_json`].
#[derive(Debug, Serialize)]
struct StateView {
    camera_active: bool,
    camera_pending: bool,
    biometric_busy: bool,
    authenticated: bool,
    has_credential: bool,
    next_mode: &'static str,
    browser: &'static str,
}

/// The demo application bound to the current page.
#[wasm_bindgen]
pub struct CapgateApp {
    orchestrator: Orchestrator,
}

#[wasm_bindgen]
impl CapgateApp {
    /// Build the app from an optional JSON config (see `DemoConfig`).
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<CapgateApp, JsError> {
        let config = match config_json.as_deref() {
            Some(json) => DemoConfig::from_json(json)?,
            None => DemoConfig::default(),
        };
        logging::init(&config.log_filter);

        let window = web_sys::window().ok_or_else(|| JsError::new("No global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsError::new("Window has no document"))?;
        let user_agent = window.navigator().user_agent().unwrap_or_default();
        let hostname = window.location().hostname().unwrap_or_default();
        let preview = document
            .get_element_by_id(PREVIEW_ELEMENT)
            .and_then(|el| el.dyn_into::<HtmlVideoElement>().ok());

        let orchestrator = Orchestrator::new(
            &config,
            Host {
                camera: Rc::new(BrowserCamera::new(window.clone(), preview)),
                credentials: Rc::new(BrowserCredentials::new(window.clone())),
                store: Rc::new(LocalStorageCredentialStore::new(window.clone())),
                scheduler: Rc::new(TimeoutScheduler::new(window)),
                ui: Rc::new(DomUi::new(document)),
                hostname,
                browser: BrowserFamily::detect(&user_agent),
            },
        );

        Ok(Self { orchestrator })
    }

    /// Biometric button handler.
    ///
    /// Must run synchronously inside the click listener. The credential
    /// request is issued before this returns; the promise resolves to
    /// `registered`, `authenticated`, `failed:<code>` or `ignored`.
    #[wasm_bindgen(js_name = onBiometricClick)]
    pub fn on_biometric_click(&self) -> Promise {
        match self.orchestrator.trigger_biometric() {
            GestureOutcome::Ignored => Promise::resolve(&JsValue::from_str("ignored")),
            GestureOutcome::Started(flow) => future_to_promise(async move {
                Ok(JsValue::from_str(&biometric_code(flow.await)))
            }),
        }
    }

    /// Camera button handler.
    ///
    /// Resolves to `started`, `stopped`, `failed:<code>` or `ignored`.
    #[wasm_bindgen(js_name = onCameraClick)]
    pub fn on_camera_click(&self) -> Promise {
        let orchestrator = self.orchestrator.clone();
        future_to_promise(async move {
            let outcome = orchestrator.toggle_camera().await;
            Ok(JsValue::from_str(&camera_code(outcome)))
        })
    }

    /// Forget the stored credential so the next click registers again.
    ///
    /// Returns `false` when a biometric request is still pending; nothing is
    /// cleared in that case.
    #[wasm_bindgen(js_name = resetCredential)]
    pub fn reset_credential(&self) -> Result<bool, JsError> {
        Ok(self.orchestrator.reset_credential()?)
    }

    /// Current activity flags as JSON.
    #[wasm_bindgen(js_name = stateJson)]
    pub fn state_json(&self) -> Result<String, JsError> {
        let state = self.orchestrator.state();
        let view = StateView {
            camera_active: state.camera_active,
            camera_pending: state.camera_pending,
            biometric_busy: state.biometric_busy,
            authenticated: state.authenticated,
            has_credential: self.orchestrator.has_credential(),
            next_mode: match self.orchestrator.next_biometric_mode() {
                BiometricMode::Register => "register",
                BiometricMode::Authenticate => "authenticate",
            },
            browser: self.orchestrator.browser().display_name(),
        };
        Ok(serde_json::to_string(&view)?)
    }

    /// Release the camera. Call on page unload.
    pub fn dispose(&self) {
        self.orchestrator.dispose();
    }
}

fn biometric_code(outcome: BiometricOutcome) -> String {
    match outcome {
        BiometricOutcome::Registered => "registered".to_string(),
        BiometricOutcome::Authenticated => "authenticated".to_string(),
        BiometricOutcome::Failed(kind) => format!("failed:{}", kind.code()),
    }
}

fn camera_code(outcome: Option<CameraOutcome>) -> String {
    match outcome {
        None => "ignored".to_string(),
        Some(CameraOutcome::Started(_)) => "started".to_string(),
        Some(CameraOutcome::Stopped) => "stopped".to_string(),
        Some(CameraOutcome::Failed(kind)) => format!("failed:{}", kind.code()),
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use capgate_core::{BiometricErrorKind, CameraErrorKind, StreamId};

    #[test]
    fn test_outcome_codes() {
        assert_eq!(biometric_code(BiometricOutcome::Registered), "registered");
        assert_eq!(
            biometric_code(BiometricOutcome::Failed(BiometricErrorKind::NotAllowed)),
            "failed:not-allowed"
        );
        assert_eq!(camera_code(None), "ignored");
        assert_eq!(camera_code(Some(CameraOutcome::Started(StreamId(1)))), "started");
        assert_eq!(
            camera_code(Some(CameraOutcome::Failed(CameraErrorKind::InUse))),
            "failed:in-use"
        );
    }

    #[test]
    fn test_version() {
        assert_eq!(get_version(), env!("CARGO_PKG_VERSION"));
    }
}
