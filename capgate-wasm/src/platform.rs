//! Browser implementations of the capability platforms.
//!
//! Every request is issued on the calling stack; the returned future only
//! waits for the browser's promise. That keeps biometric requests inside the
//! user gesture that triggered them.

use std::time::Duration;

use capgate_core::biometric::{CreationOptions, CredentialId, CredentialPlatform, RequestOptions};
use capgate_core::camera::{CameraPlatform, MediaConstraints, MediaStream};
use capgate_core::{PlatformCall, PlatformError, Scheduler};
use js_sys::{Array, ArrayBuffer, Object, Promise, Reflect, Uint8Array};
use tracing::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStreamTrack, Window};

/// Map a rejected promise or thrown value to a [`PlatformError`].
///
/// `DOMException` and `TypeError` both carry `name` and `message`; anything
/// else becomes a generic `Error` with its string form.
pub(crate) fn platform_error(err: JsValue) -> PlatformError {
    let field = |key: &str| {
        Reflect::get(&err, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_string())
    };
    match field("name") {
        Some(name) => PlatformError::new(name, field("message").unwrap_or_default()),
        None => PlatformError::new(
            "Error",
            err.as_string().unwrap_or_else(|| format!("{err:?}")),
        ),
    }
}

fn set(target: &JsValue, key: &str, value: &JsValue) -> Result<(), PlatformError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(drop)
        .map_err(platform_error)
}

fn has(target: &JsValue, key: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(key)).unwrap_or(false)
}

fn bytes(data: &[u8]) -> JsValue {
    Uint8Array::from(data).into()
}

fn millis(timeout: Duration) -> JsValue {
    JsValue::from_f64(timeout.as_millis() as f64)
}

// ============================================================================
// Camera
// ============================================================================

/// `navigator.mediaDevices.getUserMedia`, optionally mirrored into a
/// `<video>` element.
pub struct BrowserCamera {
    window: Window,
    preview: Option<HtmlVideoElement>,
}

impl BrowserCamera {
    pub fn new(window: Window, preview: Option<HtmlVideoElement>) -> Self {
        Self { window, preview }
    }

    fn issue(&self, constraints: &MediaConstraints) -> Result<Promise, PlatformError> {
        let devices = self
            .window
            .navigator()
            .media_devices()
            .map_err(platform_error)?;

        let video = Object::new();
        set(
            &video,
            "facingMode",
            &JsValue::from_str(constraints.facing_mode.as_str()),
        )?;
        set(&video, "width", &ideal(constraints.ideal_width)?)?;
        set(&video, "height", &ideal(constraints.ideal_height)?)?;

        let request = web_sys::MediaStreamConstraints::new();
        set(&request, "video", &video)?;
        set(&request, "audio", &JsValue::FALSE)?;

        devices
            .get_user_media_with_constraints(&request)
            .map_err(platform_error)
    }
}

fn ideal(value: u32) -> Result<JsValue, PlatformError> {
    let range = Object::new();
    set(&range, "ideal", &JsValue::from(value))?;
    Ok(range.into())
}

impl CameraPlatform for BrowserCamera {
    fn is_available(&self) -> bool {
        let navigator = self.window.navigator();
        match Reflect::get(&navigator, &JsValue::from_str("mediaDevices")) {
            Ok(devices) if devices.is_object() => has(&devices, "getUserMedia"),
            _ => false,
        }
    }

    fn request(&self, constraints: &MediaConstraints) -> PlatformCall<Box<dyn MediaStream>> {
        let promise = self.issue(constraints);
        let preview = self.preview.clone();

        Box::pin(async move {
            let value = JsFuture::from(promise?).await.map_err(platform_error)?;
            let stream: web_sys::MediaStream = value.dyn_into().map_err(|_| {
                PlatformError::new("TypeError", "getUserMedia did not resolve to a MediaStream")
            })?;

            if let Some(video) = &preview {
                video.set_src_object(Some(&stream));
            }
            Ok(Box::new(BrowserStream { stream, preview }) as Box<dyn MediaStream>)
        })
    }
}

struct BrowserStream {
    stream: web_sys::MediaStream,
    preview: Option<HtmlVideoElement>,
}

impl MediaStream for BrowserStream {
    fn stop_tracks(&mut self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }

        // A newer stream may already be attached.
        if let Some(video) = &self.preview {
            let attached = video.src_object().map(|s| s.id());
            if attached.as_deref() == Some(self.stream.id().as_str()) {
                video.set_src_object(None);
            }
        }
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// `navigator.credentials` with `publicKey` options.
pub struct BrowserCredentials {
    window: Window,
}

impl BrowserCredentials {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl CredentialPlatform for BrowserCredentials {
    fn is_available(&self) -> bool {
        has(&self.window, "PublicKeyCredential")
    }

    fn create(&self, options: CreationOptions) -> PlatformCall<CredentialId> {
        let promise = creation_options(&options).and_then(|public_key| {
            let request = web_sys::CredentialCreationOptions::new();
            set(&request, "publicKey", &public_key)?;
            self.window
                .navigator()
                .credentials()
                .create_with_options(&request)
                .map_err(platform_error)
        });
        settle(promise)
    }

    fn get(&self, options: RequestOptions) -> PlatformCall<CredentialId> {
        let promise = request_options(&options).and_then(|public_key| {
            let request = web_sys::CredentialRequestOptions::new();
            set(&request, "publicKey", &public_key)?;
            self.window
                .navigator()
                .credentials()
                .get_with_options(&request)
                .map_err(platform_error)
        });
        settle(promise)
    }
}

fn creation_options(options: &CreationOptions) -> Result<JsValue, PlatformError> {
    let rp = Object::new();
    set(&rp, "id", &JsValue::from_str(&options.rp.id))?;
    set(&rp, "name", &JsValue::from_str(&options.rp.name))?;

    let user = Object::new();
    set(&user, "id", &bytes(&options.user.id))?;
    set(&user, "name", &JsValue::from_str(&options.user.name))?;
    set(
        &user,
        "displayName",
        &JsValue::from_str(&options.user.display_name),
    )?;

    let params = Array::new();
    for alg in &options.algorithms {
        let param = Object::new();
        set(&param, "type", &JsValue::from_str("public-key"))?;
        set(&param, "alg", &JsValue::from_f64(*alg as f64))?;
        params.push(&param);
    }

    let selection = Object::new();
    set(
        &selection,
        "authenticatorAttachment",
        &JsValue::from_str(options.attachment.as_str()),
    )?;
    set(
        &selection,
        "residentKey",
        &JsValue::from_str(options.resident_key.as_str()),
    )?;
    set(
        &selection,
        "userVerification",
        &JsValue::from_str(options.user_verification.as_str()),
    )?;

    let public_key = Object::new();
    set(&public_key, "challenge", &bytes(&options.challenge))?;
    set(&public_key, "rp", &rp)?;
    set(&public_key, "user", &user)?;
    set(&public_key, "pubKeyCredParams", &params)?;
    set(&public_key, "authenticatorSelection", &selection)?;
    set(&public_key, "timeout", &millis(options.timeout))?;
    set(&public_key, "attestation", &JsValue::from_str("none"))?;
    Ok(public_key.into())
}

fn request_options(options: &RequestOptions) -> Result<JsValue, PlatformError> {
    let allow = Array::new();
    for id in &options.allow_credentials {
        let descriptor = Object::new();
        set(&descriptor, "type", &JsValue::from_str("public-key"))?;
        set(&descriptor, "id", &bytes(id.as_bytes()))?;
        allow.push(&descriptor);
    }

    let public_key = Object::new();
    set(&public_key, "challenge", &bytes(&options.challenge))?;
    set(&public_key, "rpId", &JsValue::from_str(&options.rp_id))?;
    set(&public_key, "allowCredentials", &allow)?;
    set(
        &public_key,
        "userVerification",
        &JsValue::from_str(options.user_verification.as_str()),
    )?;
    set(&public_key, "timeout", &millis(options.timeout))?;
    Ok(public_key.into())
}

/// Wait for a credential promise and extract `rawId`.
fn settle(promise: Result<Promise, PlatformError>) -> PlatformCall<CredentialId> {
    Box::pin(async move {
        let credential = JsFuture::from(promise?).await.map_err(platform_error)?;
        if credential.is_null() || credential.is_undefined() {
            return Err(PlatformError::new(
                "UnknownError",
                "The platform returned no credential.",
            ));
        }

        let raw = Reflect::get(&credential, &JsValue::from_str("rawId")).map_err(platform_error)?;
        let raw: ArrayBuffer = raw
            .dyn_into()
            .map_err(|_| PlatformError::new("TypeError", "Credential rawId is not an ArrayBuffer"))?;
        Ok(CredentialId::new(Uint8Array::new(&raw).to_vec()))
    })
}

// ============================================================================
// Timers
// ============================================================================

/// `window.setTimeout`.
pub struct TimeoutScheduler {
    window: Window,
}

impl TimeoutScheduler {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        let callback = Closure::once_into_js(move || task());
        let timeout = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);

        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                timeout,
            )
        {
            warn!(error = ?err, "setTimeout failed; task dropped");
        }
    }
}
