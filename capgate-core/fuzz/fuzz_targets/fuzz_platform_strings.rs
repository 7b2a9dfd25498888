#![no_main]

//! Fuzz target for the string inputs the page receives from the platform:
//! user agents, error names and the persisted credential id.
//!
//! Run with: cargo +nightly fuzz run fuzz_platform_strings

use capgate_core::{
    BiometricErrorKind, BrowserFamily, CameraErrorKind, Capability, CredentialId, Remediation,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    let browser = BrowserFamily::detect(&input);
    for capability in [Capability::Camera, Capability::Biometric] {
        assert!(!Remediation::for_browser(browser, capability).steps.is_empty());
    }

    let _ = CameraErrorKind::classify(&input);
    let _ = BiometricErrorKind::classify(&input);

    // Decoding then encoding must be lossless for accepted ids.
    if let Ok(id) = CredentialId::from_base64url(&input) {
        let again = CredentialId::from_base64url(&id.to_base64url());
        assert_eq!(again.ok(), Some(id));
    }
});
