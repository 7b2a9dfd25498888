#![no_main]

//! Fuzz target for DemoConfig::from_json()
//!
//! Run with: cargo +nightly fuzz run fuzz_config

use capgate_core::DemoConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };

    // Anything accepted must satisfy validation.
    if let Ok(config) = DemoConfig::from_json(json) {
        assert!(config.validate().is_ok());
        assert!(!config.preview_duration().is_zero());
    }
});
