#![no_main]

//! Fuzz target for configuration document parsing
//!
//! Arbitrary YAML must produce credentials or an error, never a panic.
//!
//! Run with: cargo +nightly fuzz run fuzz_config

use libfuzzer_sys::fuzz_target;
use otpgate_core::yubikey::parse_credentials;
use otpgate_core::ProviderRegistry;

fuzz_target!(|data: &[u8]| {
    let _ = parse_credentials(data);
    let _ = ProviderRegistry::from_config(data);
});
