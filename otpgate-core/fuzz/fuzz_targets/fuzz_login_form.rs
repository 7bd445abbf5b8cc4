#![no_main]

//! Fuzz target for login form decoding and OTP candidate selection
//!
//! Run with: cargo +nightly fuzz run fuzz_login_form

use libfuzzer_sys::fuzz_target;
use otpgate_core::yubikey::{find_candidate, Otp, ResponseStatus};
use otpgate_core::{FormData, MFA_LOGIN_FIELD_NAME};

fuzz_target!(|data: &[u8]| {
    let form = FormData::from_urlencoded(data);

    for (key, value) in form.iter() {
        if let Ok(otp) = Otp::parse(value) {
            // A parsed OTP always splits into public id and ciphertext
            assert_eq!(otp.public_id().len() + otp.ciphertext().len(), value.len());
            let _ = find_candidate(&form, MFA_LOGIN_FIELD_NAME, otp.public_id());
        }
        let _ = ResponseStatus::from_code(key);
    }
});
