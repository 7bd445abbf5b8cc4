//! Yubikey OTP second factor.
//!
//! The provider matches OTP fields of the submitted login form against the
//! user's enrolled tokens and delegates the cryptographic check to a
//! validation service:
//!
//! - **Yubico cloud** (or a self-hosted validation server) via [`YubicoClient`]
//! - **Mock** - scripted verifier for tests
//!
//! ## Quick Start
//!
//! ```no_run
//! use otpgate_core::yubikey::{YubicoClient, YubikeyCredentials, OtpVerifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let creds = YubikeyCredentials::new("12345", "c2VjcmV0");
//! let client = YubicoClient::new(&creds)?;
//! let verdict = client.verify("cccccckdvvuldteffujedteffujedteffujedteffuje").await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "network")]
mod client;
mod config;
mod mock;
mod otp;
mod provider;
mod verifier;

#[cfg(feature = "network")]
pub use client::{YubicoClient, YubicoClientConfig, YubicoCloud, DEFAULT_API_URL};
pub use config::{parse_credentials, YubikeyCredentials};
pub use mock::{MockResponse, MockVerifier};
pub use otp::{Otp, MAX_OTP_LENGTH, MIN_OTP_LENGTH, MODHEX_ALPHABET, PUBLIC_ID_LENGTH};
pub use provider::{find_candidate, YubikeyProvider, DEVICE_ATTRIBUTE, PROVIDER_ID};
pub use verifier::{
    OtpVerifier, ResponseStatus, Verdict, VerifierError, VerifierFactory, WRONG_LENGTH_MESSAGE,
};
