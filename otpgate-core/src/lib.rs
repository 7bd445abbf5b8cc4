//! otpgate Core - Yubikey OTP second factor for MFA gateways
//!
//! This crate decides whether a submitted login form carries a valid Yubikey
//! one-time password for one of the user's enrolled tokens. The OTP itself is
//! checked by a Yubico validation service; this crate owns finding the OTP
//! field, matching it to the right device binding and interpreting the
//! service's answer.
//!
//! # Features
//!
//! - Provider contract shared by all MFA providers ([`MfaProvider`])
//! - Explicit provider registry with the gateway's first-success chain
//! - Yubico validation protocol 2.0 client with signed requests
//! - Scripted mock verifier for tests
//!
//! # Example
//!
//! ```no_run
//! use otpgate_core::{FormData, MfaConfig, MfaDecision, ProviderRegistry};
//!
//! # async fn example() -> otpgate_core::Result<()> {
//! let config = std::fs::read("config.yaml").unwrap_or_default();
//! let registry = ProviderRegistry::from_config(&config)?;
//!
//! let bindings = vec![MfaConfig::new("yubikey").with_attribute("device", "cccccckdvvul")];
//! let form = FormData::from_urlencoded(b"yubikey-mfa-token=cccccckdvvuldteffujedteffujedteffujedteffuje");
//!
//! match registry.validate_mfa(&form, "alice", &bindings).await? {
//!     MfaDecision::Accepted { provider } => println!("accepted by {provider}"),
//!     MfaDecision::NotRequired => println!("no second factor configured"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod error;
pub mod form;
pub mod provider;
pub mod registry;
pub mod yubikey;

// Re-export main types for convenience
pub use binding::MfaConfig;
pub use error::{MfaError, Result};
pub use form::FormData;
pub use provider::{MfaProvider, MFA_LOGIN_FIELD_NAME};
pub use registry::{default_providers, MfaDecision, ProviderRegistry};
pub use yubikey::{MockResponse, MockVerifier, YubikeyCredentials, YubikeyProvider};

#[cfg(feature = "network")]
pub use yubikey::{YubicoClient, YubicoCloud};
