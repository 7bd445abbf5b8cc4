//! Yubikey section of the configuration document.
//!
//! ```yaml
//! mfa:
//!   yubikey:
//!     client_id: "12345"
//!     secret_key: "c2VjcmV0"
//! ```

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{MfaError, Result};

/// Credentials for the Yubico validation service.
///
/// The secret key is base64 as issued by Yubico; it is wiped from memory on drop.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct YubikeyCredentials {
    /// API client identifier
    #[serde(default)]
    pub client_id: String,
    /// Base64 encoded API secret key
    #[serde(default)]
    pub secret_key: String,
}

impl YubikeyCredentials {
    pub fn new(client_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl std::fmt::Debug for YubikeyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YubikeyCredentials")
            .field("client_id", &self.client_id)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    mfa: Option<MfaSection>,
}

#[derive(Deserialize)]
struct MfaSection {
    #[serde(default)]
    yubikey: Option<YubikeyCredentials>,
}

/// Extract the `mfa.yubikey` section from a YAML document.
///
/// An empty or null document, a missing `mfa` section or a missing (or
/// null) `yubikey` key all yield [`MfaError::ProviderUnconfigured`].
pub fn parse_credentials(document: &[u8]) -> Result<YubikeyCredentials> {
    if document.iter().all(u8::is_ascii_whitespace) {
        return Err(MfaError::ProviderUnconfigured);
    }

    let envelope: Option<Envelope> = serde_yaml::from_slice(document)?;

    envelope
        .and_then(|envelope| envelope.mfa)
        .and_then(|mfa| mfa.yubikey)
        .ok_or(MfaError::ProviderUnconfigured)
}
