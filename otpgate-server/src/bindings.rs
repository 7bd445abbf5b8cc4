//! Static per-user binding store
//!
//! Loads the `mfa_bindings` section of the configuration document:
//!
//! ```yaml
//! mfa_bindings:
//!   alice:
//!     - provider: yubikey
//!       attributes:
//!         device: cccccckdvvul
//! ```

use std::collections::HashMap;

use otpgate_core::{MfaConfig, MfaError};
use serde::Deserialize;

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    mfa_bindings: Option<HashMap<String, Vec<MfaConfig>>>,
}

/// Device bindings keyed by username.
#[derive(Debug, Clone, Default)]
pub struct BindingStore {
    users: HashMap<String, Vec<MfaConfig>>,
}

impl BindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load bindings from the YAML configuration document.
    ///
    /// Empty or null documents and documents without a `mfa_bindings`
    /// section give an empty store.
    pub fn from_yaml(document: &[u8]) -> Result<Self, MfaError> {
        if document.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }

        let envelope: Option<Envelope> = serde_yaml::from_slice(document)?;
        Ok(Self {
            users: envelope
                .and_then(|envelope| envelope.mfa_bindings)
                .unwrap_or_default(),
        })
    }

    /// Replace the bindings of `user` (builder style).
    pub fn with_user(mut self, user: impl Into<String>, bindings: Vec<MfaConfig>) -> Self {
        self.users.insert(user.into(), bindings);
        self
    }

    /// Bindings of `user`; empty for unknown users.
    pub fn bindings_for(&self, user: &str) -> &[MfaConfig] {
        self.users.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of users with at least one entry.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_bindings() {
        let doc = br#"
mfa:
  yubikey:
    client_id: "1"
    secret_key: ""
mfa_bindings:
  alice:
    - provider: yubikey
      attributes:
        device: cccccckdvvul
    - provider: yubikey
      attributes:
        device: vvincvtgtlaf
  bob:
    - provider: totp
      attributes:
        secret: JBSWY3DPEHPK3PXP
"#;
        let store = BindingStore::from_yaml(doc).unwrap();
        assert_eq!(store.len(), 2);

        let alice = store.bindings_for("alice");
        assert_eq!(alice.len(), 2);
        assert_eq!(
            alice[1].attribute_string("device").as_deref(),
            Some("vvincvtgtlaf")
        );
        assert_eq!(store.bindings_for("bob")[0].provider, "totp");
        assert!(store.bindings_for("carol").is_empty());
    }

    #[test]
    fn test_missing_section_is_empty() {
        assert!(BindingStore::from_yaml(b"mfa: {}\n").unwrap().is_empty());
        assert!(BindingStore::from_yaml(b"").unwrap().is_empty());
        assert!(BindingStore::from_yaml(b"~\n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_bindings() {
        let result = BindingStore::from_yaml(b"mfa_bindings:\n  alice: 3\n");
        assert!(matches!(result, Err(MfaError::ConfigParse(_))));
    }
}
