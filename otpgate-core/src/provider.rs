//! The contract every MFA provider implements.

use async_trait::async_trait;

use crate::binding::MfaConfig;
use crate::error::Result;
use crate::form::FormData;

/// Suffix shared by all provider login fields.
///
/// Any form field whose name ends with this suffix may carry a second factor,
/// which lets several providers contribute fields to the same login form
/// (`yubikey-mfa-token`, `totp-mfa-token`, ...).
pub const MFA_LOGIN_FIELD_NAME: &str = "mfa-token";

/// A pluggable MFA verification strategy.
///
/// Providers are configured once at startup and shared read-only afterwards,
/// so implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait MfaProvider: Send + Sync {
    /// Unique identifier of this provider within a registry.
    fn provider_id(&self) -> &'static str;

    /// Load the provider settings from the raw configuration document.
    ///
    /// Returns [`MfaError::ProviderUnconfigured`](crate::MfaError::ProviderUnconfigured)
    /// when the document has no section for this provider. Calling it again
    /// replaces any previously loaded settings.
    fn configure(&mut self, document: &[u8]) -> Result<()>;

    /// Check whether `form` carries a valid second factor for `user`.
    ///
    /// `bindings` is the complete list of the user's bindings, including
    /// those of other providers, which must be ignored.
    async fn validate_mfa(&self, form: &FormData, user: &str, bindings: &[MfaConfig])
        -> Result<()>;
}
