//! Yubikey OTP provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::config::{parse_credentials, YubikeyCredentials};
use super::verifier::{Verdict, VerifierFactory};
use crate::binding::MfaConfig;
use crate::error::{MfaError, Result};
use crate::form::FormData;
use crate::provider::{MfaProvider, MFA_LOGIN_FIELD_NAME};

/// Identifier of the Yubikey provider.
pub const PROVIDER_ID: &str = "yubikey";

/// Binding attribute holding the token's public identity.
pub const DEVICE_ATTRIBUTE: &str = "device";

/// Second factor backed by Yubikey OTPs.
///
/// For every `yubikey` binding of the user, the submitted form is searched for
/// a login field whose value starts with the binding's `device` prefix. The
/// first OTP accepted by the validation service authenticates the user.
///
/// ## Example
///
/// ```no_run
/// use otpgate_core::{FormData, MfaConfig, MfaProvider, YubikeyProvider};
///
/// # async fn example() -> otpgate_core::Result<()> {
/// let mut provider = YubikeyProvider::new();
/// provider.configure(b"mfa:\n  yubikey:\n    client_id: \"1\"\n    secret_key: \"\"\n")?;
///
/// let bindings = vec![MfaConfig::new("yubikey").with_attribute("device", "cccccckdvvul")];
/// let form = FormData::from_urlencoded(b"yubikey-mfa-token=cccccckdvvul...");
/// provider.validate_mfa(&form, "alice", &bindings).await?;
/// # Ok(())
/// # }
/// ```
pub struct YubikeyProvider {
    credentials: YubikeyCredentials,
    verifiers: Arc<dyn VerifierFactory>,
    field_suffix: String,
}

impl YubikeyProvider {
    /// Provider validating against the Yubico cloud (or `YUBICO_API_URL`).
    #[cfg(feature = "network")]
    pub fn new() -> Self {
        Self::with_verifier_factory(Arc::new(super::client::YubicoCloud::default()))
    }

    /// Provider validating through `verifiers`.
    pub fn with_verifier_factory(verifiers: Arc<dyn VerifierFactory>) -> Self {
        Self {
            credentials: YubikeyCredentials::default(),
            verifiers,
            field_suffix: MFA_LOGIN_FIELD_NAME.to_string(),
        }
    }

    /// Use a different login field suffix than [`MFA_LOGIN_FIELD_NAME`].
    pub fn with_field_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.field_suffix = suffix.into();
        self
    }

    /// Set credentials directly instead of through [`MfaProvider::configure`].
    pub fn with_credentials(mut self, credentials: YubikeyCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn credentials(&self) -> &YubikeyCredentials {
        &self.credentials
    }

    pub fn field_suffix(&self) -> &str {
        &self.field_suffix
    }
}

#[cfg(feature = "network")]
impl Default for YubikeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for YubikeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YubikeyProvider")
            .field("credentials", &self.credentials)
            .field("field_suffix", &self.field_suffix)
            .finish_non_exhaustive()
    }
}

/// Find the OTP field for a device in the submitted form.
///
/// A field qualifies when its name ends with `suffix` and its value starts
/// with `device`. When several fields qualify the last one in form order is
/// used.
pub fn find_candidate<'f>(form: &'f FormData, suffix: &str, device: &str) -> Option<&'f str> {
    let mut candidate = None;
    for (key, value) in form.iter() {
        if key.ends_with(suffix) && value.starts_with(device) {
            candidate = Some(value);
        }
    }
    candidate
}

#[async_trait]
impl MfaProvider for YubikeyProvider {
    fn provider_id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn configure(&mut self, document: &[u8]) -> Result<()> {
        let credentials = parse_credentials(document)?;
        info!(client_id = %credentials.client_id, "Yubikey provider configured");
        self.credentials = credentials;
        Ok(())
    }

    #[instrument(
        level = "info",
        skip(self, form, bindings),
        fields(provider = PROVIDER_ID, bindings = bindings.len())
    )]
    async fn validate_mfa(
        &self,
        form: &FormData,
        user: &str,
        bindings: &[MfaConfig],
    ) -> Result<()> {
        let verifier = self.verifiers.create(&self.credentials).map_err(|e| {
            warn!(error = %e, "Unable to create Yubikey client");
            MfaError::VerificationServiceUnavailable(e)
        })?;

        for (index, binding) in bindings.iter().enumerate() {
            if binding.provider != PROVIDER_ID {
                continue;
            }

            let device = match binding.attribute_string(DEVICE_ATTRIBUTE) {
                Some(device) if !device.is_empty() => device,
                _ => {
                    warn!(binding = index, "Yubikey binding without device attribute, skipping");
                    continue;
                }
            };

            let Some(otp) = find_candidate(form, &self.field_suffix, &device) else {
                debug!(binding = index, device = %device, "No OTP field for device");
                continue;
            };

            match verifier.verify(otp).await {
                Ok(Verdict::Accepted) => {
                    info!(binding = index, device = %device, "Yubikey OTP accepted");
                    return Ok(());
                }
                Ok(Verdict::Rejected) => {
                    debug!(binding = index, device = %device, "Yubikey OTP rejected");
                }
                Err(e) if e.is_malformed_otp() => {
                    debug!(binding = index, device = %device, "Candidate is not an OTP, skipping");
                }
                Err(e) => {
                    warn!(binding = index, device = %device, error = %e, "OTP verification failed");
                    return Err(MfaError::VerificationFailed(e));
                }
            }
        }

        Err(MfaError::NoValidUserFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yubikey::mock::{MockResponse, MockVerifier};

    const DEVICE: &str = "vvincvtgtlaf";
    const OTP: &str = "vvincvtgtlaftbkcxfddcllffjnhlktkelkcerafebv";
    const CONFIG: &[u8] = b"mfa:\n  yubikey:\n    client_id: \"12345\"\n    secret_key: c2VjcmV0\n";

    fn provider(mock: &MockVerifier) -> YubikeyProvider {
        let mut provider = YubikeyProvider::with_verifier_factory(Arc::new(mock.clone()));
        provider.configure(CONFIG).unwrap();
        provider
    }

    fn binding(device: &str) -> MfaConfig {
        MfaConfig::new(PROVIDER_ID).with_attribute(DEVICE_ATTRIBUTE, device)
    }

    fn form(fields: &[(&str, &str)]) -> FormData {
        fields.iter().copied().collect()
    }

    #[test]
    fn test_provider_id() {
        let provider = YubikeyProvider::with_verifier_factory(Arc::new(MockVerifier::new()));
        assert_eq!(provider.provider_id(), "yubikey");
    }

    #[test]
    fn test_configure_is_idempotent() {
        let mut provider = YubikeyProvider::with_verifier_factory(Arc::new(MockVerifier::new()));
        provider.configure(CONFIG).unwrap();
        provider
            .configure(b"mfa:\n  yubikey:\n    client_id: \"999\"\n    secret_key: b3RoZXI=\n")
            .unwrap();

        assert_eq!(provider.credentials().client_id, "999");
        assert_eq!(provider.credentials().secret_key, "b3RoZXI=");
    }

    #[test]
    fn test_configure_unconfigured_keeps_state() {
        let mut provider = YubikeyProvider::with_verifier_factory(Arc::new(MockVerifier::new()));
        provider.configure(CONFIG).unwrap();

        let result = provider.configure(b"mfa:\n  totp:\n    issuer: x\n");
        assert!(matches!(result, Err(MfaError::ProviderUnconfigured)));
        assert_eq!(provider.credentials().client_id, "12345");

        let result = provider.configure(b"mfa: [");
        assert!(matches!(result, Err(MfaError::ConfigParse(_))));
        assert_eq!(provider.credentials().client_id, "12345");
    }

    #[tokio::test]
    async fn test_builder_credentials_and_suffix() {
        let mock = MockVerifier::new().accept(OTP);
        let provider = YubikeyProvider::with_verifier_factory(Arc::new(mock.clone()))
            .with_credentials(YubikeyCredentials::new("777", ""))
            .with_field_suffix("otp");
        assert_eq!(provider.field_suffix(), "otp");
        assert_eq!(provider.credentials().client_id, "777");

        // The default suffix no longer matches
        let f = form(&[("yubikey-mfa-token", OTP)]);
        let result = provider.validate_mfa(&f, "luzifer", &[binding(DEVICE)]).await;
        assert!(matches!(result, Err(MfaError::NoValidUserFound)));

        let f = form(&[("mfa-otp", OTP)]);
        provider
            .validate_mfa(&f, "luzifer", &[binding(DEVICE)])
            .await
            .unwrap();
        assert_eq!(mock.created_with().last().unwrap().client_id, "777");
    }

    #[test]
    fn test_find_candidate_prefix_and_suffix() {
        let f = form(&[
            ("username", "ccccccoriandxyz123456"),
            ("yubikey-mfa-token", "ccccccoriandxyz123456"),
            ("totp-mfa-token", "123456"),
        ]);
        assert_eq!(
            find_candidate(&f, MFA_LOGIN_FIELD_NAME, "ccccccoriand"),
            Some("ccccccoriandxyz123456")
        );
        assert_eq!(find_candidate(&f, MFA_LOGIN_FIELD_NAME, "cccccckdvvul"), None);
    }

    #[test]
    fn test_find_candidate_last_match_wins() {
        let f = form(&[
            ("a-mfa-token", "ccccccoriand-first"),
            ("b-mfa-token", "ccccccoriand-second"),
        ]);
        assert_eq!(
            find_candidate(&f, MFA_LOGIN_FIELD_NAME, "ccccccoriand"),
            Some("ccccccoriand-second")
        );
    }

    #[test]
    fn test_find_candidate_custom_suffix() {
        let f = form(&[("mfa-otp", "ccccccoriandxyz123456")]);
        assert_eq!(find_candidate(&f, MFA_LOGIN_FIELD_NAME, "ccccccoriand"), None);
        assert_eq!(
            find_candidate(&f, "otp", "ccccccoriand"),
            Some("ccccccoriandxyz123456")
        );
    }

    #[tokio::test]
    async fn test_accepts_matching_otp() {
        let mock = MockVerifier::new().accept(OTP);
        let provider = provider(&mock);

        let f = form(&[("yubikey-mfa-token", OTP)]);
        provider
            .validate_mfa(&f, "luzifer", &[binding(DEVICE)])
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec![OTP]);
        assert_eq!(mock.created_with()[0].client_id, "12345");
    }

    #[tokio::test]
    async fn test_candidate_submitted_verbatim() {
        let mock = MockVerifier::new().accept("ccccccoriandxyz123456");
        let provider = provider(&mock).with_field_suffix("mfa-otp");

        let f = form(&[("mfa-otp", "ccccccoriandxyz123456")]);
        provider
            .validate_mfa(&f, "alice", &[binding("ccccccoriand")])
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec!["ccccccoriandxyz123456"]);
    }

    #[tokio::test]
    async fn test_other_providers_are_ignored() {
        let mock = MockVerifier::new().with_fallback(MockResponse::Accept);
        let provider = provider(&mock);

        let bindings = vec![
            MfaConfig::new("totp").with_attribute("secret", "JBSWY3DPEHPK3PXP"),
            MfaConfig::new("duo").with_attribute(DEVICE_ATTRIBUTE, DEVICE),
        ];
        let f = form(&[("yubikey-mfa-token", OTP), ("totp-mfa-token", "123456")]);

        let result = provider.validate_mfa(&f, "alice", &bindings).await;
        assert!(matches!(result, Err(MfaError::NoValidUserFound)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_candidate_is_no_valid_user() {
        let mock = MockVerifier::new().with_fallback(MockResponse::Accept);
        let provider = provider(&mock);

        let f = form(&[("username", "alice"), ("yubikey-mfa-token", "cccccckdvvul...")]);
        let result = provider
            .validate_mfa(&f, "alice", &[binding(DEVICE), binding("ccccccoriand")])
            .await;

        assert!(matches!(result, Err(MfaError::NoValidUserFound)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_bindings_is_no_valid_user() {
        let mock = MockVerifier::new();
        let provider = provider(&mock);

        let result = provider.validate_mfa(&FormData::new(), "alice", &[]).await;
        assert!(matches!(result, Err(MfaError::NoValidUserFound)));
    }

    #[tokio::test]
    async fn test_wrong_length_continues() {
        let short = "ccccccoriandxyz";
        let mock = MockVerifier::new()
            .respond(short, MockResponse::Error("OTP has wrong length.".into()))
            .accept(OTP);
        let provider = provider(&mock);

        let f = form(&[("a-mfa-token", short), ("b-mfa-token", OTP)]);
        provider
            .validate_mfa(&f, "alice", &[binding("ccccccoriand"), binding(DEVICE)])
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec![short, OTP]);
    }

    #[tokio::test]
    async fn test_typed_wrong_length_continues() {
        let mock = MockVerifier::new().with_fallback(MockResponse::WrongLength);
        let provider = provider(&mock);

        let f = form(&[("yubikey-mfa-token", "vvincvtgtlafshort")]);
        let result = provider.validate_mfa(&f, "alice", &[binding(DEVICE)]).await;
        assert!(matches!(result, Err(MfaError::NoValidUserFound)));
    }

    #[tokio::test]
    async fn test_rejected_then_accepted() {
        let second = "cccccckdvvuldteffujedteffujedteffujedteffuje";
        let mock = MockVerifier::new().reject(OTP).accept(second);
        let provider = provider(&mock);

        let f = form(&[("first-mfa-token", OTP), ("second-mfa-token", second)]);
        provider
            .validate_mfa(&f, "alice", &[binding(DEVICE), binding("cccccckdvvul")])
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec![OTP, second]);
    }

    #[tokio::test]
    async fn test_accept_stops_evaluation() {
        let mock = MockVerifier::new().with_fallback(MockResponse::Accept);
        let provider = provider(&mock);

        let f = form(&[("yubikey-mfa-token", OTP)]);
        provider
            .validate_mfa(&f, "alice", &[binding(DEVICE), binding(DEVICE)])
            .await
            .unwrap();

        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_service_error_aborts() {
        let second = "cccccckdvvuldteffujedteffujedteffujedteffuje";
        let mock = MockVerifier::new()
            .respond(OTP, MockResponse::Error("BACKEND_ERROR".into()))
            .accept(second);
        let provider = provider(&mock);

        let f = form(&[("first-mfa-token", OTP), ("second-mfa-token", second)]);
        let result = provider
            .validate_mfa(&f, "alice", &[binding(DEVICE), binding("cccccckdvvul")])
            .await;

        assert!(matches!(result, Err(MfaError::VerificationFailed(_))));
        assert_eq!(mock.calls(), vec![OTP]);
    }

    #[tokio::test]
    async fn test_client_init_failure() {
        let mock = MockVerifier::new().failing_init();
        let provider = provider(&mock);

        let f = form(&[("yubikey-mfa-token", OTP)]);
        let result = provider.validate_mfa(&f, "alice", &[binding(DEVICE)]).await;

        assert!(matches!(
            result,
            Err(MfaError::VerificationServiceUnavailable(_))
        ));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_binding_without_device_is_skipped() {
        let mock = MockVerifier::new().with_fallback(MockResponse::Accept);
        let provider = provider(&mock);

        let f = form(&[("yubikey-mfa-token", OTP)]);
        let bindings = vec![
            MfaConfig::new(PROVIDER_ID),
            MfaConfig::new(PROVIDER_ID).with_attribute(DEVICE_ATTRIBUTE, ""),
        ];
        let result = provider.validate_mfa(&f, "alice", &bindings).await;

        assert!(matches!(result, Err(MfaError::NoValidUserFound)));
        assert!(mock.calls().is_empty());
    }
}
