//! Provider registry and the gateway's MFA chain.
//!
//! The registry is built explicitly during host startup: every known provider
//! is offered the configuration document, and those that find their section
//! are kept.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::binding::MfaConfig;
use crate::error::{MfaError, Result};
use crate::form::FormData;
use crate::provider::MfaProvider;

/// Every provider implementation known to this crate, unconfigured.
pub fn default_providers() -> Vec<Box<dyn MfaProvider>> {
    #[cfg(feature = "network")]
    {
        let yubikey: Box<dyn MfaProvider> = Box::new(crate::yubikey::YubikeyProvider::new());
        vec![yubikey]
    }
    #[cfg(not(feature = "network"))]
    {
        Vec::new()
    }
}

/// Result of a successful MFA check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MfaDecision {
    /// The user has no bindings, so no second factor is required
    NotRequired,
    /// A provider accepted the submitted second factor
    Accepted { provider: &'static str },
}

/// Configured MFA providers, in evaluation order.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn MfaProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure [`default_providers`] from `document`.
    pub fn from_config(document: &[u8]) -> Result<Self> {
        Self::configure(default_providers(), document)
    }

    /// Configure `candidates` from `document`, keeping the configured ones.
    ///
    /// Providers reporting [`MfaError::ProviderUnconfigured`] are left out;
    /// any other error aborts.
    pub fn configure(candidates: Vec<Box<dyn MfaProvider>>, document: &[u8]) -> Result<Self> {
        let mut registry = Self::new();

        for mut provider in candidates {
            match provider.configure(document) {
                Ok(()) => registry.register(provider)?,
                Err(MfaError::ProviderUnconfigured) => {
                    debug!(provider = provider.provider_id(), "Provider not configured, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        info!(providers = ?registry.provider_ids(), "MFA providers registered");
        Ok(registry)
    }

    /// Add an already configured provider.
    pub fn register(&mut self, provider: Box<dyn MfaProvider>) -> Result<()> {
        let id = provider.provider_id();
        if self.get(id).is_some() {
            return Err(MfaError::DuplicateProvider(id.to_string()));
        }
        self.providers.push(Arc::from(provider));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn MfaProvider>> {
        self.providers
            .iter()
            .find(|p| p.provider_id() == id)
            .cloned()
    }

    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.provider_id()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run the MFA chain for `user`.
    ///
    /// Users without bindings need no second factor. Otherwise providers are
    /// tried in order: the first success wins, `NoValidUserFound` moves on to
    /// the next provider and any other error is returned as is.
    #[instrument(level = "info", skip(self, form, bindings), fields(bindings = bindings.len()))]
    pub async fn validate_mfa(
        &self,
        form: &FormData,
        user: &str,
        bindings: &[MfaConfig],
    ) -> Result<MfaDecision> {
        if bindings.is_empty() {
            debug!("No MFA bindings, second factor not required");
            return Ok(MfaDecision::NotRequired);
        }

        for provider in &self.providers {
            match provider.validate_mfa(form, user, bindings).await {
                Ok(()) => {
                    return Ok(MfaDecision::Accepted {
                        provider: provider.provider_id(),
                    })
                }
                Err(MfaError::NoValidUserFound) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(MfaError::NoValidUserFound)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::yubikey::{MockVerifier, YubikeyProvider};

    const CONFIG: &[u8] = b"mfa:\n  yubikey:\n    client_id: \"1\"\n    secret_key: c2VjcmV0\n";
    const OTP: &str = "cccccckdvvuldteffujedteffujedteffujedteffuje";

    /// Provider with a fixed answer.
    struct StaticProvider {
        id: &'static str,
        outcome: fn() -> Result<()>,
    }

    #[async_trait]
    impl MfaProvider for StaticProvider {
        fn provider_id(&self) -> &'static str {
            self.id
        }

        fn configure(&mut self, _document: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn validate_mfa(&self, _: &FormData, _: &str, _: &[MfaConfig]) -> Result<()> {
            (self.outcome)()
        }
    }

    fn yubikey(mock: &MockVerifier) -> Box<dyn MfaProvider> {
        Box::new(YubikeyProvider::with_verifier_factory(Arc::new(mock.clone())))
    }

    fn bindings() -> Vec<MfaConfig> {
        vec![MfaConfig::new("yubikey").with_attribute("device", "cccccckdvvul")]
    }

    #[test]
    fn test_unconfigured_providers_are_skipped() {
        let registry =
            ProviderRegistry::configure(vec![yubikey(&MockVerifier::new())], b"listen: {}\n")
                .unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_configured_providers_are_registered() {
        let registry =
            ProviderRegistry::configure(vec![yubikey(&MockVerifier::new())], CONFIG).unwrap();
        assert_eq!(registry.provider_ids(), vec!["yubikey"]);
        assert!(registry.get("yubikey").is_some());
        assert!(registry.get("totp").is_none());
    }

    #[test]
    fn test_parse_error_aborts() {
        let result = ProviderRegistry::configure(vec![yubikey(&MockVerifier::new())], b"mfa: [");
        assert!(matches!(result, Err(MfaError::ConfigParse(_))));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ProviderRegistry::new();
        registry.register(yubikey(&MockVerifier::new())).unwrap();
        let result = registry.register(yubikey(&MockVerifier::new()));
        assert!(matches!(result, Err(MfaError::DuplicateProvider(id)) if id == "yubikey"));
    }

    #[cfg(feature = "network")]
    #[test]
    fn test_default_providers() {
        let ids: Vec<_> = default_providers().iter().map(|p| p.provider_id()).collect();
        assert_eq!(ids, vec!["yubikey"]);
    }

    #[tokio::test]
    async fn test_no_bindings_not_required() {
        let registry = ProviderRegistry::new();
        let decision = registry
            .validate_mfa(&FormData::new(), "alice", &[])
            .await
            .unwrap();
        assert_eq!(decision, MfaDecision::NotRequired);
    }

    #[tokio::test]
    async fn test_chain_accepts() {
        let mock = MockVerifier::new().accept(OTP);
        let registry = ProviderRegistry::configure(vec![yubikey(&mock)], CONFIG).unwrap();

        let form: FormData = [("yubikey-mfa-token", OTP)].into_iter().collect();
        let decision = registry
            .validate_mfa(&form, "alice", &bindings())
            .await
            .unwrap();
        assert_eq!(decision, MfaDecision::Accepted { provider: "yubikey" });
    }

    #[tokio::test]
    async fn test_chain_moves_past_no_valid_user() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Box::new(StaticProvider {
                id: "first",
                outcome: || Err(MfaError::NoValidUserFound),
            }))
            .unwrap();
        registry
            .register(Box::new(StaticProvider {
                id: "second",
                outcome: || Ok(()),
            }))
            .unwrap();

        let decision = registry
            .validate_mfa(&FormData::new(), "alice", &bindings())
            .await
            .unwrap();
        assert_eq!(decision, MfaDecision::Accepted { provider: "second" });
    }

    #[tokio::test]
    async fn test_chain_stops_on_fatal_error() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(yubikey(&MockVerifier::new().failing_init()))
            .unwrap();
        registry
            .register(Box::new(StaticProvider {
                id: "second",
                outcome: || Ok(()),
            }))
            .unwrap();

        let result = registry
            .validate_mfa(&FormData::new(), "alice", &bindings())
            .await;
        assert!(matches!(
            result,
            Err(MfaError::VerificationServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_chain_exhausted() {
        let registry = ProviderRegistry::configure(vec![yubikey(&MockVerifier::new())], CONFIG)
            .unwrap();
        let result = registry
            .validate_mfa(&FormData::new(), "alice", &bindings())
            .await;
        assert!(matches!(result, Err(MfaError::NoValidUserFound)));
    }
}
