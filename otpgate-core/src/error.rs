use thiserror::Error;

use crate::yubikey::VerifierError;

#[derive(Error, Debug)]
pub enum MfaError {
    /// The provider has no section in the configuration document and should
    /// not be registered.
    #[error("MFA provider not configured")]
    ProviderUnconfigured,

    #[error("MFA provider registered twice: {0}")]
    DuplicateProvider(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Verification service unavailable: {0}")]
    VerificationServiceUnavailable(#[source] VerifierError),

    #[error("OTP verification failed: {0}")]
    VerificationFailed(#[source] VerifierError),

    #[error("No valid user found")]
    NoValidUserFound,
}

impl MfaError {
    /// Whether this error is the expected "authentication failed" outcome
    /// rather than a failure of the authentication system itself.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::NoValidUserFound)
    }
}

impl From<serde_yaml::Error> for MfaError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MfaError>;
