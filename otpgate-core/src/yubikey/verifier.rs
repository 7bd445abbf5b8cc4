//! Contract between the Yubikey provider and the OTP validation service.

use async_trait::async_trait;
use thiserror::Error;

use super::config::YubikeyCredentials;

/// Message used by validation clients for OTPs outside the accepted length.
pub const WRONG_LENGTH_MESSAGE: &str = "OTP has wrong length.";

/// Outcome of a well-formed verification exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The OTP is valid and was not seen before
    Accepted,
    /// The OTP is well-formed but not a valid proof
    Rejected,
}

/// Status codes of the Yubico validation protocol (v2.0) other than `OK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    BadOtp,
    ReplayedOtp,
    BadSignature,
    MissingParameter,
    NoSuchClient,
    OperationNotAllowed,
    BackendError,
    NotEnoughAnswers,
    ReplayedRequest,
    Unknown(String),
}

impl ResponseStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "BAD_OTP" => Self::BadOtp,
            "REPLAYED_OTP" => Self::ReplayedOtp,
            "BAD_SIGNATURE" => Self::BadSignature,
            "MISSING_PARAMETER" => Self::MissingParameter,
            "NO_SUCH_CLIENT" => Self::NoSuchClient,
            "OPERATION_NOT_ALLOWED" => Self::OperationNotAllowed,
            "BACKEND_ERROR" => Self::BackendError,
            "NOT_ENOUGH_ANSWERS" => Self::NotEnoughAnswers,
            "REPLAYED_REQUEST" => Self::ReplayedRequest,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::BadOtp => "BAD_OTP",
            Self::ReplayedOtp => "REPLAYED_OTP",
            Self::BadSignature => "BAD_SIGNATURE",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::NoSuchClient => "NO_SUCH_CLIENT",
            Self::OperationNotAllowed => "OPERATION_NOT_ALLOWED",
            Self::BackendError => "BACKEND_ERROR",
            Self::NotEnoughAnswers => "NOT_ENOUGH_ANSWERS",
            Self::ReplayedRequest => "REPLAYED_REQUEST",
            Self::Unknown(code) => code,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::BadOtp => "the OTP is invalid",
            Self::ReplayedOtp => "the OTP is valid but has been used before",
            Self::BadSignature => "the request signature was rejected, the secret key is probably wrong",
            Self::MissingParameter => "the request lacks a parameter",
            Self::NoSuchClient => "the client identifier is unknown to the api server",
            Self::OperationNotAllowed => "the client is not allowed to verify OTPs",
            Self::BackendError => "the api server reported an internal error",
            Self::NotEnoughAnswers => "the api server could not reach enough sync servers",
            Self::ReplayedRequest => "the api server has seen this request before",
            Self::Unknown(_) => "unknown status sent by api server",
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}

#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("OTP has wrong length.")]
    WrongLength,

    #[error("Given string is not a valid Yubikey OTP. It contains invalid characters.")]
    InvalidCharacters,

    #[error("Invalid client identifier: {0}")]
    InvalidClientId(String),

    #[error("Invalid secret key, could not base64 decode: {0}")]
    InvalidSecretKey(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Verification request failed: {0}")]
    Transport(String),

    #[error("Malformed verification response: {0}")]
    MalformedResponse(String),

    #[error("Verification response signature does not match")]
    SignatureMismatch,

    #[error("Verification response does not echo the submitted {0}")]
    EchoMismatch(&'static str),

    #[error("Verification service answered {0}")]
    Status(ResponseStatus),

    /// Free-text error reported by a verification backend
    #[error("{0}")]
    Service(String),
}

impl VerifierError {
    /// Whether the submitted string was rejected for its length alone.
    ///
    /// Such errors mean the form field did not hold a usable OTP and the
    /// caller treats them as a non-match. Backends reporting free text are
    /// recognised by the message they use for this case.
    pub fn is_malformed_otp(&self) -> bool {
        match self {
            Self::WrongLength => true,
            Self::Service(message) => message.contains(WRONG_LENGTH_MESSAGE),
            _ => false,
        }
    }
}

/// A client of the OTP validation service.
#[async_trait]
pub trait OtpVerifier: Send + Sync {
    /// Submit `otp` for validation.
    async fn verify(&self, otp: &str) -> Result<Verdict, VerifierError>;
}

/// Builds verification clients from the provider's credentials.
///
/// A fresh client is created for every validation attempt.
pub trait VerifierFactory: Send + Sync {
    fn create(
        &self,
        credentials: &YubikeyCredentials,
    ) -> Result<Box<dyn OtpVerifier>, VerifierError>;
}
