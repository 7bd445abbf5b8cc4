//! Scripted verifier for tests and local development.
//! WARNING: Do not use in production - accepts whatever it is told to accept!

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::config::YubikeyCredentials;
use super::verifier::{OtpVerifier, Verdict, VerifierError, VerifierFactory};

/// Scripted answer of the mock verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    Accept,
    Reject,
    /// Typed wrong-length error
    WrongLength,
    /// Free-text backend error
    Error(String),
}

#[derive(Debug)]
struct MockState {
    responses: HashMap<String, MockResponse>,
    fallback: MockResponse,
    fail_init: bool,
    calls: Vec<String>,
    credentials: Vec<YubikeyCredentials>,
}

/// Mock verification service.
///
/// Clones share their script and call log, so a test can keep one handle
/// while the provider owns another.
#[derive(Debug, Clone)]
pub struct MockVerifier {
    state: Arc<Mutex<MockState>>,
}

impl MockVerifier {
    /// A verifier that rejects every OTP until told otherwise.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                responses: HashMap::new(),
                fallback: MockResponse::Reject,
                fail_init: false,
                calls: Vec::new(),
                credentials: Vec::new(),
            })),
        }
    }

    /// Script the answer for one OTP.
    pub fn respond(self, otp: impl Into<String>, response: MockResponse) -> Self {
        self.lock().responses.insert(otp.into(), response);
        self
    }

    pub fn accept(self, otp: impl Into<String>) -> Self {
        self.respond(otp, MockResponse::Accept)
    }

    pub fn reject(self, otp: impl Into<String>) -> Self {
        self.respond(otp, MockResponse::Reject)
    }

    /// Answer for OTPs without a scripted response.
    pub fn with_fallback(self, response: MockResponse) -> Self {
        self.lock().fallback = response;
        self
    }

    /// Make client creation fail, as with unusable credentials.
    pub fn failing_init(self) -> Self {
        self.lock().fail_init = true;
        self
    }

    /// OTPs submitted so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Credentials of every client created so far.
    pub fn created_with(&self) -> Vec<YubikeyCredentials> {
        self.lock().credentials.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl VerifierFactory for MockVerifier {
    fn create(
        &self,
        credentials: &YubikeyCredentials,
    ) -> Result<Box<dyn OtpVerifier>, VerifierError> {
        let mut state = self.lock();
        if state.fail_init {
            return Err(VerifierError::InvalidSecretKey("mock configured to fail".into()));
        }
        state.credentials.push(credentials.clone());
        drop(state);
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl OtpVerifier for MockVerifier {
    async fn verify(&self, otp: &str) -> Result<Verdict, VerifierError> {
        let mut state = self.lock();
        state.calls.push(otp.to_string());

        let response = state
            .responses
            .get(otp)
            .cloned()
            .unwrap_or_else(|| state.fallback.clone());

        match response {
            MockResponse::Accept => Ok(Verdict::Accepted),
            MockResponse::Reject => Ok(Verdict::Rejected),
            MockResponse::WrongLength => Err(VerifierError::WrongLength),
            MockResponse::Error(message) => Err(VerifierError::Service(message)),
        }
    }
}
