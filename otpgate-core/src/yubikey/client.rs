//! Yubico validation protocol 2.0 client.
//!
//! Implements the `verify` call of the Yubico web service API:
//! <https://developers.yubico.com/yubikey-val/Validation_Protocol_V2.0.html>
//!
//! ## Features
//!
//! - OTP syntax checks before any network traffic
//! - HMAC-SHA1 request signing and response signature verification
//! - Nonce and OTP echo checks against response tampering
//! - Fallback across several API endpoints on transport errors

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha1::Sha1;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

use super::config::YubikeyCredentials;
use super::otp::Otp;
use super::verifier::{OtpVerifier, ResponseStatus, Verdict, VerifierError, VerifierFactory};

type HmacSha1 = Hmac<Sha1>;

/// Default Yubico cloud validation endpoint.
pub const DEFAULT_API_URL: &str = "https://api.yubico.com/wsapi/2.0/verify";

/// Default timeout for a single API request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Yubico validation client.
#[derive(Debug, Clone)]
pub struct YubicoClientConfig {
    /// Validation endpoints, tried in order on transport errors.
    pub api_urls: Vec<String>,
    /// Request timeout per endpoint.
    pub timeout: Duration,
    /// Refuse plain HTTP endpoints.
    pub https_only: bool,
}

impl Default for YubicoClientConfig {
    fn default() -> Self {
        Self {
            api_urls: parse_api_urls(std::env::var("YUBICO_API_URL").ok().as_deref()),
            timeout: DEFAULT_TIMEOUT,
            https_only: true,
        }
    }
}

/// Endpoint list from a comma-separated `YUBICO_API_URL` value.
///
/// Blank entries are dropped; an unset or blank value gives the Yubico cloud.
fn parse_api_urls(value: Option<&str>) -> Vec<String> {
    value
        .map(|urls| {
            urls.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|urls| !urls.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_API_URL.to_string()])
}

/// HTTP client honouring the timeout and scheme settings of `config`.
fn build_http_client(config: &YubicoClientConfig) -> Result<Client, VerifierError> {
    Client::builder()
        .timeout(config.timeout)
        .https_only(config.https_only)
        .build()
        .map_err(|e| {
            warn!(error = %e, "Failed to create HTTP client");
            VerifierError::Client(e.to_string())
        })
}

/// Client for one set of Yubico API credentials.
pub struct YubicoClient {
    http: Client,
    client_id: String,
    key: Zeroizing<Vec<u8>>,
    config: YubicoClientConfig,
}

impl YubicoClient {
    /// Create a client with the default endpoint configuration.
    pub fn new(credentials: &YubikeyCredentials) -> Result<Self, VerifierError> {
        Self::with_config(credentials, YubicoClientConfig::default())
    }

    /// Create a client with a custom endpoint configuration.
    pub fn with_config(
        credentials: &YubikeyCredentials,
        config: YubicoClientConfig,
    ) -> Result<Self, VerifierError> {
        let http = build_http_client(&config)?;
        Self::with_http(http, credentials, config)
    }

    /// Create a client sharing an existing HTTP connection pool.
    ///
    /// Fails when the client identifier is empty or the secret key is not
    /// valid base64. An empty secret key disables request signing.
    #[instrument(level = "debug", skip_all, fields(client_id = %credentials.client_id))]
    pub fn with_http(
        http: Client,
        credentials: &YubikeyCredentials,
        config: YubicoClientConfig,
    ) -> Result<Self, VerifierError> {
        if credentials.client_id.trim().is_empty() {
            return Err(VerifierError::InvalidClientId(
                "client identifier is empty".into(),
            ));
        }

        let key = BASE64
            .decode(credentials.secret_key.trim())
            .map(Zeroizing::new)
            .map_err(|e| VerifierError::InvalidSecretKey(e.to_string()))?;

        if config.api_urls.is_empty() {
            return Err(VerifierError::Client("no API endpoint configured".into()));
        }

        debug!(endpoints = config.api_urls.len(), "Yubico client created");
        Ok(Self {
            http,
            client_id: credentials.client_id.clone(),
            key,
            config,
        })
    }

    /// Sign `key=value` pairs (already sorted by key) with the API secret.
    fn sign<'a, I>(&self, params: I) -> Option<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if self.key.is_empty() {
            return None;
        }
        let mut mac = HmacSha1::new_from_slice(&self.key).ok()?;
        mac.update(canonical_string(params).as_bytes());
        Some(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Check the `h` parameter of a response against its other parameters.
    fn verify_response_signature(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<(), VerifierError> {
        if self.key.is_empty() {
            return Ok(());
        }

        let provided = params
            .get("h")
            .ok_or_else(|| VerifierError::MalformedResponse("missing signature".into()))?;
        let provided = BASE64
            .decode(provided)
            .map_err(|_| VerifierError::SignatureMismatch)?;

        let mut mac =
            HmacSha1::new_from_slice(&self.key).map_err(|_| VerifierError::SignatureMismatch)?;
        let signed = params
            .iter()
            .filter(|(k, _)| k.as_str() != "h")
            .map(|(k, v)| (k.as_str(), v.as_str()));
        mac.update(canonical_string(signed).as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| VerifierError::SignatureMismatch)
    }

    /// Send the request to each endpoint until one answers.
    async fn send(&self, query: &[(&str, &str)]) -> Result<String, VerifierError> {
        let mut last_error = None;

        for url in &self.config.api_urls {
            let start = Instant::now();
            let result = self.http.get(url).query(query).send().await;
            let latency_ms = start.elapsed().as_millis() as u64;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!(url = %url, error = %e, latency_ms, "Validation endpoint unreachable");
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                warn!(url = %url, status = %status, latency_ms, "Validation endpoint returned error status");
                last_error = Some(format!("{url} returned status {status}"));
                continue;
            }

            match response.text().await {
                Ok(body) => {
                    debug!(url = %url, latency_ms, "Received validation response");
                    return Ok(body);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to read validation response");
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(VerifierError::Transport(
            last_error.unwrap_or_else(|| "no endpoint answered".into()),
        ))
    }

    /// Map a response body to a verdict.
    fn interpret(&self, body: &str, otp: &str, nonce: &str) -> Result<Verdict, VerifierError> {
        let params = parse_response(body);

        let status = params
            .get("status")
            .ok_or_else(|| VerifierError::MalformedResponse("missing status".into()))?;

        let status = match status.as_str() {
            "OK" => None,
            code => Some(ResponseStatus::from_code(code)),
        };

        // Failures that carry no claim about the OTP need no authentication.
        if let Some(status) = &status {
            if !matches!(status, ResponseStatus::BadOtp | ResponseStatus::ReplayedOtp) {
                return Err(VerifierError::Status(status.clone()));
            }
        }

        self.verify_response_signature(&params)?;

        if params.get("otp").map(String::as_str) != Some(otp) {
            return Err(VerifierError::EchoMismatch("otp"));
        }
        if params.get("nonce").map(String::as_str) != Some(nonce) {
            return Err(VerifierError::EchoMismatch("nonce"));
        }

        match status {
            None => Ok(Verdict::Accepted),
            Some(ResponseStatus::BadOtp) => Ok(Verdict::Rejected),
            Some(other) => Err(VerifierError::Status(other)),
        }
    }
}

#[async_trait]
impl OtpVerifier for YubicoClient {
    #[instrument(level = "debug", skip_all, fields(client_id = %self.client_id))]
    async fn verify(&self, otp: &str) -> Result<Verdict, VerifierError> {
        let otp = Otp::parse(otp)?;
        let nonce = generate_nonce();

        let mut query = vec![
            ("id", self.client_id.as_str()),
            ("nonce", nonce.as_str()),
            ("otp", otp.as_str()),
        ];
        let signature = self.sign(query.iter().copied());
        if let Some(h) = &signature {
            query.push(("h", h.as_str()));
        }

        let body = self.send(&query).await?;
        let verdict = self.interpret(&body, otp.as_str(), &nonce);

        match &verdict {
            Ok(v) => debug!(public_id = otp.public_id(), verdict = ?v, "OTP verified"),
            Err(e) => warn!(public_id = otp.public_id(), error = %e, "OTP verification error"),
        }
        verdict
    }
}

/// Builds [`YubicoClient`]s against the configured endpoints.
///
/// The HTTP client is built on first use and shared by every
/// [`YubicoClient`] created afterwards.
#[derive(Debug, Clone, Default)]
pub struct YubicoCloud {
    config: YubicoClientConfig,
    http: Arc<OnceLock<Client>>,
}

impl YubicoCloud {
    pub fn new(config: YubicoClientConfig) -> Self {
        Self {
            config,
            http: Arc::default(),
        }
    }

    pub fn config(&self) -> &YubicoClientConfig {
        &self.config
    }

    /// The shared HTTP client, built on first call.
    fn http_client(&self) -> Result<Client, VerifierError> {
        if let Some(http) = self.http.get() {
            return Ok(http.clone());
        }
        let http = build_http_client(&self.config)?;
        Ok(self.http.get_or_init(|| http).clone())
    }
}

impl VerifierFactory for YubicoCloud {
    fn create(
        &self,
        credentials: &YubikeyCredentials,
    ) -> Result<Box<dyn OtpVerifier>, VerifierError> {
        let http = self.http_client()?;
        let client = YubicoClient::with_http(http, credentials, self.config.clone())?;
        Ok(Box::new(client))
    }
}

/// Random 32 character nonce.
fn generate_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// `k1=v1&k2=v2` in the given order, without URL encoding.
fn canonical_string<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    params
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse `key=value` lines. Values may contain `=` (base64 signatures).
fn parse_response(body: &str) -> BTreeMap<String, String> {
    body.lines()
        .filter_map(|line| line.trim().split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
