//! Yubikey OTP format.
//!
//! An OTP is a modhex string made of the token's public identity followed by
//! a 32 character encrypted part. Standard tokens use a 12 character public
//! identity, giving 44 character OTPs.

use super::verifier::VerifierError;

/// Shortest accepted OTP (empty public identity).
pub const MIN_OTP_LENGTH: usize = 32;

/// Longest accepted OTP (16 character public identity).
pub const MAX_OTP_LENGTH: usize = 48;

/// Length of the encrypted part at the end of every OTP.
const CIPHERTEXT_LENGTH: usize = 32;

/// Public identity length of factory-programmed tokens.
pub const PUBLIC_ID_LENGTH: usize = 12;

/// The modhex alphabet, in hex digit order.
pub const MODHEX_ALPHABET: &str = "cbdefghijklnrtuv";

/// A syntactically valid Yubikey OTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp<'a> {
    raw: &'a str,
}

impl<'a> Otp<'a> {
    /// Check length and alphabet of `raw`.
    pub fn parse(raw: &'a str) -> Result<Self, VerifierError> {
        if !(MIN_OTP_LENGTH..=MAX_OTP_LENGTH).contains(&raw.len()) {
            return Err(VerifierError::WrongLength);
        }

        if !raw.chars().all(is_modhex) {
            return Err(VerifierError::InvalidCharacters);
        }

        Ok(Self { raw })
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// The token's public identity (everything before the encrypted part).
    pub fn public_id(&self) -> &'a str {
        &self.raw[..self.raw.len() - CIPHERTEXT_LENGTH]
    }

    /// The encrypted part.
    pub fn ciphertext(&self) -> &'a str {
        &self.raw[self.raw.len() - CIPHERTEXT_LENGTH..]
    }
}

fn is_modhex(c: char) -> bool {
    MODHEX_ALPHABET.contains(c)
}
