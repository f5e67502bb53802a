use crate::constants::{DEFAULT_NONCE_LENGTH, MIN_NONCE_BYTES};
use crate::core::source::Source;
use crate::error::CspError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use getrandom::getrandom;
use std::ops::Deref;

/// Produces unpredictable base64 nonces suitable for `'nonce-...'` sources
/// or CSRF-style tokens.
///
/// A CSP nonce must not be guessable, so it is drawn from the operating
/// system CSPRNG. Requests for fewer than 16 bytes are raised to 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceGenerator {
    length: usize,
}

impl NonceGenerator {
    #[inline]
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(MIN_NONCE_BYTES),
        }
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn generate(&self) -> Result<String, CspError> {
        let mut buffer = vec![0u8; self.length];
        loop {
            getrandom(&mut buffer).map_err(|e| CspError::CryptoError(e.to_string()))?;
            let encoded = BASE64.encode(&buffer);
            // Unpadded output can in theory be all hex digits, which
            // validation rejects as ambiguous.
            if !is_hex(&encoded) {
                return Ok(encoded);
            }
        }
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_LENGTH)
    }
}

/// Generates a base64 nonce of at least 16 random bytes.
#[inline]
pub fn generate_nonce(bytes: usize) -> Result<String, CspError> {
    NonceGenerator::new(bytes).generate()
}

/// Checks that a caller supplied nonce is canonical standard base64, is not
/// hex, and carries at least 16 bytes of entropy. Short nonces are rejected,
/// never padded.
pub fn validate_nonce(nonce: &str) -> Result<(), CspError> {
    let bad_nonce = || CspError::BadNonce(nonce.to_owned());

    if nonce.is_empty() || is_hex(nonce) {
        return Err(bad_nonce());
    }

    let raw = BASE64.decode(nonce).map_err(|_| bad_nonce())?;
    if BASE64.encode(&raw) != nonce {
        return Err(bad_nonce());
    }

    if raw.len() < MIN_NONCE_BYTES {
        return Err(bad_nonce());
    }

    Ok(())
}

/// Validates a nonce and wraps it as a source.
pub fn nonce_source(nonce: &str) -> Result<Source, CspError> {
    let nonce = nonce.trim();
    validate_nonce(nonce)?;
    Ok(Source::Nonce(nonce.to_owned().into()))
}

#[inline]
fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The nonce issued for the current request, stored in request extensions
/// by the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestNonce(pub String);

impl Deref for RequestNonce {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
