use crate::constants::{HASH_PREFIX_SHA256, HASH_PREFIX_SHA384, HASH_PREFIX_SHA512};
use crate::core::source::Source;
use crate::error::CspError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ring::digest::{self, SHA256, SHA384, SHA512};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[inline(always)]
    pub fn digest_algorithm(&self) -> &'static digest::Algorithm {
        match self {
            HashAlgorithm::Sha256 => &SHA256,
            HashAlgorithm::Sha384 => &SHA384,
            HashAlgorithm::Sha512 => &SHA512,
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    #[inline(always)]
    pub const fn prefix(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => HASH_PREFIX_SHA256,
            HashAlgorithm::Sha384 => HASH_PREFIX_SHA384,
            HashAlgorithm::Sha512 => HASH_PREFIX_SHA512,
        }
    }

    /// Raw digest size in bytes.
    #[inline(always)]
    pub const fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Length of the padded standard base64 form of a digest.
    #[inline(always)]
    pub const fn encoded_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 44,
            HashAlgorithm::Sha384 => 64,
            HashAlgorithm::Sha512 => 88,
        }
    }

    /// Canonicalizes a hex or base64 digest into the padded standard base64
    /// form used inside a `'shaNNN-...'` source.
    ///
    /// A digest made only of hex digits is always decoded as hex. The decoded
    /// digest must be exactly as long as this algorithm's output.
    pub fn canonicalize_digest(&self, digest: &str) -> Result<String, CspError> {
        let digest = digest.trim();
        let bad_hash = || CspError::BadHash(self.name().to_owned());

        let raw = if !digest.is_empty() && digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            hex::decode(digest).map_err(|_| bad_hash())?
        } else {
            let raw = BASE64.decode(digest).map_err(|_| bad_hash())?;
            if BASE64.encode(&raw) != digest {
                return Err(bad_hash());
            }
            raw
        };

        if raw.len() != self.digest_len() {
            return Err(bad_hash());
        }

        Ok(BASE64.encode(raw))
    }

    /// Builds a validated hash source from a hex or base64 digest.
    pub fn source(&self, digest: &str) -> Result<Source, CspError> {
        let value = self.canonicalize_digest(digest)?;
        Ok(Source::Hash {
            algorithm: *self,
            value: value.into(),
        })
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&str> for HashAlgorithm {
    type Error = CspError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(CspError::BadAlgo(s.to_string())),
        }
    }
}

/// Computes CSP hash sources for inline script and style bodies.
#[derive(Debug)]
pub struct HashGenerator;

impl HashGenerator {
    #[inline]
    pub fn generate(algorithm: HashAlgorithm, data: &[u8]) -> String {
        let digest = digest::digest(algorithm.digest_algorithm(), data);
        BASE64.encode(digest.as_ref())
    }

    #[inline]
    pub fn generate_source(algorithm: HashAlgorithm, data: &[u8]) -> Source {
        let hash = Self::generate(algorithm, data);
        Source::Hash {
            algorithm,
            value: hash.into(),
        }
    }

    #[inline]
    pub fn verify_hash(algorithm: HashAlgorithm, data: &[u8], hash: &str) -> bool {
        match algorithm.canonicalize_digest(hash) {
            Ok(expected) => Self::generate(algorithm, data) == expected,
            Err(_) => false,
        }
    }
}
