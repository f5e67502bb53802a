use crate::core::source::Source;
use crate::security::hash::{HashAlgorithm, HashGenerator};
use crate::security::nonce::RequestNonce;
use actix_web::HttpMessage;

pub trait CspExtensions {
    /// The nonce issued for this request, if the middleware generates them.
    fn csp_nonce(&self) -> Option<String>;
    fn csp_hash_source(&self, algorithm: HashAlgorithm, content: &[u8]) -> Source;
}

impl<T> CspExtensions for T
where
    T: HttpMessage,
{
    fn csp_nonce(&self) -> Option<String> {
        self.extensions()
            .get::<RequestNonce>()
            .map(|nonce| nonce.0.clone())
    }

    fn csp_hash_source(&self, algorithm: HashAlgorithm, content: &[u8]) -> Source {
        HashGenerator::generate_source(algorithm, content)
    }
}
