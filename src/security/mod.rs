pub mod hash;
pub mod nonce;

pub use hash::{HashAlgorithm, HashGenerator};
pub use nonce::{generate_nonce, nonce_source, validate_nonce, NonceGenerator, RequestNonce};
