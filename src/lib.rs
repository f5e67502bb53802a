//! Incremental, validating builder for `Content-Security-Policy` headers,
//! with an Actix Web middleware that attaches the header and issues
//! per-request nonces.

pub mod constants;
pub mod core;
pub mod error;
pub mod middleware;
pub mod prelude;
pub mod security;

// Re-export commonly used types for convenience
pub use core::{
    CspConfig, CspConfigBuilder, CspPolicy, CspPolicyBuilder, Directive, DirectiveSet, Source,
};
pub use error::CspError;
pub use middleware::{csp_middleware, csp_middleware_with_nonce, CspExtensions, CspMiddleware};
pub use security::{
    generate_nonce, validate_nonce, HashAlgorithm, HashGenerator, NonceGenerator, RequestNonce,
};
