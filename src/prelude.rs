pub use crate::core::{CspConfig, CspConfigBuilder, CspPolicy, CspPolicyBuilder, Directive, Source};
pub use crate::error::CspError;
pub use crate::middleware::{csp_middleware, csp_middleware_with_nonce, CspExtensions, CspMiddleware};
pub use crate::security::{generate_nonce, HashAlgorithm, HashGenerator, NonceGenerator};
