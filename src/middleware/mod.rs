pub mod csp;
pub mod extensions;

pub use csp::{csp_middleware, csp_middleware_with_nonce, CspMiddleware, CspMiddlewareService};
pub use extensions::CspExtensions;
