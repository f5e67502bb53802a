pub mod config;
pub mod directives;
pub(crate) mod host;
pub mod policy;
mod render;
pub mod source;

pub use config::{CspConfig, CspConfigBuilder};
pub use directives::{Directive, DirectiveSet};
pub use policy::{CspPolicy, CspPolicyBuilder};
pub use source::Source;
