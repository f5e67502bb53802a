pub(crate) const HEADER_CSP: &str = "content-security-policy";
pub(crate) const HEADER_CSP_REPORT_ONLY: &str = "content-security-policy-report-only";

pub(crate) const DEFAULT_SRC: &str = "default-src";
pub(crate) const CHILD_SRC: &str = "child-src";
pub(crate) const CONNECT_SRC: &str = "connect-src";
pub(crate) const FONT_SRC: &str = "font-src";
pub(crate) const FRAME_SRC: &str = "frame-src";
pub(crate) const IMG_SRC: &str = "img-src";
pub(crate) const MANIFEST_SRC: &str = "manifest-src";
pub(crate) const MEDIA_SRC: &str = "media-src";
pub(crate) const OBJECT_SRC: &str = "object-src";
pub(crate) const SCRIPT_SRC: &str = "script-src";
pub(crate) const STYLE_SRC: &str = "style-src";
pub(crate) const WORKER_SRC: &str = "worker-src";
pub(crate) const BASE_URI: &str = "base-uri";
pub(crate) const PLUGIN_TYPES: &str = "plugin-types";
pub(crate) const SANDBOX: &str = "sandbox";
pub(crate) const FORM_ACTION: &str = "form-action";
pub(crate) const FRAME_ANCESTORS: &str = "frame-ancestors";
pub(crate) const REPORT_URI: &str = "report-uri";
pub(crate) const REPORT_URI_REPORT_ONLY: &str = "report-uri-Report-Only";

/// Recognised but deliberately unsupported directive names.
pub(crate) const EXPERIMENTAL_DIRECTIVES: &[&str] =
    &["disown-opener", "navigate-to", "navigation-to", "report-to"];

pub(crate) const NONE_SOURCE: &str = "'none'";
pub(crate) const SELF_SOURCE: &str = "'self'";
pub(crate) const WILDCARD_SOURCE: &str = "*";
pub(crate) const UNSAFE_INLINE_SOURCE: &str = "'unsafe-inline'";
pub(crate) const UNSAFE_EVAL_SOURCE: &str = "'unsafe-eval'";
pub(crate) const STRICT_DYNAMIC_SOURCE: &str = "'strict-dynamic'";
pub(crate) const REPORT_SAMPLE_SOURCE: &str = "'report-sample'";
pub(crate) const NONCE_PREFIX: &str = "'nonce-";
pub(crate) const HASH_PREFIX_SHA256: &str = "'sha256-";
pub(crate) const HASH_PREFIX_SHA384: &str = "'sha384-";
pub(crate) const HASH_PREFIX_SHA512: &str = "'sha512-";
pub(crate) const SUFFIX_QUOTE: &str = "'";

/// Schemes accepted as bare scheme-sources (`https:` and friends).
pub(crate) const FETCH_SCHEMES: &[&str] = &["https", "data", "blob", "mediastream", "filesystem"];

/// Schemes accepted in front of a host-source.
pub(crate) const HOST_SCHEMES: &[&str] = &["http", "https"];

pub(crate) const SANDBOX_VALUES: &[&str] = &[
    "allow-downloads",
    "allow-forms",
    "allow-modals",
    "allow-orientation-lock",
    "allow-pointer-lock",
    "allow-popups",
    "allow-popups-to-escape-sandbox",
    "allow-presentation",
    "allow-same-origin",
    "allow-scripts",
    "allow-top-navigation",
    "allow-top-navigation-by-user-activation",
];

pub(crate) const DEFAULT_PLUGIN_TYPES: &[&str] = &["image/svg+xml", "application/pdf"];

pub(crate) const MIN_NONCE_BYTES: usize = 16;
pub(crate) const DEFAULT_NONCE_LENGTH: usize = 16;
pub(crate) const DEFAULT_BUFFER_CAPACITY: usize = 256;
