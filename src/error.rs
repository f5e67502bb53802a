use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CspError {
    #[error("Invalid directive name: {0}")]
    InvalidDirective(String),

    #[error("Directive '{0}' is not a fetch directive")]
    InvalidFetchDirective(String),

    #[error("Directive '{0}' is not a document or navigation directive")]
    InvalidDocumentDirective(String),

    #[error("Experimental directive '{0}' is not supported")]
    ExperimentalDirective(String),

    #[error("default-src can only be set when the policy is constructed")]
    InvalidDefaultSrc,

    #[error("child-src is derived from frame-src and worker-src and can not be set")]
    InvalidChildSrc,

    #[error("Invalid host source: {0}")]
    InvalidHostSource(String),

    #[error("Invalid host name: {0}")]
    InvalidHostName(String),

    #[error("Invalid host scheme: {0}")]
    InvalidHostScheme(String),

    #[error("Invalid scheme source: {0}")]
    InvalidFetchScheme(String),

    #[error("'{0}' is not a valid sandbox policy")]
    InvalidSandboxPolicy(String),

    #[error("Malformed sandbox value: {0:?}")]
    BadSandboxValue(String),

    #[error("Plugin type must be a <type>/<subtype> MIME type: {0:?}")]
    BadMime(String),

    #[error("Hash algorithm must be sha256, sha384, or sha512, got {0:?}")]
    BadAlgo(String),

    #[error("Hash must be a hex or base64 encoded {0} digest")]
    BadHash(String),

    #[error("Nonce must be a 128-bit or larger base64 value, got {0:?}")]
    BadNonce(String),

    #[error("'{value}' can not be used in {directive}")]
    InvalidDirectiveValue {
        directive: &'static str,
        value: String,
    },

    #[error("Invalid report URI: {0}")]
    InvalidReportUri(String),

    #[error("Crypto error: {0}")]
    CryptoError(String),

    #[error("Header processing error: {0}")]
    HeaderError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl CspError {
    pub(crate) fn invalid_value(directive: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidDirectiveValue {
            directive,
            value: value.into(),
        }
    }
}

impl ResponseError for CspError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CryptoError(_) | Self::HeaderError(_) | Self::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
