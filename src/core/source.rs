use crate::constants::{
    FETCH_SCHEMES, NONCE_PREFIX, NONE_SOURCE, REPORT_SAMPLE_SOURCE, SELF_SOURCE,
    STRICT_DYNAMIC_SOURCE, SUFFIX_QUOTE, UNSAFE_EVAL_SOURCE, UNSAFE_INLINE_SOURCE,
    WILDCARD_SOURCE,
};
use crate::core::host;
use crate::error::CspError;
use crate::security::hash::HashAlgorithm;
use crate::security::nonce;
use std::{borrow::Cow, fmt, str::FromStr};

/// A single classified value inside a directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    None,
    Self_,
    Wildcard,
    UnsafeInline,
    UnsafeEval,
    StrictDynamic,
    ReportSample,
    Host(Cow<'static, str>),
    Scheme(Cow<'static, str>),
    Nonce(Cow<'static, str>),
    Hash {
        algorithm: HashAlgorithm,
        value: Cow<'static, str>,
    },
}

impl Source {
    /// Classifies a raw policy value.
    ///
    /// Surrounding whitespace and one pair of single quotes are ignored.
    /// Keywords are matched case-insensitively, then trailing-colon schemes,
    /// then `shaNNN-` hashes, then `nonce-` values; anything else must be a
    /// valid host-source.
    pub fn parse(raw: &str) -> Result<Self, CspError> {
        let value = strip_quotes(raw.trim());
        let lowered = value.to_ascii_lowercase();

        if let Some(keyword) = Self::keyword(&lowered) {
            return Ok(keyword);
        }

        if let Some(scheme) = lowered.strip_suffix(':') {
            if is_scheme_name(scheme) {
                return Self::scheme_source(scheme);
            }
        }

        if let Some((prefix, digest)) = value.split_once('-') {
            let prefix = prefix.to_ascii_lowercase();
            if is_hash_prefix(&prefix) {
                return HashAlgorithm::try_from(prefix.as_str())?.source(digest);
            }
            if prefix == "nonce" {
                return nonce::nonce_source(digest);
            }
        }

        host::parse_host_source(&lowered)
    }

    fn keyword(lowered: &str) -> Option<Self> {
        match lowered {
            "none" => Some(Source::None),
            "self" => Some(Source::Self_),
            "*" => Some(Source::Wildcard),
            "unsafe-inline" => Some(Source::UnsafeInline),
            "unsafe-eval" => Some(Source::UnsafeEval),
            "strict-dynamic" => Some(Source::StrictDynamic),
            "report-sample" => Some(Source::ReportSample),
            _ => None,
        }
    }

    fn scheme_source(scheme: &str) -> Result<Self, CspError> {
        if FETCH_SCHEMES.contains(&scheme) {
            Ok(Source::Scheme(Cow::Owned(scheme.to_owned())))
        } else {
            Err(CspError::InvalidFetchScheme(format!("{}:", scheme)))
        }
    }

    #[inline(always)]
    pub const fn is_none(&self) -> bool {
        matches!(self, Source::None)
    }

    #[inline(always)]
    pub const fn is_self(&self) -> bool {
        matches!(self, Source::Self_)
    }

    /// True for the single-quoted keyword forms, nonces, and hashes.
    #[inline]
    pub const fn is_quoted(&self) -> bool {
        !matches!(
            self,
            Source::Wildcard | Source::Host(_) | Source::Scheme(_)
        )
    }

    #[inline]
    pub const fn as_static_str(&self) -> Option<&'static str> {
        match self {
            Source::None => Some(NONE_SOURCE),
            Source::Self_ => Some(SELF_SOURCE),
            Source::Wildcard => Some(WILDCARD_SOURCE),
            Source::UnsafeInline => Some(UNSAFE_INLINE_SOURCE),
            Source::UnsafeEval => Some(UNSAFE_EVAL_SOURCE),
            Source::StrictDynamic => Some(STRICT_DYNAMIC_SOURCE),
            Source::ReportSample => Some(REPORT_SAMPLE_SOURCE),
            _ => None,
        }
    }

    #[inline]
    pub fn estimated_size(&self) -> usize {
        match self {
            Source::Host(host) => host.len(),
            Source::Scheme(scheme) => scheme.len() + 1,
            Source::Nonce(nonce) => NONCE_PREFIX.len() + nonce.len() + SUFFIX_QUOTE.len(),
            Source::Hash { algorithm, value } => {
                algorithm.prefix().len() + value.len() + SUFFIX_QUOTE.len()
            }
            keyword => keyword.as_static_str().map_or(0, str::len),
        }
    }

    #[inline]
    pub fn contains_nonce(&self) -> bool {
        matches!(self, Source::Nonce(_))
    }

    #[inline]
    pub fn contains_hash(&self) -> bool {
        matches!(self, Source::Hash { .. })
    }

    #[inline]
    pub fn scheme(&self) -> Option<&str> {
        match self {
            Source::Scheme(scheme) => Some(scheme),
            _ => None,
        }
    }

    #[inline]
    pub fn host(&self) -> Option<&str> {
        match self {
            Source::Host(host) => Some(host),
            _ => None,
        }
    }

    #[inline]
    pub fn nonce(&self) -> Option<&str> {
        match self {
            Source::Nonce(nonce) => Some(nonce),
            _ => None,
        }
    }

    #[inline]
    pub fn hash_value(&self) -> Option<(&str, HashAlgorithm)> {
        match self {
            Source::Hash { algorithm, value } => Some((value, *algorithm)),
            _ => None,
        }
    }
}

impl FromStr for Source {
    type Err = CspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::parse(s)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Host(host) => f.write_str(host),
            Source::Scheme(scheme) => write!(f, "{}:", scheme),
            Source::Nonce(nonce) => write!(f, "{}{}{}", NONCE_PREFIX, nonce, SUFFIX_QUOTE),
            Source::Hash { algorithm, value } => {
                write!(f, "{}{}{}", algorithm.prefix(), value, SUFFIX_QUOTE)
            }
            keyword => f.write_str(keyword.as_static_str().unwrap_or_default()),
        }
    }
}

#[inline]
fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(value)
}

#[inline]
fn is_scheme_name(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[inline]
fn is_hash_prefix(prefix: &str) -> bool {
    prefix
        .strip_prefix("sha")
        .is_some_and(|bits| !bits.is_empty() && bits.bytes().all(|b| b.is_ascii_digit()))
}
