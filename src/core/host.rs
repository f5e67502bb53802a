//! Host-source validation.
//!
//! A host-source is `[scheme://]host[:port]` where `host` may start with a
//! single `*.` label and `port` may be `*`. Everything a URL can carry beyond
//! that (userinfo, path, query, fragment) is rejected.

use crate::constants::HOST_SCHEMES;
use crate::core::source::Source;
use crate::error::CspError;
use std::borrow::Cow;
use url::Host;

const WILDCARD_LABEL: &str = "*.";
const WILDCARD_PORT: &str = ":*";

/// Validates a lower-cased host-source candidate and returns its canonical
/// form.
pub(crate) fn parse_host_source(candidate: &str) -> Result<Source, CspError> {
    let (rest, wildcard_port) = match candidate.strip_suffix(WILDCARD_PORT) {
        Some(rest) => (rest, true),
        None => (candidate, false),
    };

    let (scheme, authority) = match rest.split_once("://") {
        Some((scheme, authority)) => {
            if !HOST_SCHEMES.contains(&scheme) {
                return Err(CspError::InvalidHostScheme(candidate.to_owned()));
            }
            (Some(scheme), authority)
        }
        None => (None, rest),
    };

    if authority.contains(['@', '/', '?', '#', '\\']) {
        return Err(CspError::InvalidHostSource(candidate.to_owned()));
    }

    let (host, port) = split_port(authority)
        .ok_or_else(|| CspError::InvalidHostSource(candidate.to_owned()))?;
    if wildcard_port && port.is_some() {
        return Err(CspError::InvalidHostSource(candidate.to_owned()));
    }

    let host = normalize_host(host)
        .ok_or_else(|| CspError::InvalidHostName(candidate.to_owned()))?;

    match scheme {
        None => log::warn!(
            "host source '{}' has no scheme and will also match plain http",
            candidate
        ),
        Some("http") => log::warn!("host source '{}' uses insecure http", candidate),
        Some(_) => {}
    }

    let mut canonical = String::with_capacity(candidate.len());
    if let Some(scheme) = scheme {
        canonical.push_str(scheme);
        canonical.push_str("://");
    }
    canonical.push_str(&host);
    if let Some(port) = port {
        canonical.push(':');
        canonical.push_str(&port.to_string());
    } else if wildcard_port {
        canonical.push_str(WILDCARD_PORT);
    }

    Ok(Source::Host(Cow::Owned(canonical)))
}

/// Splits `host[:port]`, handling bracketed IPv6 literals. Returns `None`
/// when the port is present but not a number in `0..=65535`.
fn split_port(authority: &str) -> Option<(&str, Option<u16>)> {
    let (host, port) = if authority.starts_with('[') {
        let end = authority.find(']')? + 1;
        let (host, rest) = authority.split_at(end);
        if rest.is_empty() {
            (host, None)
        } else {
            (host, Some(rest.strip_prefix(':')?))
        }
    } else {
        match authority.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    match port {
        None => Some((host, None)),
        Some(port) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            Some((host, Some(port.parse().ok()?)))
        }
        Some(_) => None,
    }
}

/// Lower-cases and IDNA-normalizes a hostname, keeping an optional leading
/// wildcard label.
fn normalize_host(host: &str) -> Option<String> {
    let (wildcard, name) = match host.strip_prefix(WILDCARD_LABEL) {
        Some(name) => (true, name),
        None => (false, host),
    };

    if name.is_empty() {
        return None;
    }

    let normalized = match Host::parse(name).ok()? {
        Host::Domain(domain) => {
            if !domain.split('.').all(is_valid_label) {
                return None;
            }
            domain
        }
        Host::Ipv4(addr) => {
            let addr = addr.to_string();
            if wildcard || addr != name {
                return None;
            }
            addr
        }
        Host::Ipv6(addr) => {
            if wildcard {
                return None;
            }
            format!("[{}]", addr)
        }
    };

    if wildcard {
        Some(format!("{}{}", WILDCARD_LABEL, normalized))
    } else {
        Some(normalized)
    }
}

#[inline]
fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
