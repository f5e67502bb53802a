use csp_builder::{CspPolicy, HashAlgorithm, Source};
use proptest::prelude::*;

fn host_strategy() -> impl Strategy<Value = String> {
    (
        prop::option::of(prop_oneof![Just("http://"), Just("https://")]),
        prop::bool::ANY,
        "[a-z][a-z0-9]{0,8}",
        prop_oneof![Just("org"), Just("net"), Just("example")],
        prop::option::of(1u16..=65535),
    )
        .prop_map(|(scheme, wildcard, label, tld, port)| {
            let mut host = String::new();
            if let Some(scheme) = scheme {
                host.push_str(scheme);
            }
            if wildcard {
                host.push_str("*.");
            }
            host.push_str(&label);
            host.push('.');
            host.push_str(tld);
            if let Some(port) = port {
                host.push_str(&format!(":{}", port));
            }
            host
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn hex_and_base64_digests_agree(bytes in prop::collection::vec(any::<u8>(), 48)) {
            let hex = hex::encode(&bytes);
            let b64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &bytes);

            let from_hex = HashAlgorithm::Sha384.source(&hex).unwrap();
            let from_b64 = HashAlgorithm::Sha384.source(&b64).unwrap();
            prop_assert_eq!(from_hex, from_b64);
        }

        #[test]
        fn host_sources_are_canonical(host in host_strategy()) {
            let source = Source::parse(&host).unwrap();
            prop_assert_eq!(source.to_string(), host.clone());
            prop_assert_eq!(Source::parse(&host.to_uppercase()).unwrap(), source);
        }

        #[test]
        fn token_insertion_is_idempotent(hosts in prop::collection::vec(host_strategy(), 1..6)) {
            let mut once = CspPolicy::with_default_src("'none'").unwrap();
            for host in &hosts {
                once.add_fetch_policy("connect-src", host).unwrap();
            }

            let mut twice = once.clone();
            for host in &hosts {
                prop_assert!(!twice.add_fetch_policy("connect-src", host).unwrap());
            }
            prop_assert_eq!(once.build_header(), twice.build_header());
        }

        #[test]
        fn rendering_does_not_mutate(hosts in prop::collection::vec(host_strategy(), 0..4)) {
            let mut policy = CspPolicy::with_default_src("'self'").unwrap();
            for host in &hosts {
                policy.add_fetch_policy("frame-src", host).unwrap();
            }
            let before = policy.clone();
            let header = policy.build_header();
            prop_assert_eq!(&policy, &before);
            prop_assert_eq!(policy.to_string(), header);
        }
    }
}
