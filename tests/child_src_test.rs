use csp_builder::{CspPolicy, Directive};

fn policy(default_src: &str) -> CspPolicy {
    let _ = env_logger::builder().is_test(true).try_init();
    CspPolicy::with_default_src(default_src).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_only_under_none() {
        let mut csp = policy("'none'");
        csp.add_fetch_policy("frame-src", "*").unwrap();
        assert_eq!(
            csp.build_header(),
            "default-src 'none'; child-src *; frame-src *; worker-src 'none';"
        );
    }

    #[test]
    fn test_frame_none_under_self() {
        let mut csp = policy("'self'");
        csp.add_fetch_policy("frame-src", "'none'").unwrap();
        assert_eq!(
            csp.build_header(),
            "default-src 'self'; child-src 'none'; frame-src 'none'; worker-src 'self'; \
             plugin-types image/svg+xml application/pdf;"
        );
    }

    #[test]
    fn test_frame_and_worker_equal_to_default() {
        let mut csp = policy("'self'");
        csp.add_fetch_policy("frame-src", "'self'").unwrap();
        csp.add_fetch_policy("worker-src", "'self'").unwrap();
        assert_eq!(
            csp.build_header(),
            "default-src 'self'; plugin-types image/svg+xml application/pdf;"
        );
    }

    #[test]
    fn test_frame_and_worker_self_under_none() {
        let mut csp = policy("'none'");
        csp.add_fetch_policy("frame-src", "'self'").unwrap();
        csp.add_fetch_policy("worker-src", "'self'").unwrap();
        assert_eq!(
            csp.build_header(),
            "default-src 'none'; child-src 'self'; frame-src 'self'; worker-src 'self';"
        );
    }

    #[test]
    fn test_union_of_different_hosts() {
        let mut csp = policy("'none'");
        csp.add_fetch_policy("frame-src", "https://www.example.org").unwrap();
        csp.add_fetch_policy("worker-src", "https://worker.example.org").unwrap();
        assert_eq!(
            csp.build_header(),
            "default-src 'none'; child-src https://www.example.org https://worker.example.org; \
             frame-src https://www.example.org; worker-src https://worker.example.org;"
        );
    }

    #[test]
    fn test_union_orders_self_before_hosts() {
        let mut csp = policy("'none'");
        csp.add_fetch_policy("frame-src", "'self'").unwrap();
        csp.add_fetch_policy("worker-src", "'self'").unwrap();
        csp.add_fetch_policy("worker-src", "https://worker.example.org").unwrap();
        assert_eq!(
            csp.build_header(),
            "default-src 'none'; child-src 'self' https://worker.example.org; frame-src 'self'; \
             worker-src 'self' https://worker.example.org;"
        );
    }

    #[test]
    fn test_union_tiers() {
        let mut csp = policy("'none'");
        csp.add_fetch_policy("frame-src", "https://frames.example.org").unwrap();
        csp.add_fetch_policy("frame-src", "data:").unwrap();
        csp.add_fetch_policy("worker-src", "blob:").unwrap();
        csp.add_fetch_policy("worker-src", "'self'").unwrap();
        csp.add_fetch_policy("worker-src", "https://frames.example.org").unwrap();

        assert_eq!(
            csp.child_src().to_string(),
            "'self' data: blob: https://frames.example.org"
        );
    }

    #[test]
    fn test_union_skips_none() {
        let mut csp = policy("'self'");
        csp.add_fetch_policy("frame-src", "'none'").unwrap();
        csp.add_fetch_policy("worker-src", "https://worker.example.org").unwrap();
        assert_eq!(csp.child_src().to_string(), "https://worker.example.org");
    }

    #[test]
    fn test_copied_frame_with_empty_worker() {
        let mut csp = policy("'self' https://cdn.example.net");
        csp.copy_default_policy(Directive::FrameSrc).unwrap();
        csp.add_fetch_policy("frame-src", "https://*.elsewhere.com").unwrap();
        assert_eq!(
            csp.build_header(),
            "default-src 'self' https://cdn.example.net; \
             child-src 'self' https://cdn.example.net https://*.elsewhere.com; \
             frame-src 'self' https://cdn.example.net https://*.elsewhere.com; \
             worker-src 'self' https://cdn.example.net; \
             plugin-types image/svg+xml application/pdf;"
        );
    }

    #[test]
    fn test_child_src_is_not_stored() {
        let mut csp = policy("'none'");
        csp.add_fetch_policy("frame-src", "https://www.example.org").unwrap();
        csp.build_header();
        assert!(csp.sources(Directive::ChildSrc).is_none());
        assert!(csp.sources(Directive::WorkerSrc).unwrap().is_empty());
    }

    #[test]
    fn test_no_frame_or_worker() {
        let csp = policy("'none'");
        assert!(csp.child_src().is_empty());
        assert_eq!(csp.build_header(), "default-src 'none';");
    }
}
