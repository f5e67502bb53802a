use actix_web::{test, web, App, HttpRequest, HttpResponse};
use csp_builder::{
    csp_middleware, csp_middleware_with_nonce, CspConfig, CspConfigBuilder, CspExtensions,
    CspPolicy, Directive, HashAlgorithm,
};

async fn plain_page() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn nonce_page(req: HttpRequest) -> HttpResponse {
    match req.csp_nonce() {
        Some(nonce) => HttpResponse::Ok().body(nonce),
        None => HttpResponse::Ok().body("no nonce"),
    }
}

async fn inline_script_page(req: HttpRequest) -> HttpResponse {
    let source = req.csp_hash_source(HashAlgorithm::Sha256, b"alert(1)");
    HttpResponse::Ok().body(source.to_string())
}

async fn custom_header_page() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(("content-security-policy", "default-src 'self'"))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_header_attached() {
        let app = test::init_service(
            App::new()
                .wrap(csp_middleware(CspConfig::default()))
                .route("/", web::get().to(plain_page)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let header = resp
            .headers()
            .get("content-security-policy")
            .expect("CSP header not found");
        assert_eq!(header.to_str().unwrap(), CspPolicy::new().build_header());
    }

    #[actix_web::test]
    async fn test_report_only_header() {
        let mut policy = CspPolicy::with_default_src("'self'").unwrap();
        policy.set_report_uri("/csp-report", true).unwrap();

        let app = test::init_service(
            App::new()
                .wrap(csp_middleware(CspConfig::new(policy)))
                .route("/", web::get().to(plain_page)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.headers().get("content-security-policy").is_none());
        let header = resp
            .headers()
            .get("content-security-policy-report-only")
            .unwrap();
        assert!(header.to_str().unwrap().ends_with("; report-uri-Report-Only /csp-report;"));
    }

    #[actix_web::test]
    async fn test_nonce_shared_with_handler() {
        let middleware =
            csp_middleware_with_nonce(CspPolicy::with_default_src("'none'").unwrap(), 16).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(middleware)
                .route("/", web::get().to(nonce_page)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        let header = resp
            .headers()
            .get("content-security-policy")
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();

        let body = test::read_body(resp).await;
        let nonce = std::str::from_utf8(&body).unwrap();
        assert!(csp_builder::validate_nonce(nonce).is_ok());
        assert_eq!(
            header,
            format!("default-src 'none'; script-src 'nonce-{}';", nonce)
        );
    }

    #[actix_web::test]
    async fn test_fresh_nonce_per_request() {
        let config = CspConfigBuilder::new()
            .with_nonce_directive(Directive::StyleSrc)
            .build()
            .unwrap();
        let app = test::init_service(
            App::new()
                .wrap(csp_middleware(config))
                .route("/", web::get().to(nonce_page)),
        )
        .await;

        let first = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
        let second = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_ne!(first, second);
    }

    #[actix_web::test]
    async fn test_no_nonce_without_generator() {
        let app = test::init_service(
            App::new()
                .wrap(csp_middleware(CspConfig::default()))
                .route("/", web::get().to(nonce_page)),
        )
        .await;

        let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(body, "no nonce");
    }

    #[actix_web::test]
    async fn test_existing_header_kept() {
        let app = test::init_service(
            App::new()
                .wrap(csp_middleware(CspConfig::default()))
                .route("/", web::get().to(custom_header_page)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        let values: Vec<_> = resp
            .headers()
            .get_all("content-security-policy")
            .collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].to_str().unwrap(), "default-src 'self'");
    }

    #[actix_web::test]
    async fn test_hash_source_for_inline_content() {
        let app = test::init_service(
            App::new()
                .wrap(csp_middleware(CspConfig::default()))
                .route("/", web::get().to(inline_script_page)),
        )
        .await;

        let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(body, "'sha256-bhHHL3z2vDgxUt0W3dWQOrprscmda2Y5pLsLg4GF+pI='");
    }
}
