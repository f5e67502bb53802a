use crate::core::config::{CspConfig, CspConfigBuilder};
use crate::core::policy::CspPolicy;
use crate::error::CspError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::{rc::Rc, sync::Arc};

/// Attaches a Content-Security-Policy header to every response.
///
/// Each request gets its own copy of the configured policy. When nonces are
/// enabled the request nonce is available to handlers through
/// [`CspExtensions::csp_nonce`](crate::middleware::CspExtensions::csp_nonce).
#[derive(Clone)]
pub struct CspMiddleware {
    config: Arc<CspConfig>,
}

impl CspMiddleware {
    #[inline]
    pub fn new(config: CspConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[inline]
    pub fn config(&self) -> Arc<CspConfig> {
        self.config.clone()
    }
}

impl<S, B> Transform<S, ServiceRequest> for CspMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = CspMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CspMiddlewareService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct CspMiddlewareService<S> {
    service: Rc<S>,
    config: Arc<CspConfig>,
}

impl<S, B> Service<ServiceRequest> for CspMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let (policy, nonce) = config.policy_for_request()?;
            if let Some(nonce) = nonce {
                req.extensions_mut().insert(nonce);
            }

            let mut res = service.call(req).await?;

            let header_name = policy.header_name();
            if res.headers().contains_key(&header_name) {
                log::debug!("response already carries {}, leaving it untouched", header_name);
                return Ok(res);
            }

            match policy.header_value() {
                Ok(value) => {
                    res.headers_mut().insert(header_name, value);
                }
                Err(e) => log::warn!("failed to attach policy header: {}", e),
            }

            Ok(res)
        })
    }
}

#[inline]
pub fn csp_middleware(config: CspConfig) -> CspMiddleware {
    CspMiddleware::new(config)
}

/// Middleware issuing a nonce of `nonce_length` bytes for `script-src` on
/// every request.
pub fn csp_middleware_with_nonce(
    policy: CspPolicy,
    nonce_length: usize,
) -> Result<CspMiddleware, CspError> {
    let config = CspConfigBuilder::new()
        .policy(policy)
        .with_nonce_generator(nonce_length)
        .build()?;
    Ok(CspMiddleware::new(config))
}
