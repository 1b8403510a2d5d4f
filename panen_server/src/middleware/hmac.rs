//! HMAC middleware for Actix Web.
//!
//! Tripay signs every callback with `HMAC-SHA256(private_key, raw_body)` and sends the hex digest in the
//! `X-Callback-Signature` header. This middleware checks that signature against the exact bytes that arrived, before
//! anything parses the body. Requests that fail the check are answered with 401 and never reach the handler.
//!
//! Wrap the payment callback route (and only that route) with this middleware.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorUnauthorized},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use panen_common::Secret;
use tripay_tools::signature::verify_callback_signature;

pub struct HmacMiddlewareFactory {
    hmac_header: String,
    key: Secret<String>,
}

impl HmacMiddlewareFactory {
    pub fn new(hmac_header: &str, key: Secret<String>) -> Self {
        HmacMiddlewareFactory { hmac_header: hmac_header.into(), key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService {
            hmac_header: self.hmac_header.clone(),
            key: self.key.clone(),
            service: Rc::new(service),
        }))
    }
}

pub struct HmacMiddlewareService<S> {
    hmac_header: String,
    key: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let key = self.key.clone();
        let hmac_header = self.hmac_header.clone();
        Box::pin(async move {
            trace!("🔐️ Checking HMAC for request");
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let signature = req.headers().get(&hmac_header).and_then(|v| v.to_str().ok());
            match verify_callback_signature(&key, data.as_ref(), signature) {
                Ok(()) => {
                    trace!("🔐️ HMAC check for request ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Rejecting callback. {e}");
                    Err(ErrorUnauthorized("Invalid signature"))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
