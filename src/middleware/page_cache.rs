use actix_utils::future::{ok, Ready};
use actix_web::body::{self, EitherBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderValue, CONTENT_TYPE};
use actix_web::http::Method;
use actix_web::web::Bytes;
use actix_web::{error, Error, HttpResponse};
use dashmap::DashMap;
use futures_util::future::{FutureExt as _, LocalBoxFuture};
use std::rc::Rc;
use std::time::{Duration, Instant};

struct CachedPage {
    stored_at: Instant,
    content_type: Option<HeaderValue>,
    body: Bytes,
}

/// Short-TTL response cache for feed pages, keyed by path + query string.
/// Only successful GET responses are stored; within the TTL a repeat
/// request is answered from the stored body without calling the handler.
pub struct PageCache {
    ttl: Duration,
    store: Rc<DashMap<String, CachedPage>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: Rc::new(DashMap::new()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PageCache
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = PageCacheMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(PageCacheMiddleware {
            service: Rc::new(service),
            ttl: self.ttl,
            store: Rc::clone(&self.store),
        })
    }
}

pub struct PageCacheMiddleware<S> {
    service: Rc<S>,
    ttl: Duration,
    store: Rc<DashMap<String, CachedPage>>,
}

impl<S, B> Service<ServiceRequest> for PageCacheMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let store = Rc::clone(&self.store);
        let ttl = self.ttl;

        async move {
            if req.method() != Method::GET {
                return service.call(req).await.map(|res| res.map_into_left_body());
            }

            let key = match req.query_string() {
                "" => req.path().to_owned(),
                query => format!("{}?{}", req.path(), query),
            };

            if let Some(entry) = store.get(&key) {
                if entry.stored_at.elapsed() < ttl {
                    let mut builder = HttpResponse::Ok();
                    if let Some(content_type) = &entry.content_type {
                        builder.insert_header((CONTENT_TYPE, content_type.clone()));
                    }
                    let response = builder.body(entry.body.clone());
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            let res = service.call(req).await?;
            if !res.status().is_success() {
                return Ok(res.map_into_left_body());
            }

            let (request, response) = res.into_parts();
            let status = response.status();
            let content_type = response.headers().get(CONTENT_TYPE).cloned();
            let bytes = body::to_bytes(response.into_body()).await.map_err(|_| {
                error::ErrorInternalServerError("PageCache: could not buffer response body")
            })?;

            store.insert(
                key,
                CachedPage {
                    stored_at: Instant::now(),
                    content_type: content_type.clone(),
                    body: bytes.clone(),
                },
            );

            let mut builder = HttpResponse::build(status);
            if let Some(content_type) = content_type {
                builder.insert_header((CONTENT_TYPE, content_type));
            }
            let response = builder.body(bytes);
            Ok(ServiceResponse::new(request, response).map_into_right_body())
        }
        .boxed_local()
    }
}
