use crate::middleware::client_ctx::ClientCtx;
use actix_utils::future::{ok, Ready};
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::{FutureExt as _, LocalBoxFuture};
use std::rc::Rc;

/// Gate for routes only authenticated clients may reach.
/// An anonymous request is bounced to the login form with a `next`
/// parameter pointing back at the original URL; the wrapped handler and
/// the store are never touched.
pub struct RequireUser;

impl<S, B> Transform<S, ServiceRequest> for RequireUser
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireUserMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireUserMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RequireUserMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireUserMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ctx = ClientCtx::get_client_ctx(&mut req.extensions_mut());
        let service = Rc::clone(&self.service);

        // The identity is attached by ClientCtxMiddleware before this
        // future is polled, so the check must not run inside call().
        async move {
            if ctx.is_user() {
                service
                    .call(req)
                    .await
                    .map(|res| res.map_into_left_body())
            } else {
                let location = format!("/auth/login/?next={}", req.path());
                let response = HttpResponse::Found()
                    .insert_header((header::LOCATION, location))
                    .finish();
                Ok(req.into_response(response).map_into_right_body())
            }
        }
        .boxed_local()
    }
}
