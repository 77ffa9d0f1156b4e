use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::SessionIssuer;
use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid or missing token.";

/// Requires a valid bearer token before the wrapped service runs.
///
/// On success the verified [`Identity`](crate::auth::Identity) is stored in the
/// request extensions for [`AuthenticatedUser`](crate::auth::AuthenticatedUser).
/// The `SessionIssuer` is taken from app data. Rejections are rendered as the
/// usual `AppError` JSON response without reaching the wrapped service.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let issuer = match req.app_data::<web::Data<SessionIssuer>>() {
            Some(issuer) => issuer.clone(),
            None => {
                log::error!("SessionIssuer missing from app data; rejecting {}", req.path());
                return reject(req, AppError::unavailable("session issuer not configured"));
            }
        };

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        let Some(token) = token else {
            log::debug!("no bearer token on {} {}", req.method(), req.path());
            return reject(req, AppError::Unauthorized(UNAUTHORIZED_MESSAGE.into()));
        };

        match issuer.authenticate(token) {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(reason) => {
                log::debug!("rejected token on {} {}: {}", req.method(), req.path(), reason);
                reject(req, AppError::Unauthorized(UNAUTHORIZED_MESSAGE.into()))
            }
        }
    }
}

fn reject<B: 'static>(
    req: ServiceRequest,
    err: AppError,
) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>> {
    let response = req.into_response(err.error_response()).map_into_right_body();
    Box::pin(async move { Ok(response) })
}
