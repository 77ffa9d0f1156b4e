use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::middleware::UNAUTHORIZED_MESSAGE;
use crate::auth::token::Identity;
use crate::error::AppError;

/// Extracts the identity verified by `AuthMiddleware` from request extensions.
///
/// Rejects with `401` when the identity is absent, e.g. on a route that was not
/// wrapped in `AuthMiddleware`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Identity>().cloned() {
            Some(identity) => ready(Ok(AuthenticatedUser(identity))),
            None => {
                let err = AppError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string());
                ready(Err(err.into()))
            }
        }
    }
}
