use crate::{
    auth::{LoginRequest, RegisterRequest, RegisterResponse},
    error::AppError,
    services::IdentityService,
};
use actix_web::{post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates an account and returns the public user view (no token; clients log
/// in afterwards).
///
/// ## Responses:
/// - `201 Created`: `{"user": {...}}`.
/// - `400 Bad Request`: malformed body or failed field validation.
/// - `409 Conflict`: the normalized email is already registered.
#[post("/register")]
pub async fn register(
    identity: web::Data<IdentityService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = identity.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(RegisterResponse { user }))
}

/// Login user
///
/// ## Responses:
/// - `200 OK`: `{"token": "...", "user": {...}}`.
/// - `400 Bad Request`: malformed body or failed field validation.
/// - `401 Unauthorized`: unknown email or wrong password (same message for both).
#[post("/login")]
pub async fn login(
    identity: web::Data<IdentityService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = identity.login(login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}
