use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::services::IdentityService;

/// Health check endpoint
///
/// Reports `ok` when the credential store answers, `degraded` (503) otherwise.
#[get("/health")]
pub async fn health(identity: web::Data<IdentityService>) -> impl Responder {
    match identity.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "database": "ok",
            "timestamp": Utc::now()
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(json!({
            "status": "degraded",
            "database": "unreachable",
            "timestamp": Utc::now()
        })),
    }
}
