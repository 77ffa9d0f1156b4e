pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{error::JsonPayloadError, web};

use crate::auth::AuthMiddleware;
use crate::error::AppError;
use crate::services::tasks::TASK_NOT_FOUND;

/// Mounts the auth and task routes. Every `/tasks` route requires a bearer token.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

/// Malformed JSON bodies become validation errors on `body`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::invalid_field("body", body_error_message(&err)).into())
}

fn body_error_message(err: &JsonPayloadError) -> String {
    match err {
        // serde_json appends "at line N column M"; the position is not useful to clients.
        JsonPayloadError::Deserialize(e) if e.is_data() => {
            let text = e.to_string();
            match text.find(" at line ") {
                Some(end) => text[..end].to_string(),
                None => text,
            }
        }
        JsonPayloadError::Deserialize(_) => "Request body is not valid JSON.".to_string(),
        other => other.to_string(),
    }
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::invalid_field("query", err.to_string()).into())
}

/// The only path parameter is a task id; one that does not parse cannot exist.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::NotFound(TASK_NOT_FOUND.into()).into())
}
