use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskRequest, UpdateTaskRequest},
    services::TaskService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Query parameters for `GET /tasks`.
#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    /// Case-insensitive substring over title, description and assignee
    /// username/email.
    pub search: Option<String>,
}

/// Lists all tasks, newest first, optionally filtered by `search`.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks, each with `assignee_name`/`assignee_email`.
/// - `401 Unauthorized`: missing or invalid bearer token.
/// - `500 Internal Server Error`: store unavailable.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    query_params: web::Query<TaskQuery>,
    _user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = tasks.list(query_params.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task owned by the authenticated user.
///
/// ## Request Body:
/// - `title` (required), `description`, `priority` (`low|normal|high`),
///   `dueDate` (`YYYY-MM-DD`), `assignedTo` (user id).
///
/// ## Responses:
/// - `201 Created`: `{"message": "Task created", "task": {...}}`.
/// - `400 Bad Request`: empty title, malformed body, or unknown assignee.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    task_data: web::Json<CreateTaskRequest>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(task_data.into_inner(), user.0.user_id).await?;
    Ok(HttpResponse::Created().json(json!({ "message": "Task created", "task": task })))
}

#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task. Omitted fields keep their stored value.
///
/// ## Responses:
/// - `200 OK`: `{"message": "Task updated", "task": {...}}`.
/// - `400 Bad Request`: blank title, bad status, malformed body, or unknown assignee.
/// - `401 Unauthorized`: missing or invalid bearer token.
/// - `404 Not Found`: no task with this id.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskRequest>,
    _user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update(task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Task updated", "task": task })))
}

/// Deletes a task. Deleting the same id again is `404`.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    tasks.delete(id).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": true, "id": id })))
}
