use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Status given to every new task.
pub const DEFAULT_STATUS: &str = "open";

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// A task as read from the store, enriched with the assignee's display fields.
///
/// `assignee_name` and `assignee_email` come from a join at query time and are
/// `None` whenever `assigned_to` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
}

/// Body of `POST /tasks`.
///
/// Enum, date and id fields arrive as strings and are checked by `validate()`,
/// so a bad value is reported against its own field.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(custom = "validate_title")]
    pub title: String,
    pub description: Option<String>,
    #[validate(custom = "validate_priority")]
    pub priority: Option<String>,
    #[serde(rename = "dueDate", alias = "due_date")]
    #[validate(custom = "validate_due_date")]
    pub due_date: Option<String>,
    #[serde(rename = "assignedTo", alias = "assigned_to")]
    #[validate(custom = "validate_user_ref")]
    pub assigned_to: Option<String>,
}

/// Body of `PUT /tasks/{id}`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(custom = "validate_title")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Status must be 1 to 50 characters."))]
    pub status: Option<String>,
    #[validate(custom = "validate_priority")]
    pub priority: Option<String>,
    #[serde(rename = "dueDate", alias = "due_date")]
    #[validate(custom = "validate_due_date")]
    pub due_date: Option<String>,
    #[serde(rename = "assignedTo", alias = "assigned_to")]
    #[validate(custom = "validate_user_ref")]
    pub assigned_to: Option<String>,
}

/// A fully-defaulted task ready for insertion.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A validated partial update; `None` means "keep".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
}

impl TaskPriority {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(TaskPriority::Low),
            "normal" => Some(TaskPriority::Normal),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

impl NewTask {
    /// Applies creation defaults: fresh id, trimmed title, `open` status,
    /// `normal` priority. `input` must already have passed `validate()`.
    pub fn from_request(input: CreateTaskRequest, created_by: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            status: DEFAULT_STATUS.to_string(),
            priority: input
                .priority
                .as_deref()
                .and_then(TaskPriority::parse)
                .unwrap_or_default(),
            due_date: input.due_date.as_deref().and_then(parse_due_date),
            created_by,
            assigned_to: input.assigned_to.as_deref().and_then(parse_user_ref),
            created_at: now,
        }
    }
}

/// Expects a request that has passed `validate()`.
impl From<UpdateTaskRequest> for TaskChanges {
    fn from(input: UpdateTaskRequest) -> Self {
        Self {
            title: input.title.map(|t| t.trim().to_string()),
            description: input.description,
            status: input.status,
            priority: input.priority.as_deref().and_then(TaskPriority::parse),
            due_date: input.due_date.as_deref().and_then(parse_due_date),
            assigned_to: input.assigned_to.as_deref().and_then(parse_user_ref),
        }
    }
}

fn parse_due_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn parse_user_ref(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value).ok()
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(invalid("required", "Title is required."));
    }
    Ok(())
}

fn validate_priority(priority: &str) -> Result<(), ValidationError> {
    match TaskPriority::parse(priority) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "priority",
            "Priority must be one of low, normal, high.",
        )),
    }
}

fn validate_due_date(due_date: &str) -> Result<(), ValidationError> {
    match parse_due_date(due_date) {
        Some(_) => Ok(()),
        None => Err(invalid("date", "Due date must be a date in YYYY-MM-DD form.")),
    }
}

fn validate_user_ref(user_id: &str) -> Result<(), ValidationError> {
    match parse_user_ref(user_id) {
        Some(_) => Ok(()),
        None => Err(invalid("uuid", "Assignee must be a user id.")),
    }
}
