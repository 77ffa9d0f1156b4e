//! Shared fixtures: an in-memory store double and app wiring for the HTTP tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::{http::header, test};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use teamboard::auth::{PasswordHasher, SessionIssuer};
use teamboard::models::{NewTask, NewUser, Task, TaskChanges, User};
use teamboard::store::{StoreError, StoreResult, TaskStore, UserStore, EMAIL_TAKEN};
use teamboard::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_COST: u32 = 4;
pub const PASSWORD: &str = "Password123!";

struct TaskRow {
    task: NewTask,
    updated_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<TaskRow>,
    next_seq: u64,
}

/// Users and tasks tables behind one mutex. Each write holds the lock for the
/// whole check-and-insert, like a unique constraint would.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub fn stored_user(&self, email: &str) -> Option<User> {
        let tables = self.tables.lock().unwrap();
        tables.users.iter().find(|u| u.email == email).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn view(&self, row: &TaskRow) -> Task {
        let assignee = row.task.assigned_to.and_then(|id| self.user(id));
        Task {
            id: row.task.id,
            title: row.task.title.clone(),
            description: row.task.description.clone(),
            status: row.task.status.clone(),
            priority: row.task.priority,
            due_date: row.task.due_date,
            created_by: row.task.created_by,
            assigned_to: row.task.assigned_to,
            created_at: row.task.created_at,
            updated_at: row.updated_at,
            assignee_name: assignee.map(|u| u.username.clone()),
            assignee_email: assignee.map(|u| u.email.clone()),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(EMAIL_TAKEN.into()));
        }
        let user = User::from(user);
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check()?;
        Ok(self.stored_user(email))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.user(task.created_by).is_none() {
            return Err(StoreError::MissingReference("createdBy"));
        }
        if let Some(assignee) = task.assigned_to {
            if tables.user(assignee).is_none() {
                return Err(StoreError::MissingReference("assignedTo"));
            }
        }
        tables.next_seq += 1;
        let row = TaskRow {
            updated_at: task.created_at,
            seq: tables.next_seq,
            task,
        };
        let view = tables.view(&row);
        tables.tasks.push(row);
        Ok(view)
    }

    async fn list_tasks(&self, search: Option<&str>) -> StoreResult<Vec<Task>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let needle = search.map(str::to_lowercase);

        let mut rows: Vec<&TaskRow> = tables.tasks.iter().collect();
        rows.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        Ok(rows
            .into_iter()
            .map(|row| tables.view(row))
            .filter(|task| match &needle {
                None => true,
                Some(needle) => [
                    Some(&task.title),
                    task.description.as_ref(),
                    task.assignee_name.as_ref(),
                    task.assignee_email.as_ref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            })
            .collect())
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .tasks
            .iter()
            .find(|row| row.task.id == id)
            .map(|row| tables.view(row)))
    }

    async fn update_task(
        &self,
        id: Uuid,
        changes: TaskChanges,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Task>> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(assignee) = changes.assigned_to {
            if tables.user(assignee).is_none() {
                return Err(StoreError::MissingReference("assignedTo"));
            }
        }
        let Some(index) = tables.tasks.iter().position(|row| row.task.id == id) else {
            return Ok(None);
        };

        let row = &mut tables.tasks[index];
        if let Some(title) = changes.title {
            row.task.title = title;
        }
        if let Some(description) = changes.description {
            row.task.description = Some(description);
        }
        if let Some(status) = changes.status {
            row.task.status = status;
        }
        if let Some(priority) = changes.priority {
            row.task.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            row.task.due_date = Some(due_date);
        }
        if let Some(assigned_to) = changes.assigned_to {
            row.task.assigned_to = Some(assigned_to);
        }
        row.updated_at = updated_at;

        let tables = &*tables;
        Ok(Some(tables.view(&tables.tasks[index])))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.tasks.len();
        tables.tasks.retain(|row| row.task.id != id);
        Ok(tables.tasks.len() < before)
    }
}

pub fn test_issuer() -> SessionIssuer {
    SessionIssuer::new(TEST_SECRET, Duration::hours(1))
}

pub fn test_state(store: &Arc<MemoryStore>) -> AppState {
    AppState::new(
        store.clone(),
        store.clone(),
        PasswordHasher::new(TEST_COST),
        test_issuer(),
    )
    .expect("test state")
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Registers through the HTTP surface; returns the `user` object.
pub async fn register<S, B>(app: &S, username: &str, email: &str) -> Value
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": username, "email": email, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    body["user"].clone()
}

/// Registers then logs in; returns `(user, token)`.
pub async fn register_and_login<S, B>(app: &S, username: &str, email: &str) -> (Value, String)
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let user = register(app, username, email).await;
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().expect("token").to_string();
    (user, token)
}
