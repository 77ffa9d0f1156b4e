//! Persistence contracts.
//!
//! The services only see these traits, held as `Arc<dyn UserStore>` and
//! `Arc<dyn TaskStore>`. `PgStore` is the production implementation; tests plug
//! in their own doubles. Implementations must not cache rows: every read goes to
//! the backing store.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewTask, NewUser, Task, TaskChanges, User};

pub use postgres::PgStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
    /// A foreign key pointed at a row that does not exist. Carries the request
    /// field name.
    #[error("referenced row for `{0}` does not exist")]
    MissingReference(&'static str),
    /// Connection, timeout or any other backend failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Message for a duplicate normalized email.
pub const EMAIL_TAKEN: &str = "This email is already registered.";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts atomically; a duplicate email yields `StoreError::Conflict`.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    /// `email` must already be normalized.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Cheap round-trip used by the health check.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts and returns the row with assignee fields resolved.
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task>;

    /// Newest first. `search` is a case-insensitive substring matched against
    /// title, description, assignee username and assignee email.
    async fn list_tasks(&self, search: Option<&str>) -> StoreResult<Vec<Task>>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Coalescing update; `None` when no row has `id`.
    async fn update_task(
        &self,
        id: Uuid,
        changes: TaskChanges,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Task>>;

    /// `false` when no row has `id`.
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}
