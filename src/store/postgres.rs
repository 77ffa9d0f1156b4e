use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore, EMAIL_TAKEN};
use crate::config::Config;
use crate::models::{NewTask, NewUser, Task, TaskChanges, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

// Shared projection for every task read: the task row plus assignee display fields.
const TASK_PROJECTION: &str = "SELECT t.id, t.title, t.description, t.status, t.priority, \
     t.due_date, t.created_by, t.assigned_to, t.created_at, t.updated_at, \
     u.username AS assignee_name, u.email AS assignee_email";

/// PostgreSQL-backed users and tasks tables.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool with the configured size, acquire timeout and per-statement
    /// timeout.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let options = PgConnectOptions::from_str(&config.database_url)
            .map_err(classify)?
            .options([(
                "statement_timeout",
                config.db_statement_timeout_ms.to_string(),
            )]);

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(classify)?;

        log::info!(
            "connected to PostgreSQL (max_connections={})",
            config.db_max_connections
        );
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {}", e)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5) RETURNING {cols}",
            cols = USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let sql = format!(
            "WITH t AS (
                INSERT INTO tasks
                    (id, title, description, status, priority, due_date, created_by, assigned_to, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
                RETURNING *
            )
            {} FROM t LEFT JOIN users u ON t.assigned_to = u.id",
            TASK_PROJECTION
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(&task.status)
            .bind(task.priority)
            .bind(task.due_date)
            .bind(task.created_by)
            .bind(task.assigned_to)
            .bind(task.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn list_tasks(&self, search: Option<&str>) -> StoreResult<Vec<Task>> {
        let rows = match search {
            Some(term) => {
                let sql = format!(
                    "{} FROM tasks t LEFT JOIN users u ON t.assigned_to = u.id
                     WHERE t.title ILIKE $1
                        OR t.description ILIKE $1
                        OR u.username ILIKE $1
                        OR u.email ILIKE $1
                     ORDER BY t.created_at DESC, t.seq DESC",
                    TASK_PROJECTION
                );
                sqlx::query_as::<_, Task>(&sql)
                    .bind(like_pattern(term))
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "{} FROM tasks t LEFT JOIN users u ON t.assigned_to = u.id
                     ORDER BY t.created_at DESC, t.seq DESC",
                    TASK_PROJECTION
                );
                sqlx::query_as::<_, Task>(&sql).fetch_all(&self.pool).await
            }
        };
        rows.map_err(classify)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!(
            "{} FROM tasks t LEFT JOIN users u ON t.assigned_to = u.id WHERE t.id = $1",
            TASK_PROJECTION
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)
    }

    async fn update_task(
        &self,
        id: Uuid,
        changes: TaskChanges,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Task>> {
        let sql = format!(
            "WITH t AS (
                UPDATE tasks
                SET
                    title       = COALESCE($1, title),
                    description = COALESCE($2, description),
                    status      = COALESCE($3, status),
                    priority    = COALESCE($4, priority),
                    due_date    = COALESCE($5, due_date),
                    assigned_to = COALESCE($6, assigned_to),
                    updated_at  = $7
                WHERE id = $8
                RETURNING *
            )
            {} FROM t LEFT JOIN users u ON t.assigned_to = u.id",
            TASK_PROJECTION
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.status)
            .bind(changes.priority)
            .bind(changes.due_date)
            .bind(changes.assigned_to)
            .bind(updated_at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }
}

/// Wraps `term` in `%` wildcards, escaping LIKE metacharacters so the term
/// matches literally.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn classify(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() {
            return StoreError::Conflict(EMAIL_TAKEN.to_string());
        }
        if db.is_foreign_key_violation() {
            let field = match db.constraint() {
                Some("tasks_created_by_fkey") => "createdBy",
                _ => "assignedTo",
            };
            return StoreError::MissingReference(field);
        }
    }
    StoreError::Unavailable(error.to_string())
}
