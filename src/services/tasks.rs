use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{CreateTaskRequest, NewTask, Task, TaskChanges, UpdateTaskRequest};
use crate::store::TaskStore;

pub const TASK_NOT_FOUND: &str = "Task not found";

/// Task use-cases on top of a `TaskStore`.
///
/// Every read goes to the store; assignee display fields are resolved there at
/// query time and never held here.
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    pub async fn create(&self, input: CreateTaskRequest, created_by: Uuid) -> Result<Task, AppError> {
        input.validate()?;

        let task = NewTask::from_request(input, created_by, Utc::now());
        let task = self.tasks.insert_task(task).await?;
        log::info!("task {} created by {}", task.id, created_by);
        Ok(task)
    }

    /// An empty search term is the same as none.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Task>, AppError> {
        let term = search.filter(|term| !term.is_empty());
        Ok(self.tasks.list_tasks(term).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, AppError> {
        self.tasks
            .find_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))
    }

    pub async fn update(&self, id: Uuid, input: UpdateTaskRequest) -> Result<Task, AppError> {
        input.validate()?;

        let changes = TaskChanges::from(input);
        let task = self
            .tasks
            .update_task(id, changes, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))?;
        log::info!("task {} updated", task.id);
        Ok(task)
    }

    /// A repeated delete of the same id is `NotFound`, not a silent success.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.tasks.delete_task(id).await? {
            return Err(AppError::NotFound(TASK_NOT_FOUND.into()));
        }
        log::info!("task {} deleted", id);
        Ok(())
    }
}
