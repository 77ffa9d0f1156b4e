pub mod task;
pub mod user;

pub use task::{
    CreateTaskRequest, NewTask, Task, TaskChanges, TaskPriority, UpdateTaskRequest,
    DEFAULT_STATUS,
};
pub use user::{NewUser, PublicUser, User};
