use std::sync::Arc;

use actix_web::web;
use chrono::Duration;

use crate::auth::{PasswordHasher, SessionIssuer};
use crate::config::Config;
use crate::error::AppError;
use crate::routes;
use crate::services::{IdentityService, TaskService};
use crate::store::{TaskStore, UserStore};

/// Shared application state, registered as actix app data.
#[derive(Clone)]
pub struct AppState {
    pub identity: web::Data<IdentityService>,
    pub tasks: web::Data<TaskService>,
    pub sessions: web::Data<SessionIssuer>,
}

impl AppState {
    /// Wires the services over explicit store handles.
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        hasher: PasswordHasher,
        sessions: SessionIssuer,
    ) -> Result<Self, AppError> {
        let identity = IdentityService::new(users, hasher, sessions.clone())?;
        Ok(Self {
            identity: web::Data::new(identity),
            tasks: web::Data::new(TaskService::new(tasks)),
            sessions: web::Data::new(sessions),
        })
    }

    /// Builds the state from configuration over a single backing store.
    pub fn from_config<S>(config: &Config, store: Arc<S>) -> Result<Self, AppError>
    where
        S: UserStore + TaskStore + 'static,
    {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let sessions = SessionIssuer::new(
            &config.jwt_secret,
            Duration::seconds(config.token_ttl_secs),
        );
        Self::new(store.clone(), store, hasher, sessions)
    }

    /// Registers app data, extractor configs and all routes (`/health`, `/api/...`).
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.identity.clone())
            .app_data(self.tasks.clone())
            .app_data(self.sessions.clone())
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .app_data(routes::path_config())
            .service(routes::health::health)
            .service(web::scope("/api").configure(routes::config));
    }
}
