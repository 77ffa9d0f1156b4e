#![doc = "The `teamboard` library crate."]
#![doc = ""]
#![doc = "Identity (registration, login, bearer sessions) and task tracking for a small"]
#![doc = "team board. Services sit on injected store traits; `PgStore` backs them with"]
#![doc = "PostgreSQL. The binary (`main.rs`) loads `Config`, connects, and serves the"]
#![doc = "routes registered by `AppState::configure`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;
