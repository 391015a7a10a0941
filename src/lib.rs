//! Carrel Library Management Server
//!
//! A Rust REST API server for a campus library: user registration gated
//! by an admin approval workflow, book catalog management, and
//! circulation (issue/return) tracking.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
