//! Lending catalog server
//!
//! Books, per-title stock counters and loans behind a REST JSON API. Borrow
//! and return run as single database transactions serialized per title by a
//! row lock on the stock record.

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
