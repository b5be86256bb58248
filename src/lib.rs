//! pomindex - Library metadata registry
//!
//! Ingests build-tool-generated POM files and folds them into a searchable
//! catalog of projects and releases.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod formats;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
