//! API module - HTTP handlers and routes.

pub mod dto;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::services::index_service::IndexService;
use crate::services::publish_service::PublishService;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub publisher: PublishService,
    pub index: Arc<IndexService>,
}

impl AppState {
    pub fn new(config: Config, publisher: PublishService, index: Arc<IndexService>) -> Self {
        Self {
            config,
            publisher,
            index,
        }
    }
}

pub type SharedState = Arc<AppState>;
