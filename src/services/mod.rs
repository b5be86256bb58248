//! Ingestion pipeline services.

pub mod auth_service;
pub mod convert;
pub mod github_service;
pub mod index_service;
pub mod publish_service;
pub mod staging_service;
