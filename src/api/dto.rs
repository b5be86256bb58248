//! Response DTOs.

use serde::Serialize;

use crate::models::catalog::{Project, Release};
use crate::models::upload::IgnoreReason;
use crate::services::index_service::{CatalogCounts, DependencyCount, TopicCount};

/// Response body for `PUT /api/v1/publish`
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<IgnoreReason>,
}

/// Project with its releases
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub releases: Vec<Release>,
}

/// Front-page aggregate payload
#[derive(Debug, Serialize)]
pub struct CatalogSummary {
    pub totals: CatalogCounts,
    pub latest_projects: Vec<Project>,
    pub latest_releases: Vec<Release>,
    pub topics: Vec<TopicCount>,
    pub target_platforms: Vec<String>,
    pub most_depended_upon: Vec<DependencyCount>,
}
