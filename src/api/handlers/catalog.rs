//! Read-only catalog endpoints consumed by the browsing/search collaborator.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::dto::{CatalogSummary, ProjectResponse};
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::catalog::Release;

const FRONT_PAGE_LIMIT: i64 = 12;

pub async fn get_project(
    State(state): State<SharedState>,
    Path((group, artifact)): Path<(String, String)>,
) -> Result<Json<ProjectResponse>> {
    let project = state
        .index
        .find_project_by_reference(&group, &artifact)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {}:{} not found", group, artifact)))?;

    let releases = state
        .index
        .find_releases_by_project_reference(&group, &artifact)
        .await?;

    Ok(Json(ProjectResponse { project, releases }))
}

pub async fn list_releases(
    State(state): State<SharedState>,
    Path((group, artifact)): Path<(String, String)>,
) -> Result<Json<Vec<Release>>> {
    let releases = state
        .index
        .find_releases_by_project_reference(&group, &artifact)
        .await?;

    Ok(Json(releases))
}

pub async fn summary(State(state): State<SharedState>) -> Result<Json<CatalogSummary>> {
    let totals = state.index.counts().await?;
    let latest_projects = state.index.latest_projects(FRONT_PAGE_LIMIT).await?;
    let latest_releases = state.index.latest_releases(FRONT_PAGE_LIMIT).await?;
    let topics = state.index.topics().await?;
    let target_platforms = state.index.target_platforms().await?;
    let most_depended_upon = state.index.most_depended_upon(FRONT_PAGE_LIMIT).await?;

    Ok(Json(CatalogSummary {
        totals,
        latest_projects,
        latest_releases,
        topics,
        target_platforms,
        most_depended_upon,
    }))
}
