//! Ingestion coordinator: the single entry point of the publish pipeline.
//!
//! Drives one upload through staging, parsing, repository resolution,
//! authorization, enrichment dispatch, conversion, and the catalog write.
//! The caller's response waits on the catalog mutation, never on enrichment.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::formats::pom;
use crate::models::catalog::RegistrySearchRecord;
use crate::models::upload::{ArtifactUpload, IgnoreReason, PublishOutcome};
use crate::services::auth_service;
use crate::services::convert;
use crate::services::github_service::GithubService;
use crate::services::index_service::IndexService;
use crate::services::staging_service::{StagedPom, StagingService};

/// Publish pipeline coordinator
pub struct PublishService {
    staging: StagingService,
    index: Arc<IndexService>,
    github: Arc<GithubService>,
}

impl PublishService {
    pub fn new(
        staging: StagingService,
        index: Arc<IndexService>,
        github: Arc<GithubService>,
    ) -> Self {
        Self {
            staging,
            index,
            github,
        }
    }

    /// Process one upload to its terminal outcome.
    ///
    /// Parse failures and authorization denials clean up the staged temp
    /// file before surfacing; ignored uploads are accepted without any
    /// catalog mutation.
    pub async fn publish(&self, upload: ArtifactUpload) -> Result<PublishOutcome> {
        let staged = self.staging.stage(&upload.bytes).await?;

        if !pom::is_pom(&upload.path) {
            self.cleanup(&staged).await;
            return Ok(PublishOutcome::Ignored(IgnoreReason::NotPom));
        }

        let coordinate = match pom::parse_pom(&upload.bytes) {
            Ok(coordinate) => coordinate,
            Err(e) => {
                self.cleanup(&staged).await;
                return Err(e);
            }
        };

        let Some(identity) = coordinate.repository() else {
            info!(
                coordinate = %coordinate.coordinate_string(),
                "No recognized repository in POM, accepting without indexing"
            );
            self.cleanup(&staged).await;
            return Ok(PublishOutcome::Ignored(IgnoreReason::NoRepository));
        };

        if !auth_service::authorize(&upload.principal, &identity) {
            self.cleanup(&staged).await;
            return Err(AppError::Authorization(format!(
                "{} may not publish for {}",
                upload.principal.username, identity
            )));
        }

        self.staging.promote(&staged).await?;

        // Enrichment runs detached; its outcome never affects this call.
        self.github.clone().enrich(
            identity,
            upload.principal.token.clone(),
            upload.flags,
        );

        let record = RegistrySearchRecord {
            coordinate: coordinate.coordinate_string(),
            digest: staged.digest.clone(),
            size_bytes: upload.bytes.len() as i64,
            published_at: upload.created.unwrap_or_else(Utc::now),
        };

        let (project, release) = convert::to_catalog_entities(&coordinate, &record, &upload.keywords);

        let project_id = self.index.upsert_project(&project).await?;
        let release_id = self
            .index
            .upsert_release(&release, &coordinate.dependencies)
            .await?;

        info!(
            coordinate = %record.coordinate,
            project_id,
            release_id,
            "Publish indexed"
        );

        Ok(PublishOutcome::Indexed {
            project_id,
            release_id,
        })
    }

    /// Best-effort temp file removal on non-indexing paths.
    async fn cleanup(&self, staged: &StagedPom) {
        if let Err(e) = self.staging.discard(staged).await {
            warn!(digest = %staged.digest, error = %e, "Failed to discard staged file");
        }
    }
}
