//! Catalog conversion: maps a parsed coordinate plus the registry search
//! record into the canonical project/release pair.
//!
//! Pure and deterministic; no I/O and no partial failure.

use crate::formats::pom::{self, ArtifactCoordinate};
use crate::models::catalog::{NewProject, NewRelease, RegistrySearchRecord};

/// Build the canonical catalog entities for one publish.
pub fn to_catalog_entities(
    coordinate: &ArtifactCoordinate,
    record: &RegistrySearchRecord,
    keywords: &[String],
) -> (NewProject, NewRelease) {
    let project = NewProject {
        group_id: coordinate.group_id.clone(),
        artifact_id: coordinate.artifact_id.clone(),
        keywords: keywords.to_vec(),
        live_data: true,
    };

    let release = NewRelease {
        group_id: coordinate.group_id.clone(),
        artifact_id: coordinate.artifact_id.clone(),
        version: coordinate.version.clone(),
        platform: pom::target_platform(&coordinate.artifact_id),
        digest: record.digest.clone(),
        size_bytes: record.size_bytes,
        published_at: record.published_at,
        live_data: true,
    };

    (project, release)
}
