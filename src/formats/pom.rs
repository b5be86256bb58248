//! POM metadata parsing.
//!
//! Extracts the `(groupId, artifactId, version)` coordinate, the SCM
//! reference strings, and the declared dependencies from a Maven POM.
//! Only the fields needed for identity and dedup are modeled.

use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::catalog::RepositoryIdentity;

/// Check whether a declared upload path is a POM file.
pub fn is_pom(path: &str) -> bool {
    path.ends_with(".pom") || path.ends_with("/pom.xml")
}

/// Coordinate extracted from one POM, produced once per upload.
#[derive(Debug, Clone)]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// SCM reference candidates in priority order (connection,
    /// developerConnection, url)
    pub scm_tags: Vec<String>,
    pub dependencies: Vec<PomDependency>,
}

impl ArtifactCoordinate {
    /// Resolve the backing repository from the SCM candidates, if any.
    pub fn repository(&self) -> Option<RepositoryIdentity> {
        self.scm_tags
            .iter()
            .find_map(|tag| RepositoryIdentity::from_scm(tag))
    }

    /// `groupId:artifactId:version` string form.
    pub fn coordinate_string(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Parse a POM file into its coordinate.
///
/// groupId and version inherit from `<parent>` when absent; a coordinate
/// still missing a mandatory field after inheritance is a parse error.
pub fn parse_pom(content: &[u8]) -> Result<ArtifactCoordinate> {
    let content_str = std::str::from_utf8(content)
        .map_err(|e| AppError::Parse(format!("Invalid UTF-8 in POM: {}", e)))?;

    let pom: PomProject =
        from_str(content_str).map_err(|e| AppError::Parse(format!("Invalid POM XML: {}", e)))?;

    let parent = pom.parent.as_ref();
    let group_id = pom
        .group_id
        .or_else(|| parent.and_then(|p| p.group_id.clone()))
        .ok_or_else(|| AppError::Parse("POM is missing groupId".to_string()))?;
    let artifact_id = pom
        .artifact_id
        .ok_or_else(|| AppError::Parse("POM is missing artifactId".to_string()))?;
    let version = pom
        .version
        .or_else(|| parent.and_then(|p| p.version.clone()))
        .ok_or_else(|| AppError::Parse("POM is missing version".to_string()))?;

    let scm_tags = pom
        .scm
        .map(|scm| {
            [scm.connection, scm.developer_connection, scm.url]
                .into_iter()
                .flatten()
                .filter(|t| !t.trim().is_empty())
                .collect()
        })
        .unwrap_or_default();

    let dependencies = pom.dependencies.map(|d| d.dependency).unwrap_or_default();

    Ok(ArtifactCoordinate {
        group_id,
        artifact_id,
        version,
        scm_tags,
        dependencies,
    })
}

/// Parse the target-platform suffix out of an artifactId.
///
/// Cross-built artifacts encode their platform in the name:
/// `lib_2.13`, `lib_3`, `lib_sjs1_2.13`, `lib_native0.4_2.13`.
/// Returns `None` for plain artifact names.
pub fn target_platform(artifact_id: &str) -> Option<String> {
    let parts: Vec<&str> = artifact_id.split('_').collect();
    if parts.len() < 2 {
        return None;
    }

    let last = parts[parts.len() - 1];
    if !is_binary_version(last) {
        return None;
    }

    if parts.len() >= 3 {
        let prev = parts[parts.len() - 2];
        if prev.starts_with("sjs") || prev.starts_with("native") {
            return Some(format!("{}_{}", prev, last));
        }
    }

    Some(last.to_string())
}

fn is_binary_version(s: &str) -> bool {
    if s == "3" {
        return true;
    }
    match s.strip_prefix("2.") {
        Some(minor) => !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// POM project model (simplified)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PomProject {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    parent: Option<PomParent>,
    scm: Option<PomScm>,
    dependencies: Option<PomDependencies>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PomParent {
    group_id: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PomScm {
    connection: Option<String>,
    developer_connection: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PomDependencies {
    #[serde(default)]
    dependency: Vec<PomDependency>,
}

/// One declared dependency coordinate
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
}
