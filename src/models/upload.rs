//! Per-call upload model and publish outcomes.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use super::catalog::RepositoryIdentity;

/// The principal submitting an upload.
///
/// Everything the authorization gate needs is attached here; the gate itself
/// performs no external call.
#[derive(Debug, Clone)]
pub struct Principal {
    pub username: String,
    /// Token forwarded to the enrichment fetcher (never stored)
    pub token: Option<String>,
    /// Trusted publishers may claim any repository identity
    pub trusted: bool,
    /// Repositories this principal is known to have write access to
    pub known_repos: HashSet<RepositoryIdentity>,
}

/// Per-fetch enrichment toggles supplied by the submitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchFlags {
    pub info: bool,
    pub contributors: bool,
    pub readme: bool,
}

impl FetchFlags {
    pub fn any(&self) -> bool {
        self.info || self.contributors || self.readme
    }
}

/// One uploaded artifact descriptor. Constructed per HTTP call and lives only
/// for the duration of one ingestion attempt.
#[derive(Debug, Clone)]
pub struct ArtifactUpload {
    /// Declared relative path of the uploaded file
    pub path: String,
    pub bytes: Bytes,
    pub principal: Principal,
    pub flags: FetchFlags,
    pub keywords: Vec<String>,
    /// Publish instant claimed by the build tool; defaults to receipt time
    pub created: Option<DateTime<Utc>>,
}

/// Why an upload was accepted without touching the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Path does not carry the metadata-file suffix
    NotPom,
    /// Valid POM without a resolvable GitHub repository
    NoRepository,
}

/// Terminal outcome of one ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Metadata was folded into the catalog
    Indexed {
        project_id: String,
        release_id: String,
    },
    /// Accepted, but nothing was indexed
    Ignored(IgnoreReason),
}
