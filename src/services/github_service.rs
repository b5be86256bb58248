//! GitHub enrichment fetcher.
//!
//! Fire-and-forget side channel: after a publish is authorized, up to three
//! independent fetches (repository info, contributor list, readme) run on a
//! detached task and best-effort persist into `github_repos`. Failures are
//! logged and swallowed; nothing here can delay or fail an ingestion call.

use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::models::catalog::RepositoryIdentity;
use crate::models::upload::FetchFlags;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors internal to enrichment; never surfaced to the ingestion caller.
#[derive(Error, Debug)]
enum GithubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub returned status {0}")]
    Status(u16),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    description: Option<String>,
    stargazers_count: Option<i64>,
    forks_count: Option<i64>,
}

/// GitHub API client and enrichment persistence
pub struct GithubService {
    http: Client,
    api_base: String,
    db: SqlitePool,
}

impl GithubService {
    pub fn new(api_base: impl Into<String>, db: SqlitePool) -> Result<Self> {
        let http = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("pomindex/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            db,
        })
    }

    /// Spawn the enrichment task for one repository. Returns immediately;
    /// the task outcome never reaches the caller.
    pub fn enrich(self: Arc<Self>, identity: RepositoryIdentity, token: Option<String>, flags: FetchFlags) {
        if !flags.any() {
            return;
        }

        let service = self;
        tokio::spawn(async move {
            if let Err(e) = service.run_enrichment(&identity, token.as_deref(), flags).await {
                warn!(repo = %identity, error = %e, "Enrichment failed");
            }
        });
    }

    async fn run_enrichment(
        &self,
        identity: &RepositoryIdentity,
        token: Option<&str>,
        flags: FetchFlags,
    ) -> std::result::Result<(), GithubError> {
        // Each fetch is independent: one failing must not stop the others.
        let mut info: Option<RepoInfo> = None;
        let mut contributor_count: Option<i64> = None;
        let mut readme: Option<String> = None;

        if flags.info {
            match self.fetch_repo_info(identity, token).await {
                Ok(v) => info = Some(v),
                Err(e) => warn!(repo = %identity, error = %e, "Repo info fetch failed"),
            }
        }
        if flags.contributors {
            match self.fetch_contributor_count(identity, token).await {
                Ok(v) => contributor_count = Some(v),
                Err(e) => warn!(repo = %identity, error = %e, "Contributors fetch failed"),
            }
        }
        if flags.readme {
            match self.fetch_readme(identity, token).await {
                Ok(v) => readme = Some(v),
                Err(e) => warn!(repo = %identity, error = %e, "Readme fetch failed"),
            }
        }

        if info.is_none() && contributor_count.is_none() && readme.is_none() {
            return Ok(());
        }

        // Fields not fetched this time keep their previous values.
        sqlx::query(
            r#"
            INSERT INTO github_repos (owner, name, description, stars, forks, contributor_count, readme, fetched_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (owner, name) DO UPDATE SET
                description = COALESCE(excluded.description, description),
                stars = COALESCE(excluded.stars, stars),
                forks = COALESCE(excluded.forks, forks),
                contributor_count = COALESCE(excluded.contributor_count, contributor_count),
                readme = COALESCE(excluded.readme, readme),
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(&identity.owner)
        .bind(&identity.name)
        .bind(info.as_ref().and_then(|i| i.description.clone()))
        .bind(info.as_ref().and_then(|i| i.stargazers_count))
        .bind(info.as_ref().and_then(|i| i.forks_count))
        .bind(contributor_count)
        .bind(readme)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        debug!(repo = %identity, "Enrichment stored");
        Ok(())
    }

    async fn fetch_repo_info(
        &self,
        identity: &RepositoryIdentity,
        token: Option<&str>,
    ) -> std::result::Result<RepoInfo, GithubError> {
        let url = format!("{}/repos/{}/{}", self.api_base, identity.owner, identity.name);
        let response = self
            .request(&url, token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GithubError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    async fn fetch_contributor_count(
        &self,
        identity: &RepositoryIdentity,
        token: Option<&str>,
    ) -> std::result::Result<i64, GithubError> {
        let url = format!(
            "{}/repos/{}/{}/contributors?per_page=100",
            self.api_base, identity.owner, identity.name
        );
        let response = self
            .request(&url, token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GithubError::Status(response.status().as_u16()));
        }

        let contributors: Vec<serde_json::Value> = response.json().await?;
        Ok(contributors.len() as i64)
    }

    async fn fetch_readme(
        &self,
        identity: &RepositoryIdentity,
        token: Option<&str>,
    ) -> std::result::Result<String, GithubError> {
        let url = format!(
            "{}/repos/{}/{}/readme",
            self.api_base, identity.owner, identity.name
        );
        let response = self
            .request(&url, token)
            .header(ACCEPT, "application/vnd.github.raw")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GithubError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }

    fn request(&self, url: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let mut builder = self.http.get(url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}
