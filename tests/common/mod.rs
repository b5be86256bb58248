//! Common test utilities for pipeline and catalog tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use sqlx::SqlitePool;
use tempfile::TempDir;

use pomindex::db;
use pomindex::models::catalog::RepositoryIdentity;
use pomindex::models::upload::{ArtifactUpload, FetchFlags, Principal};
use pomindex::services::github_service::GithubService;
use pomindex::services::index_service::IndexService;
use pomindex::services::publish_service::PublishService;
use pomindex::services::staging_service::StagingService;

/// Test context: one isolated storage dir + catalog per test
pub struct TestContext {
    // Held so the temp dir outlives the test
    pub dir: TempDir,
    pub pool: SqlitePool,
    pub index: Arc<IndexService>,
    pub publisher: Arc<PublishService>,
}

impl TestContext {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("catalog.db");
        let pool = db::create_pool(&format!("sqlite://{}", db_path.display()))
            .await
            .expect("Failed to create pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let index = Arc::new(IndexService::new(pool.clone()));
        // Unroutable host: enrichment failures must never affect publishing
        let github =
            Arc::new(GithubService::new("http://127.0.0.1:9", pool.clone()).expect("http client"));
        let publisher = Arc::new(PublishService::new(
            StagingService::new(dir.path().join("store")),
            index.clone(),
            github,
        ));

        Self {
            dir,
            pool,
            index,
            publisher,
        }
    }

    pub fn staging_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("store").join("staging")
    }

    /// Number of files left in the staging area
    pub fn staged_file_count(&self) -> usize {
        match std::fs::read_dir(self.staging_dir()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// Minimal valid POM with an optional SCM connection tag
pub fn pom_xml(group: &str, artifact: &str, version: &str, scm: Option<&str>) -> String {
    let scm_block = scm
        .map(|tag| format!("<scm><connection>{}</connection></scm>", tag))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>{group}</groupId>
  <artifactId>{artifact}</artifactId>
  <version>{version}</version>
  {scm_block}
</project>"#
    )
}

pub fn principal(username: &str, trusted: bool, repos: &[&str]) -> Principal {
    Principal {
        username: username.to_string(),
        token: None,
        trusted,
        known_repos: repos
            .iter()
            .map(|r| RepositoryIdentity::parse(r).expect("bad repo in fixture"))
            .collect::<HashSet<_>>(),
    }
}

pub fn upload(path: &str, content: &str, principal: Principal) -> ArtifactUpload {
    ArtifactUpload {
        path: path.to_string(),
        bytes: Bytes::from(content.to_string()),
        principal,
        flags: FetchFlags::default(),
        keywords: Vec::new(),
        created: None,
    }
}
