//! Index writer: owns all catalog mutation and the read-path queries.
//!
//! Upserts are query-then-branch, so the store carries no uniqueness
//! constraint on references. To keep the at-most-one-row-per-reference
//! invariant under concurrent publishes, every upsert runs inside a
//! per-reference async lock.

use chrono::Utc;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::Result;
use crate::formats::pom::PomDependency;
use crate::models::catalog::{NewProject, NewRelease, Project, Release};

/// Keyword frequency across live projects
#[derive(Debug, Clone, Serialize)]
pub struct TopicCount {
    pub keyword: String,
    pub count: i64,
}

/// How many distinct projects depend on a coordinate
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DependencyCount {
    pub group_id: String,
    pub artifact_id: String,
    pub dependents: i64,
}

/// Catalog row totals
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogCounts {
    pub projects: i64,
    pub releases: i64,
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: String,
    group_id: String,
    artifact_id: String,
    keywords: String,
    live_data: bool,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            group_id: row.group_id,
            artifact_id: row.artifact_id,
            keywords: serde_json::from_str(&row.keywords).unwrap_or_default(),
            live_data: row.live_data,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Catalog index writer and query interface
pub struct IndexService {
    db: SqlitePool,
    /// Per-reference write locks, keyed by `p:<g>:<a>` / `r:<g>:<a>:<v>`.
    /// Entries are evicted once no writer holds them.
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl IndexService {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn reference_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("reference lock map poisoned");
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Drop the map entry for `key` unless a concurrent writer still holds a
    /// clone of it. Called after the caller has released both guard and Arc,
    /// so an uncontended entry sits at strong count 1 (the map's own).
    fn evict_reference_lock(&self, key: &str) {
        let mut locks = self.locks.lock().expect("reference lock map poisoned");
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }

    /// Upsert a project by its `(groupId, artifactId)` reference.
    ///
    /// Later publishes overwrite keywords and the liveness flag; exactly one
    /// row per reference is guaranteed by the per-reference lock around the
    /// query+decide+write sequence.
    pub async fn upsert_project(&self, project: &NewProject) -> Result<String> {
        let key = format!("p:{}:{}", project.group_id, project.artifact_id);
        let lock = self.reference_lock(&key);
        let result = {
            let _guard = lock.lock().await;
            self.write_project(project).await
        };
        drop(lock);
        self.evict_reference_lock(&key);
        result
    }

    async fn write_project(&self, project: &NewProject) -> Result<String> {
        let now = Utc::now();
        let keywords = serde_json::to_string(&project.keywords)?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM projects WHERE group_id = ? AND artifact_id = ?")
                .bind(&project.group_id)
                .bind(&project.artifact_id)
                .fetch_optional(&self.db)
                .await?;

        match existing {
            Some(id) => {
                sqlx::query(
                    "UPDATE projects SET keywords = ?, live_data = ?, updated_at = ? WHERE id = ?",
                )
                .bind(&keywords)
                .bind(project.live_data)
                .bind(now)
                .bind(&id)
                .execute(&self.db)
                .await?;
                Ok(id)
            }
            None => {
                let id = Uuid::new_v4().to_string();
                sqlx::query(
                    r#"
                    INSERT INTO projects (id, group_id, artifact_id, keywords, live_data, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(&project.group_id)
                .bind(&project.artifact_id)
                .bind(&keywords)
                .bind(project.live_data)
                .bind(now)
                .bind(now)
                .execute(&self.db)
                .await?;
                Ok(id)
            }
        }
    }

    /// Upsert a release by its `(groupId, artifactId, version)` reference.
    ///
    /// Republishing an existing reference refreshes only the liveness flag;
    /// a new reference inserts one row and its dependency coordinates in a
    /// single transaction, so a failure leaves no partial release behind.
    pub async fn upsert_release(
        &self,
        release: &NewRelease,
        dependencies: &[PomDependency],
    ) -> Result<String> {
        let key = format!(
            "r:{}:{}:{}",
            release.group_id, release.artifact_id, release.version
        );
        let lock = self.reference_lock(&key);
        let result = {
            let _guard = lock.lock().await;
            self.write_release(release, dependencies).await
        };
        drop(lock);
        self.evict_reference_lock(&key);
        result
    }

    async fn write_release(
        &self,
        release: &NewRelease,
        dependencies: &[PomDependency],
    ) -> Result<String> {
        let now = Utc::now();

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM releases WHERE group_id = ? AND artifact_id = ? AND version = ?",
        )
        .bind(&release.group_id)
        .bind(&release.artifact_id)
        .bind(&release.version)
        .fetch_optional(&self.db)
        .await?;

        match existing {
            Some(id) => {
                sqlx::query("UPDATE releases SET live_data = ?, updated_at = ? WHERE id = ?")
                    .bind(release.live_data)
                    .bind(now)
                    .bind(&id)
                    .execute(&self.db)
                    .await?;
                Ok(id)
            }
            None => {
                let id = Uuid::new_v4().to_string();
                let mut tx = self.db.begin().await?;
                sqlx::query(
                    r#"
                    INSERT INTO releases (
                        id, group_id, artifact_id, version, platform,
                        digest, size_bytes, published_at, live_data, created_at, updated_at
                    )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(&release.group_id)
                .bind(&release.artifact_id)
                .bind(&release.version)
                .bind(&release.platform)
                .bind(&release.digest)
                .bind(release.size_bytes)
                .bind(release.published_at)
                .bind(release.live_data)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                for dep in dependencies {
                    sqlx::query(
                        r#"
                        INSERT INTO release_dependencies (release_id, dep_group_id, dep_artifact_id, dep_version, scope)
                        VALUES (?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(&id)
                    .bind(&dep.group_id)
                    .bind(&dep.artifact_id)
                    .bind(&dep.version)
                    .bind(&dep.scope)
                    .execute(&mut *tx)
                    .await?;
                }

                tx.commit().await?;
                Ok(id)
            }
        }
    }

    // ------------------------------------------------------------------
    // Read path, consumed by the browsing/search collaborator
    // ------------------------------------------------------------------

    pub async fn find_project_by_reference(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects WHERE group_id = ? AND artifact_id = ?",
        )
        .bind(group_id)
        .bind(artifact_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Project::from))
    }

    pub async fn find_releases_by_project_reference(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<Release>> {
        let releases = sqlx::query_as::<_, Release>(
            r#"
            SELECT * FROM releases
            WHERE group_id = ? AND artifact_id = ?
            ORDER BY published_at DESC
            "#,
        )
        .bind(group_id)
        .bind(artifact_id)
        .fetch_all(&self.db)
        .await?;

        Ok(releases)
    }

    pub async fn latest_projects(&self, limit: i64) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    pub async fn latest_releases(&self, limit: i64) -> Result<Vec<Release>> {
        let releases = sqlx::query_as::<_, Release>(
            "SELECT * FROM releases ORDER BY published_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(releases)
    }

    pub async fn counts(&self) -> Result<CatalogCounts> {
        let projects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.db)
            .await?;
        let releases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM releases")
            .fetch_one(&self.db)
            .await?;

        Ok(CatalogCounts { projects, releases })
    }

    /// Keyword frequency across live projects, most frequent first.
    pub async fn topics(&self) -> Result<Vec<TopicCount>> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT keywords FROM projects WHERE live_data = 1")
                .fetch_all(&self.db)
                .await?;

        let mut counts: HashMap<String, i64> = HashMap::new();
        for raw in rows {
            let keywords: Vec<String> = serde_json::from_str(&raw).unwrap_or_default();
            for keyword in keywords {
                *counts.entry(keyword).or_insert(0) += 1;
            }
        }

        let mut topics: Vec<TopicCount> = counts
            .into_iter()
            .map(|(keyword, count)| TopicCount { keyword, count })
            .collect();
        topics.sort_by(|a, b| b.count.cmp(&a.count).then(a.keyword.cmp(&b.keyword)));
        Ok(topics)
    }

    /// Distinct target platforms across all releases.
    pub async fn target_platforms(&self) -> Result<Vec<String>> {
        let platforms: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT platform FROM releases WHERE platform IS NOT NULL ORDER BY platform",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(platforms)
    }

    /// Coordinates the largest number of distinct projects depend on.
    pub async fn most_depended_upon(&self, limit: i64) -> Result<Vec<DependencyCount>> {
        let rows = sqlx::query_as::<_, DependencyCount>(
            r#"
            SELECT
                d.dep_group_id AS group_id,
                d.dep_artifact_id AS artifact_id,
                COUNT(DISTINCT r.group_id || ':' || r.artifact_id) AS dependents
            FROM release_dependencies d
            JOIN releases r ON r.id = d.release_id
            GROUP BY d.dep_group_id, d.dep_artifact_id
            ORDER BY dependents DESC, group_id, artifact_id
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::NewProject;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn in_memory_index() -> IndexService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        IndexService::new(pool)
    }

    fn project(artifact_id: &str) -> NewProject {
        NewProject {
            group_id: "org.acme".to_string(),
            artifact_id: artifact_id.to_string(),
            keywords: Vec::new(),
            live_data: true,
        }
    }

    #[tokio::test]
    async fn test_reference_locks_do_not_accumulate() {
        let index = in_memory_index().await;

        for i in 0..32 {
            index.upsert_project(&project(&format!("lib-{i}"))).await.unwrap();
        }

        assert!(index.locks.lock().unwrap().is_empty());
    }
}
