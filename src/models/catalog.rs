//! Catalog entities: projects, releases, and repository identities.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;

/// Canonical `(owner, name)` reference to a hosted source-control repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub name: String,
}

impl RepositoryIdentity {
    /// Extract a GitHub repository identity from an SCM tag string.
    ///
    /// Recognizes the forms found in real POMs:
    /// `scm:git:git@github.com:owner/name.git`,
    /// `scm:git:https://github.com/owner/name.git`,
    /// `https://github.com/owner/name`, `git://github.com/owner/name.git`.
    ///
    /// Returns `None` for anything not hosted on github.com; that is the
    /// normal outcome for artifacts without a tracked repository, not an
    /// error.
    pub fn from_scm(tag: &str) -> Option<Self> {
        const HOST: &str = "github.com";
        let lower = tag.to_lowercase();
        let bytes = lower.as_bytes();

        // The host must match as a whole component: lookalikes such as
        // github.community or my-github.com.example.org are not GitHub.
        let mut search = 0;
        while let Some(offset) = lower[search..].find(HOST) {
            let idx = search + offset;
            let end = idx + HOST.len();
            let starts_host = idx == 0 || matches!(bytes[idx - 1], b'@' | b'/' | b':');
            let ends_host = matches!(bytes.get(end), Some(b':') | Some(b'/'));
            if !(starts_host && ends_host) {
                search = end;
                continue;
            }

            let rest = lower[end..].trim_start_matches([':', '/']);
            let mut segments = rest.split(['/', '#', '?']);
            let owner = segments.next()?.trim();
            let name = segments.next()?.trim().trim_end_matches(".git");
            if owner.is_empty() || name.is_empty() {
                return None;
            }

            return Some(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }

        None
    }

    /// Parse an `owner/name` pair.
    pub fn parse(s: &str) -> Option<Self> {
        let (owner, name) = s.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            owner: owner.to_lowercase(),
            name: name.to_lowercase(),
        })
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One row of already-known facts about the published binary artifact,
/// folded into the canonical entities by the converter.
#[derive(Debug, Clone)]
pub struct RegistrySearchRecord {
    /// `groupId:artifactId:version` coordinate string
    pub coordinate: String,
    /// SHA-256 hex digest of the uploaded metadata file
    pub digest: String,
    pub size_bytes: i64,
    pub published_at: DateTime<Utc>,
}

/// Project fields produced by the converter, before the catalog assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub group_id: String,
    pub artifact_id: String,
    pub keywords: Vec<String>,
    pub live_data: bool,
}

/// Release fields produced by the converter, before the catalog assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelease {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub platform: Option<String>,
    pub digest: String,
    pub size_bytes: i64,
    pub published_at: DateTime<Utc>,
    pub live_data: bool,
}

/// Persisted project entity
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: String,
    pub group_id: String,
    pub artifact_id: String,
    pub keywords: Vec<String>,
    pub live_data: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted release entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Release {
    pub id: String,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub platform: Option<String>,
    pub digest: String,
    pub size_bytes: i64,
    pub published_at: DateTime<Utc>,
    pub live_data: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scm_connection_tag() {
        let id = RepositoryIdentity::from_scm("scm:git:git@github.com:Acme/Lib.git").unwrap();
        assert_eq!(id.owner, "acme");
        assert_eq!(id.name, "lib");
    }

    #[test]
    fn test_from_scm_https_url() {
        let id = RepositoryIdentity::from_scm("https://github.com/acme/lib").unwrap();
        assert_eq!(id.owner, "acme");
        assert_eq!(id.name, "lib");
    }

    #[test]
    fn test_from_scm_git_protocol() {
        let id = RepositoryIdentity::from_scm("scm:git:git://github.com/acme/lib.git").unwrap();
        assert_eq!(id, RepositoryIdentity::parse("acme/lib").unwrap());
    }

    #[test]
    fn test_from_scm_trailing_path() {
        let id = RepositoryIdentity::from_scm("https://github.com/acme/lib/tree/main").unwrap();
        assert_eq!(id.name, "lib");
    }

    #[test]
    fn test_from_scm_rejects_other_hosts() {
        assert_eq!(RepositoryIdentity::from_scm("https://gitlab.com/acme/lib"), None);
        assert_eq!(RepositoryIdentity::from_scm("scm:svn:http://svn.example.org/repo"), None);
    }

    #[test]
    fn test_from_scm_rejects_lookalike_hosts() {
        assert_eq!(RepositoryIdentity::from_scm("https://github.community/acme/lib"), None);
        assert_eq!(
            RepositoryIdentity::from_scm("https://my-github.com.example.org/acme/lib"),
            None
        );
        assert_eq!(RepositoryIdentity::from_scm("https://github.com.example.org/acme/lib"), None);
    }

    #[test]
    fn test_from_scm_missing_name() {
        assert_eq!(RepositoryIdentity::from_scm("https://github.com/acme"), None);
        assert_eq!(RepositoryIdentity::from_scm("https://github.com/"), None);
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            RepositoryIdentity::parse("Acme/Lib"),
            Some(RepositoryIdentity {
                owner: "acme".into(),
                name: "lib".into()
            })
        );
        assert_eq!(RepositoryIdentity::parse("acme"), None);
    }
}
