//! Publish endpoint.
//!
//! `PUT /api/v1/publish?path=<relative-path>` with the raw file bytes as the
//! body. HTTP Basic credentials carry the principal's username and token;
//! the `X-Repositories` header lists the repositories the principal is known
//! to own, as comma-separated `owner/name` pairs.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;

use crate::api::dto::PublishResponse;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::catalog::RepositoryIdentity;
use crate::models::upload::{ArtifactUpload, FetchFlags, Principal, PublishOutcome};

#[derive(Debug, Deserialize)]
pub struct PublishParams {
    /// Declared relative path of the uploaded file
    pub path: String,
    /// Publish instant claimed by the build tool (RFC 3339)
    pub created: Option<DateTime<Utc>>,
    /// Enrichment toggles
    #[serde(default)]
    pub info: bool,
    #[serde(default)]
    pub contributors: bool,
    #[serde(default)]
    pub readme: bool,
    /// Comma-separated free-text keywords
    pub keywords: Option<String>,
}

fn extract_basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic ").or(v.strip_prefix("basic ")))
        .and_then(|b64| base64::engine::general_purpose::STANDARD.decode(b64).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|s| {
            let mut parts = s.splitn(2, ':');
            let user = parts.next()?.to_string();
            let pass = parts.next()?.to_string();
            Some((user, pass))
        })
}

fn known_repositories(headers: &HeaderMap) -> HashSet<RepositoryIdentity> {
    headers
        .get("x-repositories")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').filter_map(RepositoryIdentity::parse).collect())
        .unwrap_or_default()
}

fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub async fn publish(
    State(state): State<SharedState>,
    Query(params): Query<PublishParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let Some((username, token)) = extract_basic_credentials(&headers) else {
        return Ok(Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header("WWW-Authenticate", "Basic realm=\"pomindex\"")
            .body(Body::from("Authentication required"))
            .unwrap());
    };

    let principal = Principal {
        trusted: state.config.trusted_publishers.contains(&username),
        username,
        token: if token.is_empty() { None } else { Some(token) },
        known_repos: known_repositories(&headers),
    };

    let upload = ArtifactUpload {
        path: params.path,
        bytes: body,
        principal,
        flags: FetchFlags {
            info: params.info,
            contributors: params.contributors,
            readme: params.readme,
        },
        keywords: split_csv(params.keywords.as_deref()),
        created: params.created,
    };

    let response = match state.publisher.publish(upload).await? {
        PublishOutcome::Indexed {
            project_id,
            release_id,
        } => (
            StatusCode::CREATED,
            Json(PublishResponse {
                status: "indexed",
                project_id: Some(project_id),
                release_id: Some(release_id),
                reason: None,
            }),
        ),
        PublishOutcome::Ignored(reason) => (
            StatusCode::OK,
            Json(PublishResponse {
                status: "ignored",
                project_id: None,
                release_id: None,
                reason: Some(reason),
            }),
        ),
    };

    Ok(response.into_response())
}
