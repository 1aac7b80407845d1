use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::state::AppState;
use crate::github::Contents;
use crate::revision::RevisionMeta;
use crate::service::DiffResponse;

const DEFAULT_HISTORY_LIMIT: usize = 10;
const MAX_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct DiffParams {
    pub repo: Option<String>,
    pub path: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevisionsParams {
    pub repo: Option<String>,
    pub path: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentsParams {
    pub repo: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionEntry {
    pub sha: String,
    pub short_sha: String,
    pub message: String,
    pub date: Option<DateTime<Utc>>,
}

impl From<RevisionMeta> for RevisionEntry {
    fn from(meta: RevisionMeta) -> Self {
        Self {
            message: meta.message_first_line().to_string(),
            sha: meta.id,
            short_sha: meta.short_id,
            date: meta.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevisionsResponse {
    pub revisions: Vec<RevisionEntry>,
}

/// Empty or whitespace-only query values count as missing.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn diff_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DiffParams>,
) -> Result<Json<DiffResponse>, ApiError> {
    let (Some(repo), Some(path)) = (present(&params.repo), present(&params.path)) else {
        return Err(ApiError::BadRequest("Missing repo or path"));
    };

    let report = match (present(&params.from), present(&params.to)) {
        (Some(from), Some(to)) => state.service.diff_between(repo, path, from, to).await?,
        (None, None) => state.service.diff_latest(repo, path).await?,
        _ => return Err(ApiError::BadRequest("Both from and to are required")),
    };

    Ok(Json(report.to_response()))
}

pub async fn revisions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RevisionsParams>,
) -> Result<Json<RevisionsResponse>, ApiError> {
    let (Some(repo), Some(path)) = (present(&params.repo), present(&params.path)) else {
        return Err(ApiError::BadRequest("Missing repo or path"));
    };
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let revisions = state.service.history(repo, path, limit).await?;
    Ok(Json(RevisionsResponse {
        revisions: revisions.into_iter().map(RevisionEntry::from).collect(),
    }))
}

pub async fn contents_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ContentsParams>,
) -> Result<Json<Contents>, ApiError> {
    let Some(repo) = present(&params.repo) else {
        return Err(ApiError::BadRequest("repo parameter required"));
    };
    let path = present(&params.path).unwrap_or_default();

    Ok(Json(state.github.contents(repo, path).await?))
}

pub async fn health_handler() -> &'static str {
    "ok"
}
