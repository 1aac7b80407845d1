pub mod cache;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchResult;

pub use cache::CachedSource;

/// Length of the abbreviated commit id shown in diff headers.
pub const SHORT_ID_LEN: usize = 7;

/// One historical revision of a tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMeta {
    pub id: String,
    pub short_id: String,
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RevisionMeta {
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        let id = id.into();
        let short_id = id.chars().take(SHORT_ID_LEN).collect();
        Self {
            id,
            short_id,
            message: message.into(),
            timestamp,
        }
    }

    pub fn message_first_line(&self) -> &str {
        self.message.split('\n').next().unwrap_or_default()
    }
}

/// Source of file history: lists revisions touching a path and returns the
/// file's text at a revision.
///
/// A path that does not exist at a revision is not an error; its content is
/// the empty string.
#[async_trait]
pub trait RevisionSource: Send + Sync {
    /// Most recent revisions touching `path`, newest first, at most `limit`.
    async fn list_recent_revisions(
        &self,
        repo: &str,
        path: &str,
        limit: usize,
    ) -> FetchResult<Vec<RevisionMeta>>;

    async fn fetch_content_at(
        &self,
        repo: &str,
        path: &str,
        revision_id: &str,
    ) -> FetchResult<String>;

    /// Metadata of an explicitly named revision. An id the repository does
    /// not know is `FetchError::RevisionNotFound`.
    async fn resolve_revision(&self, repo: &str, revision_id: &str) -> FetchResult<RevisionMeta>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: RevisionSource + ?Sized> RevisionSource for Arc<T> {
    async fn list_recent_revisions(
        &self,
        repo: &str,
        path: &str,
        limit: usize,
    ) -> FetchResult<Vec<RevisionMeta>> {
        (**self).list_recent_revisions(repo, path, limit).await
    }

    async fn fetch_content_at(
        &self,
        repo: &str,
        path: &str,
        revision_id: &str,
    ) -> FetchResult<String> {
        (**self).fetch_content_at(repo, path, revision_id).await
    }

    async fn resolve_revision(&self, repo: &str, revision_id: &str) -> FetchResult<RevisionMeta> {
        (**self).resolve_revision(repo, revision_id).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_and_first_line() {
        let meta = RevisionMeta::new(
            "0123456789abcdef",
            "Fix typo in intro\n\nLonger body text",
            None,
        );
        assert_eq!(meta.short_id, "0123456");
        assert_eq!(meta.message_first_line(), "Fix typo in intro");
    }

    #[test]
    fn test_short_id_of_short_input() {
        let meta = RevisionMeta::new("abc", "", None);
        assert_eq!(meta.short_id, "abc");
        assert_eq!(meta.message_first_line(), "");
    }
}
