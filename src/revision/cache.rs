use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{RevisionMeta, RevisionSource};
use crate::error::FetchResult;

type ListingKey = (String, String, usize);

/// Keeps revision listings for `ttl` so repeated diff views of the same file
/// do not hit the collaborator every time. Content lookups pass through.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    listings: Mutex<HashMap<ListingKey, (Instant, Vec<RevisionMeta>)>>,
}

impl<S: RevisionSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            listings: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn cached(&self, key: &ListingKey) -> Option<Vec<RevisionMeta>> {
        let mut listings = self.listings.lock();
        let fresh = listings
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, revisions)| revisions.clone());
        if fresh.is_none() {
            listings.remove(key);
        }
        fresh
    }

    fn store(&self, key: ListingKey, revisions: &[RevisionMeta]) {
        let mut listings = self.listings.lock();
        let ttl = self.ttl;
        listings.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        listings.insert(key, (Instant::now(), revisions.to_vec()));
    }
}

#[async_trait]
impl<S: RevisionSource> RevisionSource for CachedSource<S> {
    async fn list_recent_revisions(
        &self,
        repo: &str,
        path: &str,
        limit: usize,
    ) -> FetchResult<Vec<RevisionMeta>> {
        if self.ttl.is_zero() {
            return self.inner.list_recent_revisions(repo, path, limit).await;
        }

        let key = (repo.to_string(), path.to_string(), limit);
        if let Some(revisions) = self.cached(&key) {
            debug!(repo, path, limit, "revision listing served from cache");
            return Ok(revisions);
        }

        let revisions = self.inner.list_recent_revisions(repo, path, limit).await?;
        self.store(key, &revisions);
        Ok(revisions)
    }

    async fn fetch_content_at(
        &self,
        repo: &str,
        path: &str,
        revision_id: &str,
    ) -> FetchResult<String> {
        self.inner.fetch_content_at(repo, path, revision_id).await
    }

    async fn resolve_revision(&self, repo: &str, revision_id: &str) -> FetchResult<RevisionMeta> {
        self.inner.resolve_revision(repo, revision_id).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
