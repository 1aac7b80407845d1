use std::sync::Arc;

use crate::async_diff::DiffWorker;
use crate::config::PortalConfig;
use crate::error::FetchResult;
use crate::github::GitHubClient;
use crate::revision::CachedSource;
use crate::service::DiffService;

pub struct AppState {
    pub service: DiffService,
    pub github: Arc<GitHubClient>,
}

impl AppState {
    pub fn new(service: DiffService, github: Arc<GitHubClient>) -> Self {
        Self { service, github }
    }

    /// GitHub-backed state: revision listings go through the TTL cache,
    /// directory browsing talks to the API directly.
    pub fn from_config(config: &PortalConfig) -> FetchResult<Arc<Self>> {
        let github = Arc::new(GitHubClient::new(&config.github)?);
        let source = CachedSource::new(Arc::clone(&github), config.cache_ttl);
        let worker = DiffWorker::new(config.diff_options());

        Ok(Arc::new(Self::new(
            DiffService::new(Arc::new(source), worker),
            github,
        )))
    }
}
