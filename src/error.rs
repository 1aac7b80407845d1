use thiserror::Error;

/// Failure of a revision collaborator (GitHub API or local repository).
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed. {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { status: u16, url: String },
    #[error("Unable to decode response. {0}")]
    Decode(String),
    #[error("Error from git. {0}")]
    Git(#[from] git2::Error),
    #[error("Background task failed. {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Repository not found: {0}")]
    RepoNotFound(String),
    #[error("Unknown revision {0}")]
    RevisionNotFound(String),
    #[error("Invalid API url. {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// The collaborator answered, but not with success.
    pub fn is_upstream_status(&self) -> bool {
        match self {
            FetchError::Status { .. } => true,
            FetchError::Http(e) => e.status().is_some(),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Diff worker is no longer running")]
    WorkerGone,
}

pub type FetchResult<T> = Result<T, FetchError>;
