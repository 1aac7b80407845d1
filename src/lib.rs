//! Line diffs between revisions of tutorial files.
//!
//! The core is [`diff::compute_unified_diff`], a greedy line diff with a
//! bounded lookahead window. Around it sit revision sources (GitHub REST API,
//! local clones), a worker that keeps diffing off the async executor, the
//! [`service::DiffService`] that ties them together, and an HTTP surface.

pub mod async_diff;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod github;
pub mod logging;
pub mod revision;
pub mod server;
pub mod service;

pub use diff::{compute_unified_diff, DiffKind, DiffLine};
pub use error::{FetchError, ServiceError};
