use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::async_diff::DiffWorker;
use crate::diff::{DiffLine, DiffStats};
use crate::error::ServiceError;
use crate::revision::{RevisionMeta, RevisionSource};

/// Revisions needed for a diff: the newest and the one before it.
const DIFF_REVISIONS: usize = 2;

pub const NOT_ENOUGH_HISTORY: &str = "Not enough commits to show diff";

/// Outcome of diffing a file's latest change.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffReport {
    /// Fewer than two revisions exist; `latest` is the only one, if any.
    Unavailable {
        reason: String,
        latest: Option<RevisionMeta>,
    },
    Available {
        lines: Vec<DiffLine>,
        older: RevisionMeta,
        newer: RevisionMeta,
        stats: DiffStats,
    },
}

impl DiffReport {
    fn insufficient_history(latest: Option<RevisionMeta>) -> Self {
        DiffReport::Unavailable {
            reason: NOT_ENOUGH_HISTORY.to_string(),
            latest,
        }
    }

    pub fn to_response(&self) -> DiffResponse {
        match self {
            DiffReport::Unavailable { reason, latest } => DiffResponse::Unavailable {
                has_diff: false,
                message: reason.clone(),
                latest_commit: latest.as_ref().map(CommitSummary::full),
            },
            DiffReport::Available {
                lines,
                older,
                newer,
                stats,
            } => DiffResponse::Available {
                has_diff: true,
                diff: lines.clone(),
                old_commit: CommitSummary::short(older),
                new_commit: CommitSummary::short(newer),
                stats: *stats,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub sha: String,
    pub message: String,
    pub date: Option<DateTime<Utc>>,
}

impl CommitSummary {
    /// Header form: abbreviated id, first message line.
    fn short(meta: &RevisionMeta) -> Self {
        Self {
            sha: meta.short_id.clone(),
            message: meta.message_first_line().to_string(),
            date: meta.timestamp,
        }
    }

    fn full(meta: &RevisionMeta) -> Self {
        Self {
            sha: meta.id.clone(),
            message: meta.message.clone(),
            date: meta.timestamp,
        }
    }
}

/// JSON body of `GET /diff`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DiffResponse {
    #[serde(rename_all = "camelCase")]
    Available {
        has_diff: bool,
        diff: Vec<DiffLine>,
        old_commit: CommitSummary,
        new_commit: CommitSummary,
        stats: DiffStats,
    },
    #[serde(rename_all = "camelCase")]
    Unavailable {
        has_diff: bool,
        message: String,
        latest_commit: Option<CommitSummary>,
    },
}

/// Resolves revisions through a [`RevisionSource`] and diffs them on the
/// worker.
#[derive(Clone)]
pub struct DiffService {
    source: Arc<dyn RevisionSource>,
    worker: DiffWorker,
}

impl DiffService {
    pub fn new(source: Arc<dyn RevisionSource>, worker: DiffWorker) -> Self {
        Self { source, worker }
    }

    /// Diff between the two most recent revisions touching `path`.
    pub async fn diff_latest(&self, repo: &str, path: &str) -> Result<DiffReport, ServiceError> {
        let revisions = self
            .source
            .list_recent_revisions(repo, path, DIFF_REVISIONS)
            .await?;

        let mut revisions = revisions.into_iter();
        match (revisions.next(), revisions.next()) {
            (Some(newer), Some(older)) => self.diff_revisions(repo, path, older, newer).await,
            (latest, _) => {
                info!(repo, path, source = self.source.name(), "not enough history to diff");
                Ok(DiffReport::insufficient_history(latest))
            }
        }
    }

    /// Diff between two explicitly named revisions. Both ids must resolve
    /// before any content is fetched, since a missing file reads as empty.
    pub async fn diff_between(
        &self,
        repo: &str,
        path: &str,
        older_id: &str,
        newer_id: &str,
    ) -> Result<DiffReport, ServiceError> {
        let (older, newer) = tokio::try_join!(
            self.source.resolve_revision(repo, older_id),
            self.source.resolve_revision(repo, newer_id),
        )?;
        self.diff_revisions(repo, path, older, newer).await
    }

    pub async fn history(
        &self,
        repo: &str,
        path: &str,
        limit: usize,
    ) -> Result<Vec<RevisionMeta>, ServiceError> {
        Ok(self.source.list_recent_revisions(repo, path, limit).await?)
    }

    async fn diff_revisions(
        &self,
        repo: &str,
        path: &str,
        older: RevisionMeta,
        newer: RevisionMeta,
    ) -> Result<DiffReport, ServiceError> {
        debug!(repo, path, older = %older.short_id, newer = %newer.short_id, "fetching revisions");
        let (older_text, newer_text) = tokio::try_join!(
            self.source.fetch_content_at(repo, path, &older.id),
            self.source.fetch_content_at(repo, path, &newer.id),
        )?;

        let lines = self.worker.diff(older_text, newer_text).await?;
        let stats = DiffStats::from_lines(&lines);
        info!(
            repo,
            path,
            older = %older.short_id,
            newer = %newer.short_id,
            additions = stats.additions,
            deletions = stats.deletions,
            "diff ready"
        );

        Ok(DiffReport::Available {
            lines,
            older,
            newer,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffKind, DiffOptions};
    use crate::error::FetchError;
    use crate::git::history::testing::commit_file;
    use crate::git::LocalHistory;
    use crate::revision::testing::MemorySource;
    use pretty_assertions::assert_eq;

    fn service(source: impl RevisionSource + 'static) -> DiffService {
        DiffService::new(Arc::new(source), DiffWorker::new(DiffOptions::default()))
    }

    #[tokio::test]
    async fn test_diffs_two_latest_revisions() {
        let source = MemorySource::with_history(&[
            ("2222222222", "Rename step\n\nbody", "a\nx\nc"),
            ("1111111111", "Initial", "a\nb\nc"),
        ]);
        let report = service(source).diff_latest("docs", "intro.md").await.unwrap();

        let DiffReport::Available {
            lines,
            older,
            newer,
            stats,
        } = report
        else {
            panic!("expected a diff");
        };
        assert_eq!(older.id, "1111111111");
        assert_eq!(newer.id, "2222222222");
        assert_eq!(stats, DiffStats { additions: 1, deletions: 1 });
        let kinds: Vec<DiffKind> = lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiffKind::Context,
                DiffKind::Removed,
                DiffKind::Added,
                DiffKind::Context
            ]
        );
    }

    #[tokio::test]
    async fn test_single_revision_is_not_enough() {
        let source = MemorySource::with_history(&[("1111111111", "Initial\n\nbody", "a")]);
        let report = service(source).diff_latest("docs", "intro.md").await.unwrap();

        let DiffReport::Unavailable { reason, latest } = report else {
            panic!("expected no diff");
        };
        assert_eq!(reason, NOT_ENOUGH_HISTORY);
        assert_eq!(latest.unwrap().id, "1111111111");
    }

    #[tokio::test]
    async fn test_no_history() {
        let report = service(MemorySource::default())
            .diff_latest("docs", "missing.md")
            .await
            .unwrap();
        assert_eq!(report, DiffReport::insufficient_history(None));
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let source = MemorySource {
            fail_listing: true,
            ..Default::default()
        };
        let err = service(source).diff_latest("docs", "intro.md").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Fetch(FetchError::Status { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_absent_older_file_is_all_insertions() {
        let mut source = MemorySource::with_history(&[
            ("2222222222", "Add file", "one\ntwo"),
            ("1111111111", "Unrelated", ""),
        ]);
        source.contents.remove("1111111111");
        let report = service(source).diff_latest("docs", "new.md").await.unwrap();

        let DiffReport::Available { lines, stats, .. } = report else {
            panic!("expected a diff");
        };
        assert!(lines.iter().all(|l| l.kind == DiffKind::Added));
        assert_eq!(stats.additions, 2);
    }

    #[tokio::test]
    async fn test_diff_between_explicit_ids() {
        let source = MemorySource::with_history(&[
            ("3333333333", "Third", "a\nb\nc"),
            ("2222222222", "Second", "a\nb"),
            ("1111111111", "First", "a"),
        ]);
        let report = service(source)
            .diff_between("docs", "intro.md", "1111111111", "3333333333")
            .await
            .unwrap();

        let DiffReport::Available {
            older, newer, stats, ..
        } = report
        else {
            panic!("expected a diff");
        };
        assert_eq!(older.short_id, "1111111");
        assert_eq!(newer.short_id, "3333333");
        assert_eq!(newer.message_first_line(), "Third");
        assert_eq!(stats.additions, 2);
        assert_eq!(stats.deletions, 0);
    }

    #[tokio::test]
    async fn test_diff_between_unknown_id_is_rejected() {
        let source = MemorySource::with_history(&[
            ("2222222222", "Second", "a\nb"),
            ("1111111111", "First", "a"),
        ]);
        let err = service(source)
            .diff_between("docs", "intro.md", "1111111111", "deadbeef00")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Fetch(FetchError::RevisionNotFound(ref id)) if id == "deadbeef00"
        ));
    }

    #[tokio::test]
    async fn test_response_shapes() {
        let source = MemorySource::with_history(&[
            ("2222222222", "Second\n\nbody", "a\nb"),
            ("1111111111", "First", "a"),
        ]);
        let report = service(source).diff_latest("docs", "intro.md").await.unwrap();
        let json = serde_json::to_value(report.to_response()).unwrap();

        assert_eq!(json["hasDiff"], true);
        assert_eq!(json["oldCommit"]["sha"], "1111111");
        assert_eq!(json["newCommit"]["message"], "Second");
        assert_eq!(json["diff"][1]["type"], "added");
        assert_eq!(json["diff"][1]["newNum"], 2);
        assert_eq!(json["stats"]["additions"], 1);

        let latest = RevisionMeta::new("1111111111", "First\n\nbody", None);
        let json =
            serde_json::to_value(DiffReport::insufficient_history(Some(latest)).to_response())
                .unwrap();
        assert_eq!(json["hasDiff"], false);
        assert_eq!(json["message"], NOT_ENOUGH_HISTORY);
        assert_eq!(json["latestCommit"]["sha"], "1111111111");
        assert_eq!(json["latestCommit"]["message"], "First\n\nbody");

        let json = serde_json::to_value(DiffReport::insufficient_history(None).to_response())
            .unwrap();
        assert!(json["latestCommit"].is_null());
    }

    #[tokio::test]
    async fn test_local_history_end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        commit_file(&repo, "notes.md", Some("a\nb\n"), "First", 1);
        commit_file(&repo, "other.md", Some("x\n"), "Other", 2);
        commit_file(&repo, "notes.md", Some("a\nnew\nb\n"), "Second", 3);

        let report = service(LocalHistory::new(dir.path()))
            .diff_latest("", "notes.md")
            .await
            .unwrap();
        let DiffReport::Available {
            lines,
            older,
            newer,
            ..
        } = report
        else {
            panic!("expected a diff");
        };
        assert_eq!(older.message_first_line(), "First");
        assert_eq!(newer.message_first_line(), "Second");
        let added: Vec<&str> = lines
            .iter()
            .filter(|l| l.kind == DiffKind::Added)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(added, vec!["new"]);
    }
}
