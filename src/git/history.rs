use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::DateTime;
use git2::{Commit, ErrorCode, Oid, Sort};
use tracing::debug;

use super::RepoCache;
use crate::error::{FetchError, FetchResult};
use crate::revision::{RevisionMeta, RevisionSource};

/// Revision source over local clones. The `repo` argument names a directory
/// under `root`; an empty name or `.` means `root` itself.
pub struct LocalHistory {
    root: PathBuf,
}

impl LocalHistory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn repo_dir(&self, repo: &str) -> FetchResult<PathBuf> {
        let relative = Path::new(repo);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::RepoNotFound(repo.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn open(dir: &Path) -> FetchResult<RepoCache> {
    RepoCache::open(dir).map_err(|e| FetchError::RepoNotFound(format!("{}: {e:#}", dir.display())))
}

/// Blob id of `path` in the commit's tree, `None` when the path is absent.
fn blob_id(commit: &Commit<'_>, path: &Path) -> FetchResult<Option<Oid>> {
    let tree = commit.tree()?;
    match tree.get_path(path) {
        Ok(entry) => Ok(Some(entry.id())),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn revision_meta(commit: &Commit<'_>) -> RevisionMeta {
    let timestamp = DateTime::from_timestamp(commit.author().when().seconds(), 0);
    RevisionMeta::new(
        commit.id().to_string(),
        commit.message().unwrap_or_default(),
        timestamp,
    )
}

/// Walk from HEAD and keep commits whose version of `path` differs from
/// their first parent's.
fn list_touching(dir: &Path, path: &str, limit: usize) -> FetchResult<Vec<RevisionMeta>> {
    let cache = open(dir)?;
    let repo = cache.repo();
    debug!(root = %cache.root().display(), path, limit, "walking history");

    // Unborn HEAD: a fresh repository has no history at all.
    if repo.head().is_err() {
        return Ok(Vec::new());
    }

    let path = cache.tree_path(dir, path);
    let path = path.as_path();
    let mut walk = repo.revwalk()?;
    walk.push_head()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

    let mut revisions = Vec::new();
    for oid in walk {
        if revisions.len() >= limit {
            break;
        }
        let commit = repo.find_commit(oid?)?;
        let current = blob_id(&commit, path)?;
        let previous = match commit.parent(0) {
            Ok(parent) => blob_id(&parent, path)?,
            Err(_) => None,
        };
        if current != previous {
            revisions.push(revision_meta(&commit));
        }
    }

    Ok(revisions)
}

fn content_at(dir: &Path, path: &str, revision_id: &str) -> FetchResult<String> {
    let cache = open(dir)?;
    let repo = cache.repo();

    let commit = repo.revparse_single(revision_id)?.peel_to_commit()?;
    let tree = commit.tree()?;
    let entry = match tree.get_path(&cache.tree_path(dir, path)) {
        Ok(entry) => entry,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(String::new()),
        Err(e) => return Err(e.into()),
    };

    let object = entry.to_object(repo)?;
    Ok(object
        .as_blob()
        .map(|blob| String::from_utf8_lossy(blob.content()).into_owned())
        .unwrap_or_default())
}

fn is_unknown_revision(e: &git2::Error) -> bool {
    matches!(
        e.code(),
        ErrorCode::NotFound | ErrorCode::Ambiguous | ErrorCode::InvalidSpec | ErrorCode::Peel
    )
}

fn resolve(dir: &Path, revision_id: &str) -> FetchResult<RevisionMeta> {
    let cache = open(dir)?;
    let commit = cache
        .repo()
        .revparse_single(revision_id)
        .and_then(|object| object.peel_to_commit());
    match commit {
        Ok(commit) => Ok(revision_meta(&commit)),
        Err(e) if is_unknown_revision(&e) => {
            Err(FetchError::RevisionNotFound(revision_id.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl RevisionSource for LocalHistory {
    async fn list_recent_revisions(
        &self,
        repo: &str,
        path: &str,
        limit: usize,
    ) -> FetchResult<Vec<RevisionMeta>> {
        let dir = self.repo_dir(repo)?;
        let path = path.to_string();
        tokio::task::spawn_blocking(move || list_touching(&dir, &path, limit)).await?
    }

    async fn fetch_content_at(
        &self,
        repo: &str,
        path: &str,
        revision_id: &str,
    ) -> FetchResult<String> {
        let dir = self.repo_dir(repo)?;
        let path = path.to_string();
        let revision_id = revision_id.to_string();
        tokio::task::spawn_blocking(move || content_at(&dir, &path, &revision_id)).await?
    }

    async fn resolve_revision(&self, repo: &str, revision_id: &str) -> FetchResult<RevisionMeta> {
        let dir = self.repo_dir(repo)?;
        let revision_id = revision_id.to_string();
        tokio::task::spawn_blocking(move || resolve(&dir, &revision_id)).await?
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use git2::{Commit, Oid, Repository, Signature, Time};

    /// Commit `content` at `rel` (or delete it when `None`) on top of HEAD.
    /// Commit times increase with `tick` so history order is deterministic.
    pub fn commit_file(
        repo: &Repository,
        rel: &str,
        content: Option<&str>,
        message: &str,
        tick: i64,
    ) -> Oid {
        let workdir = repo.workdir().unwrap();
        let full = workdir.join(rel);
        let mut index = repo.index().unwrap();
        match content {
            Some(text) => {
                std::fs::create_dir_all(full.parent().unwrap()).unwrap();
                std::fs::write(&full, text).unwrap();
                index.add_path(Path::new(rel)).unwrap();
            }
            None => {
                std::fs::remove_file(&full).unwrap();
                index.remove_path(Path::new(rel)).unwrap();
            }
        }
        index.write().unwrap();

        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::new("Tutor", "tutor@example.com", &Time::new(1_700_000_000 + tick, 0))
            .unwrap();
        let parents: Vec<Commit<'_>> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::commit_file;
    use super::*;
    use git2::Repository;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Vec<Oid>) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let ids = vec![
            commit_file(&repo, "lessons/intro.md", Some("# Intro\nv1\n"), "Add intro", 1),
            commit_file(&repo, "README.md", Some("readme\n"), "Add readme", 2),
            commit_file(&repo, "lessons/intro.md", Some("# Intro\nv2\n"), "Revise intro\n\nbody", 3),
            commit_file(&repo, "lessons/intro.md", None, "Drop intro", 4),
        ];
        (dir, ids)
    }

    #[tokio::test]
    async fn test_lists_only_touching_commits_newest_first() {
        let (dir, ids) = fixture();
        let history = LocalHistory::new(dir.path());

        let revisions = history
            .list_recent_revisions("", "lessons/intro.md", 10)
            .await
            .unwrap();
        let listed: Vec<&str> = revisions.iter().map(|r| r.id.as_str()).collect();
        let expected = [ids[3].to_string(), ids[2].to_string(), ids[0].to_string()];
        assert_eq!(listed, expected.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(revisions[1].message_first_line(), "Revise intro");
        assert_eq!(
            revisions[1].timestamp.map(|t| t.timestamp()),
            Some(1_700_000_003)
        );
    }

    #[tokio::test]
    async fn test_limit_is_respected() {
        let (dir, ids) = fixture();
        let history = LocalHistory::new(dir.path());

        let revisions = history
            .list_recent_revisions(".", "lessons/intro.md", 2)
            .await
            .unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].id, ids[3].to_string());
    }

    #[tokio::test]
    async fn test_content_at_revisions() {
        let (dir, ids) = fixture();
        let history = LocalHistory::new(dir.path());

        let v1 = history
            .fetch_content_at("", "lessons/intro.md", &ids[0].to_string())
            .await
            .unwrap();
        assert_eq!(v1, "# Intro\nv1\n");

        let short = &ids[2].to_string()[..7];
        let v2 = history
            .fetch_content_at("", "lessons/intro.md", short)
            .await
            .unwrap();
        assert_eq!(v2, "# Intro\nv2\n");

        let gone = history
            .fetch_content_at("", "lessons/intro.md", &ids[3].to_string())
            .await
            .unwrap();
        assert_eq!(gone, "");
    }

    #[tokio::test]
    async fn test_paths_resolve_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let first = commit_file(&repo, "docs/intro.md", Some("one\n"), "Add intro", 1);
        commit_file(&repo, "README.md", Some("readme\n"), "Add readme", 2);
        let second = commit_file(&repo, "docs/intro.md", Some("one\ntwo\n"), "Extend intro", 3);
        let history = LocalHistory::new(dir.path().join("docs"));

        let revisions = history
            .list_recent_revisions("", "intro.md", 2)
            .await
            .unwrap();
        let listed: Vec<String> = revisions.iter().map(|r| r.id.clone()).collect();
        assert_eq!(listed, vec![second.to_string(), first.to_string()]);

        let text = history
            .fetch_content_at("", "intro.md", &first.to_string())
            .await
            .unwrap();
        assert_eq!(text, "one\n");
    }

    #[tokio::test]
    async fn test_resolve_revision() {
        let (dir, ids) = fixture();
        let history = LocalHistory::new(dir.path());

        let short = &ids[2].to_string()[..7];
        let meta = history.resolve_revision("", short).await.unwrap();
        assert_eq!(meta.id, ids[2].to_string());
        assert_eq!(meta.message_first_line(), "Revise intro");

        let missing = history.resolve_revision("", "0000000000000000").await;
        assert!(matches!(missing, Err(FetchError::RevisionNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_repository_has_no_history() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        let history = LocalHistory::new(dir.path());

        let revisions = history
            .list_recent_revisions("", "anything.md", 2)
            .await
            .unwrap();
        assert!(revisions.is_empty());
    }

    #[tokio::test]
    async fn test_repo_name_cannot_escape_root() {
        let (dir, _) = fixture();
        let history = LocalHistory::new(dir.path());

        let result = history.list_recent_revisions("../elsewhere", "a.md", 2).await;
        assert!(matches!(result, Err(FetchError::RepoNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_repository() {
        let dir = TempDir::new().unwrap();
        let history = LocalHistory::new(dir.path());

        let result = history.list_recent_revisions("nope", "a.md", 2).await;
        assert!(matches!(result, Err(FetchError::RepoNotFound(_))));
    }
}
