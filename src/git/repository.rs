use anyhow::{Context, Result};
use git2::Repository;
use std::path::{Path, PathBuf};

pub struct RepoCache {
    repo: Repository,
    root: PathBuf,
}

impl RepoCache {
    /// Bare clones are accepted; `root` is then the git directory itself.
    pub fn open(path: &Path) -> Result<Self> {
        let repo =
            Repository::discover(path).context("Not a git repository (or any parent directory)")?;
        let root = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();
        Ok(Self { repo, root })
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `path` given relative to `dir`, rewritten relative to the repository
    /// root. `dir` is where the repository was discovered from and may be a
    /// subdirectory of the work tree.
    pub fn tree_path(&self, dir: &Path, path: &str) -> PathBuf {
        let prefix = match (dir.canonicalize(), self.root.canonicalize()) {
            (Ok(dir), Ok(root)) => dir
                .strip_prefix(&root)
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            _ => PathBuf::new(),
        };
        prefix.join(path)
    }
}
