pub mod history;
pub mod repository;

pub use history::LocalHistory;
pub use repository::RepoCache;
