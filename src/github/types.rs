//! Wire formats of the GitHub REST API (only the fields this crate reads)
//! and the simplified shapes served by `/contents`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::revision::RevisionMeta;

#[derive(Debug, Deserialize)]
pub struct CommitEntry {
    pub sha: String,
    #[serde(default)]
    pub commit: Option<CommitDetail>,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl From<CommitEntry> for RevisionMeta {
    fn from(entry: CommitEntry) -> Self {
        let (message, timestamp) = match entry.commit {
            Some(detail) => (
                detail.message.unwrap_or_default(),
                detail.author.and_then(|a| a.date),
            ),
            None => (String::new(), None),
        };
        RevisionMeta::new(entry.sha, message, timestamp)
    }
}

/// `GET /repos/{owner}/{repo}/contents/{path}` answers with an array for a
/// directory and an object for a file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ContentsResponse {
    Dir(Vec<RawEntry>),
    File(RawFile),
}

#[derive(Debug, Deserialize)]
pub struct RawEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RawFile {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
    /// Base64 with embedded newlines. Missing or empty for large files.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub size: u64,
}

impl ContentEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == "dir"
    }
}

impl From<RawEntry> for ContentEntry {
    fn from(raw: RawEntry) -> Self {
        Self {
            name: raw.name,
            kind: raw.kind,
            path: raw.path,
            size: raw.size.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Contents {
    Dir {
        items: Vec<ContentEntry>,
    },
    File {
        name: String,
        path: String,
        size: u64,
        /// `None` when the API did not inline the file; see `download_url`.
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        download_url: Option<String>,
    },
}
