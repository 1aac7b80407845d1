use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Context,
    Added,
    Removed,
}

impl DiffKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DiffKind::Context => " ",
            DiffKind::Added => "+",
            DiffKind::Removed => "-",
        }
    }
}

/// One row of a unified diff.
///
/// Serialized in the portal viewer's format: `type`, `content`, `oldNum`,
/// `newNum`, with absent line numbers omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    #[serde(rename = "content")]
    pub text: String,
    #[serde(rename = "oldNum", default, skip_serializing_if = "Option::is_none")]
    pub old_lineno: Option<u32>,
    #[serde(rename = "newNum", default, skip_serializing_if = "Option::is_none")]
    pub new_lineno: Option<u32>,
}

impl DiffLine {
    pub fn context(text: &str, old_index: usize, new_index: usize) -> Self {
        Self {
            kind: DiffKind::Context,
            text: text.to_string(),
            old_lineno: Some(lineno(old_index)),
            new_lineno: Some(lineno(new_index)),
        }
    }

    pub fn added(text: &str, new_index: usize) -> Self {
        Self {
            kind: DiffKind::Added,
            text: text.to_string(),
            old_lineno: None,
            new_lineno: Some(lineno(new_index)),
        }
    }

    pub fn removed(text: &str, old_index: usize) -> Self {
        Self {
            kind: DiffKind::Removed,
            text: text.to_string(),
            old_lineno: Some(lineno(old_index)),
            new_lineno: None,
        }
    }
}

/// 0-based cursor to 1-based display number.
fn lineno(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
}

impl DiffStats {
    pub fn from_lines(lines: &[DiffLine]) -> Self {
        lines.iter().fold(Self::default(), |mut stats, line| {
            match line.kind {
                DiffKind::Added => stats.additions += 1,
                DiffKind::Removed => stats.deletions += 1,
                DiffKind::Context => {}
            }
            stats
        })
    }

    pub fn is_unchanged(&self) -> bool {
        self.additions == 0 && self.deletions == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    /// Greedy scan with a bounded lookahead window.
    #[default]
    Lookahead,
    /// Exact line diff (Myers), via `similar`.
    Myers,
}

impl DiffAlgorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lookahead" | "greedy" => Some(DiffAlgorithm::Lookahead),
            "myers" => Some(DiffAlgorithm::Myers),
            _ => None,
        }
    }
}

pub const DEFAULT_LOOKAHEAD: usize = 10;

#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub lookahead: usize,
    pub algorithm: DiffAlgorithm,
}

impl DiffOptions {
    pub fn new(lookahead: usize, algorithm: DiffAlgorithm) -> Self {
        Self {
            lookahead: lookahead.max(1),
            algorithm,
        }
    }
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD, DiffAlgorithm::default())
    }
}
