use similar::{capture_diff_slices, Algorithm, DiffOp};

use super::types::{DiffAlgorithm, DiffLine, DiffOptions};

/// Split revision text into diff lines.
///
/// An empty string is a file with no lines (absent at that revision). Any
/// other text is split strictly on `\n`, so a trailing newline leaves one
/// trailing empty line that is diffed like the rest.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

/// Diff two revisions with the default options.
pub fn compute_unified_diff(older: &str, newer: &str) -> Vec<DiffLine> {
    DiffEngine::default().compute(older, newer)
}

/// Where the cursors can line up again after a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resync {
    /// The next `k` lines of the newer side were inserted.
    Insertion(usize),
    /// The next `k` lines of the older side were removed.
    Deletion(usize),
}

#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    pub fn compute(&self, older: &str, newer: &str) -> Vec<DiffLine> {
        let old_lines = split_lines(older);
        let new_lines = split_lines(newer);

        match self.options.algorithm {
            DiffAlgorithm::Lookahead => {
                Self::lookahead_diff(&old_lines, &new_lines, self.options.lookahead)
            }
            DiffAlgorithm::Myers => Self::myers_diff(&old_lines, &new_lines),
        }
    }

    /// Greedy two-cursor diff. Not minimal: a mismatch is resolved by the
    /// nearest resynchronization point inside the window, falling back to a
    /// removed+added pair.
    fn lookahead_diff(old_lines: &[&str], new_lines: &[&str], lookahead: usize) -> Vec<DiffLine> {
        let mut result = Vec::with_capacity(old_lines.len().max(new_lines.len()));
        let window = lookahead.min(old_lines.len().max(new_lines.len()));

        let mut old_index = 0;
        let mut new_index = 0;

        while old_index < old_lines.len() || new_index < new_lines.len() {
            if old_index < old_lines.len()
                && new_index < new_lines.len()
                && old_lines[old_index] == new_lines[new_index]
            {
                result.push(DiffLine::context(old_lines[old_index], old_index, new_index));
                old_index += 1;
                new_index += 1;
                continue;
            }

            match find_resync(old_lines, new_lines, old_index, new_index, window) {
                Some(Resync::Insertion(k)) => {
                    for i in new_index..new_index + k {
                        result.push(DiffLine::added(new_lines[i], i));
                    }
                    new_index += k;
                }
                Some(Resync::Deletion(k)) => {
                    for i in old_index..old_index + k {
                        result.push(DiffLine::removed(old_lines[i], i));
                    }
                    old_index += k;
                }
                None => {
                    if old_index < old_lines.len() {
                        result.push(DiffLine::removed(old_lines[old_index], old_index));
                        old_index += 1;
                    }
                    if new_index < new_lines.len() {
                        result.push(DiffLine::added(new_lines[new_index], new_index));
                        new_index += 1;
                    }
                }
            }
        }

        result
    }

    fn myers_diff(old_lines: &[&str], new_lines: &[&str]) -> Vec<DiffLine> {
        let mut result = Vec::with_capacity(old_lines.len().max(new_lines.len()));

        for op in capture_diff_slices(Algorithm::Myers, old_lines, new_lines) {
            match op {
                DiffOp::Equal {
                    old_index,
                    new_index,
                    len,
                } => {
                    for i in 0..len {
                        result.push(DiffLine::context(
                            old_lines[old_index + i],
                            old_index + i,
                            new_index + i,
                        ));
                    }
                }
                DiffOp::Delete {
                    old_index, old_len, ..
                } => {
                    for i in old_index..old_index + old_len {
                        result.push(DiffLine::removed(old_lines[i], i));
                    }
                }
                DiffOp::Insert {
                    new_index, new_len, ..
                } => {
                    for i in new_index..new_index + new_len {
                        result.push(DiffLine::added(new_lines[i], i));
                    }
                }
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    for i in old_index..old_index + old_len {
                        result.push(DiffLine::removed(old_lines[i], i));
                    }
                    for i in new_index..new_index + new_len {
                        result.push(DiffLine::added(new_lines[i], i));
                    }
                }
            }
        }

        result
    }
}

/// Scan `k = 1..=window` for the nearest point where the cursors line up
/// again. The smallest `k` wins; at equal `k` an insertion beats a deletion.
fn find_resync(
    old_lines: &[&str],
    new_lines: &[&str],
    old_index: usize,
    new_index: usize,
    window: usize,
) -> Option<Resync> {
    for k in 1..=window {
        if new_index + k < new_lines.len()
            && old_index < old_lines.len()
            && new_lines[new_index + k] == old_lines[old_index]
        {
            return Some(Resync::Insertion(k));
        }
        if old_index + k < old_lines.len()
            && new_index < new_lines.len()
            && old_lines[old_index + k] == new_lines[new_index]
        {
            return Some(Resync::Deletion(k));
        }
    }
    None
}
