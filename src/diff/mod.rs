pub mod engine;
pub mod render;
pub mod types;

pub use engine::{compute_unified_diff, DiffEngine};
pub use types::{DiffAlgorithm, DiffKind, DiffLine, DiffOptions, DiffStats};
