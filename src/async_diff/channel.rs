use tokio::sync::oneshot;

use crate::diff::{DiffLine, DiffOptions};

#[derive(Debug)]
pub struct DiffRequest {
    pub older: String,
    pub newer: String,
    pub options: DiffOptions,
    pub reply: oneshot::Sender<DiffResult>,
}

#[derive(Debug)]
pub struct DiffResult {
    pub lines: Vec<DiffLine>,
}
