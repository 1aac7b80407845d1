use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::diff::{DiffEngine, DiffLine, DiffOptions};
use crate::error::ServiceError;

use super::channel::{DiffRequest, DiffResult};

/// Runs diff computation on the blocking pool so async handlers never spend
/// executor time on it. Cloning shares the same background loop.
#[derive(Clone)]
pub struct DiffWorker {
    request_tx: mpsc::UnboundedSender<DiffRequest>,
    options: DiffOptions,
}

impl DiffWorker {
    /// Must be called from within a tokio runtime.
    pub fn new(options: DiffOptions) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<DiffRequest>();

        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                tokio::task::spawn_blocking(move || {
                    let DiffRequest {
                        older,
                        newer,
                        options,
                        reply,
                    } = request;
                    let lines = DiffEngine::new(options).compute(&older, &newer);
                    debug!(lines = lines.len(), "diff computed");
                    // The requester may have gone away; nothing to do then.
                    let _ = reply.send(DiffResult { lines });
                });
            }
            debug!("diff worker stopped");
        });

        Self {
            request_tx,
            options,
        }
    }

    pub async fn diff(&self, older: String, newer: String) -> Result<Vec<DiffLine>, ServiceError> {
        let (reply, response) = oneshot::channel();
        let request = DiffRequest {
            older,
            newer,
            options: self.options.clone(),
            reply,
        };

        if self.request_tx.send(request).is_err() {
            error!("diff worker loop has exited");
            return Err(ServiceError::WorkerGone);
        }

        response
            .await
            .map(|result| result.lines)
            .map_err(|_| ServiceError::WorkerGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffAlgorithm, DiffKind};

    #[tokio::test]
    async fn test_worker_computes_diff() {
        let worker = DiffWorker::new(DiffOptions::default());
        let lines = worker
            .diff("a\nb".to_string(), "a\nnew\nb".to_string())
            .await
            .unwrap();
        let kinds: Vec<DiffKind> = lines.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![DiffKind::Context, DiffKind::Added, DiffKind::Context]);
    }

    #[tokio::test]
    async fn test_concurrent_requests_get_their_own_result() {
        let worker = DiffWorker::new(DiffOptions::default());
        let (first, second) = tokio::join!(
            worker.diff(String::new(), "x\ny".to_string()),
            worker.diff("x\ny".to_string(), String::new()),
        );
        assert!(first.unwrap().iter().all(|l| l.kind == DiffKind::Added));
        assert!(second.unwrap().iter().all(|l| l.kind == DiffKind::Removed));
    }

    #[tokio::test]
    async fn test_worker_uses_its_options() {
        // With a window of 3 the lookahead scan never reaches "t"; Myers does.
        let worker = DiffWorker::new(DiffOptions::new(3, DiffAlgorithm::Myers));
        let lines = worker
            .diff("t".to_string(), "n1\nn2\nn3\nn4\nn5\nt".to_string())
            .await
            .unwrap();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[5].kind, DiffKind::Context);
    }
}
