use super::types::{ResultItem, WorkItem};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// Receiving end of the work queue, shared by every worker of one invocation.
///
/// Tokio's `mpsc` has a single consumer, so receivers take turns. The lock is
/// held only while waiting for the next item.
pub(crate) struct SharedQueue<T>(Mutex<mpsc::Receiver<WorkItem<T>>>);

impl<T> SharedQueue<T> {
    pub(crate) fn new(rx: mpsc::Receiver<WorkItem<T>>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(rx)))
    }

    /// Next item in dispatch order, or `None` once the queue is drained and
    /// closed.
    pub(crate) async fn next(&self) -> Option<WorkItem<T>> {
        self.0.lock().await.recv().await
    }
}

/// Worker task that applies `f` to items pulled from the shared work queue.
///
/// The loop ends when the queue is drained and closed, when the result queue
/// has no receiver, or as soon as `token` is cancelled. Both suspension points
/// (waiting for work, waiting for room in the result queue) race the token, so
/// a cancelled worker never picks up another item and never blocks forever on
/// a full result queue. An item already being computed when cancellation
/// arrives is allowed to finish; its result is then dropped.
///
/// Nothing is held on the shared queue while `f` runs, so a slow item never
/// keeps the other workers from pulling.
///
/// # Arguments
///
/// - `_worker_id`: Index of this worker (used for tracing).
/// - `queue`: The work queue shared with the other workers.
/// - `results`: Shared result queue drained by the collector.
/// - `f`: The per-item computation. Must be total.
/// - `token`: Per-invocation cancellation token.
pub(crate) async fn worker_loop<T, R, F>(
    _worker_id: usize,
    queue: Arc<SharedQueue<T>>,
    results: mpsc::Sender<ResultItem<R>>,
    f: Arc<F>,
    token: CancellationToken,
) where
    F: Fn(T) -> R,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    let mut _processed = 0_usize;

    loop {
        let WorkItem { position, value } = tokio::select! {
            biased;
            () = token.cancelled() => break,
            work = queue.next() => match work {
                Some(work) => work,
                None => break,
            },
        };

        // The item may have been queued before cancellation; do not start it.
        if token.is_cancelled() {
            break;
        }

        let output = f(value);

        tokio::select! {
            biased;
            () = token.cancelled() => break,
            sent = results.send(ResultItem { position, output }) => {
                if sent.is_err() {
                    break;
                }
            }
        }

        _processed += 1;
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(
        processed = _processed,
        cancelled = token.is_cancelled(),
        "Worker {_worker_id} stopped"
    );
}
