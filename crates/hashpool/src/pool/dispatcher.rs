use super::types::WorkItem;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Feeds tagged work items into the shared bounded work queue.
///
/// Every worker pulls from the same queue, so an item waits only for the next
/// idle worker. Dropping the dispatcher closes the queue, which is how workers
/// learn that no more work is coming.
pub(crate) struct Dispatcher<T> {
    queue: mpsc::Sender<WorkItem<T>>,
}

impl<T> Dispatcher<T> {
    pub(crate) fn new(queue: mpsc::Sender<WorkItem<T>>) -> Self {
        Self { queue }
    }

    /// Enqueues every item in input order, stopping early on cancellation.
    ///
    /// A push onto a full queue suspends, and that suspension races `token`.
    /// Consumes the dispatcher so the queue is closed on return regardless of
    /// how the loop ended.
    pub(crate) async fn run(self, items: Vec<T>, token: CancellationToken) {
        let _total = items.len();
        let mut _dispatched = 0_usize;

        for (position, value) in items.into_iter().enumerate() {
            if token.is_cancelled() {
                break;
            }

            tokio::select! {
                biased;
                () = token.cancelled() => break,
                sent = self.queue.send(WorkItem { position, value }) => {
                    // Workers only drop the queue after observing
                    // cancellation, so there is nothing left to feed.
                    if sent.is_err() {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("Work queue closed, stopping dispatch");
                        break;
                    }
                }
            }

            _dispatched += 1;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(dispatched = _dispatched, total = _total, "Dispatcher finished");
    }
}
