use super::types::ResultItem;
use crate::error::{Error, Result};
use core::future;
use tokio::{
    sync::mpsc,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;

/// Places results into an output sequence indexed by input position.
///
/// The output slots are allocated up front, before any work is dispatched.
/// Each slot is written at most once, and only by the collector.
pub(crate) struct Collector<R> {
    slots: Vec<Option<R>>,
    received: usize,
}

impl<R> Collector<R> {
    pub(crate) fn new(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || None);
        Self { slots, received: 0 }
    }

    /// Drains `rx` until every slot is filled.
    ///
    /// Fails with [`Error::Cancelled`] if `token` fires, if `deadline` passes
    /// (in which case `token` is cancelled so the workers stop too), or if the
    /// result queue closes early. The queue only closes once every worker has
    /// dropped its sender, so a closed queue means no result can ever arrive.
    /// No partial output escapes on failure.
    pub(crate) async fn drain(
        mut self,
        mut rx: mpsc::Receiver<ResultItem<R>>,
        token: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<Vec<R>> {
        let expired = async {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending().await,
            }
        };
        tokio::pin!(expired);

        while self.received < self.slots.len() {
            tokio::select! {
                biased;
                () = token.cancelled() => return Err(Error::Cancelled),
                () = &mut expired => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        received = self.received,
                        expected = self.slots.len(),
                        "Deadline elapsed while collecting"
                    );
                    token.cancel();
                    return Err(Error::Cancelled);
                }
                msg = rx.recv() => match msg {
                    Some(ResultItem { position, output }) => self.store(position, output),
                    None => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            received = self.received,
                            expected = self.slots.len(),
                            "Result queue closed early"
                        );
                        return Err(Error::Cancelled);
                    }
                },
            }
        }

        self.slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(Error::Cancelled)
    }

    fn store(&mut self, position: usize, output: R) {
        let slot = &mut self.slots[position];
        debug_assert!(slot.is_none(), "position {position} written twice");
        *slot = Some(output);
        self.received += 1;
    }
}
