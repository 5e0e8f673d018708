//! Bounded fan-out/fan-in over a per-invocation task pool.
//!
//! [`map_ordered`] applies a function to every element of a vector using a
//! fixed number of concurrent workers and returns the outputs in input order.
//! One invocation wires up three roles:
//!
//! - the **dispatcher** tags each input with its position and pushes it into
//!   one bounded work queue,
//! - the **workers** all pull from that queue, compute one output per item and
//!   push tagged results into a shared bounded result queue,
//! - the **collector** places results by position and decides between
//!   completion and cancellation.
//!
//! Every suspension point races a [`CancellationToken`]. The pool is torn down
//! before `map_ordered` returns: all spawned tasks are joined, and if the
//! returned future is dropped early they are cancelled and aborted instead.

mod collector;
mod dispatcher;
mod types;
mod worker;


use crate::{
    config::PoolConfig,
    error::{Error, Result},
};
use collector::Collector;
use dispatcher::Dispatcher;
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinSet, time::Instant};
use tokio_util::sync::CancellationToken;
use worker::{SharedQueue, worker_loop};

/// Maps `f` over `items` in parallel, preserving input order in the output.
///
/// - Returns `Ok(vec![])` for empty input without spawning anything.
/// - Returns [`Error::Cancelled`] if `cancel` fires, or `deadline` passes,
///   before every output has been collected. No partial output is returned.
/// - Cancelling `cancel` after this function has returned has no effect on the
///   returned value. Internal aborts (a deadline) never cancel `cancel` itself;
///   they use a child token.
///
/// Must be called from within a Tokio runtime. Workers are Tokio tasks, so use
/// a multi-threaded runtime to get actual parallelism.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, fields(len = items.len()))
)]
pub async fn map_ordered<T, R, F>(
    items: Vec<T>,
    f: F,
    config: &PoolConfig,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let len = items.len();
    if len == 0 {
        return Ok(Vec::new());
    }
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let plan = config.plan(len);
    #[cfg(feature = "tracing")]
    tracing::debug!(
        workers = plan.workers,
        work_queue_capacity = plan.work_queue_capacity,
        result_queue_capacity = plan.result_queue_capacity,
        "Starting pool"
    );

    let token = cancel.child_token();
    // Cancels the workers if this future is dropped before it completes.
    let _guard = token.clone().drop_guard();

    let collector = Collector::new(len);
    let f = Arc::new(f);
    let (work_tx, work_rx) = mpsc::channel(plan.work_queue_capacity);
    let work_rx = SharedQueue::new(work_rx);
    let (result_tx, result_rx) = mpsc::channel(plan.result_queue_capacity);

    let mut tasks = JoinSet::new();
    for worker_id in 0..plan.workers {
        tasks.spawn(worker_loop(
            worker_id,
            Arc::clone(&work_rx),
            result_tx.clone(),
            Arc::clone(&f),
            token.clone(),
        ));
    }
    // From here on only workers hold result senders, so the result queue
    // closes exactly when the last worker has exited.
    drop(result_tx);
    drop(work_rx);

    tasks.spawn(Dispatcher::new(work_tx).run(items, token.clone()));

    let outcome = collector.drain(result_rx, &token, deadline).await;

    // Either every result is in, or the run is being abandoned. In both cases
    // stop whatever is still running and wait for it before returning.
    token.cancel();
    while let Some(joined) = tasks.join_next().await {
        if let Err(_e) = joined {
            #[cfg(feature = "tracing")]
            tracing::error!("Pool task failed: {_e}");
        }
    }

    #[cfg(feature = "tracing")]
    {
        if outcome.is_err() {
            tracing::debug!("Pool run cancelled");
        }
    }

    outcome
}
