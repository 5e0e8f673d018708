/// A unit of work tagged with its position in the caller's input.
///
/// Produced once per input element by the dispatcher and consumed by exactly
/// one worker.
#[derive(Debug)]
pub(crate) struct WorkItem<T> {
    pub position: usize,
    pub value: T,
}

/// A computed output tagged with the position of the input it came from.
///
/// The collector uses `position`, never arrival order, to place it.
#[derive(Debug)]
pub(crate) struct ResultItem<R> {
    pub position: usize,
    pub output: R,
}
