/// Result alias used throughout `hashpool`.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The only way a parallel hashing run can fail.
///
/// Digest computation over text is total, so the engine never produces a
/// partial result: an invocation either returns every digest in input order,
/// or it returns [`Error::Cancelled`] and nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The cancellation token fired (or the deadline elapsed) before all
    /// results were collected.
    #[error("hashing was cancelled before all results were collected")]
    Cancelled,
}

/// Returned when parsing an unknown digest algorithm name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown digest algorithm `{0}` (expected `sha3-256` or `sha256`)")]
pub struct UnknownDigestAlg(pub String);
