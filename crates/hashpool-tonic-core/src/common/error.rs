//! Error types for the hashing service.
//!
//! This module defines the central `Error` enum, which captures every failure a
//! `CalculateHashes` call can report. It implements `From<Error>` for
//! `tonic::Status` so handlers can propagate errors to clients with `?` and get
//! an appropriate status code.
//!
//! ## Error Cases
//! - `Hashing`: The parallel hashing run was cancelled (client gave up,
//!   deadline elapsed).
//! - `InvalidRequest`: The client request was malformed or exceeded bounds.
//! - `ServiceShutdown`: A request arrived, or was still running, while the
//!   service was shutting down.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the hashing service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The hashing engine gave up before producing every digest.
    #[error("Hashing failed: {0}")]
    Hashing(#[from] hashpool::Error),

    /// The client request was invalid or exceeded constraints.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::Hashing(e) => Status::cancelled(e.to_string()),
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
