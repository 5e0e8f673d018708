//! # Shared Constants and Types
//!
//! Definitions that client and server must agree on outside of the protobuf
//! schema itself.
//!
//! ## Constants
//!
//! - [`REQUEST_ID_HEADER`] - gRPC metadata key carrying the request ID
//! - [`DIGEST_HEX_LEN`] - Length of every digest in a `HashResponse`
//!
//! ## Types
//!
//! - [`RequestId`] - A validated request ID, stored in request extensions by
//!   the server's interceptor

use core::fmt;

pub use hashpool::DIGEST_HEX_LEN;

/// Metadata key used to correlate a call across client and server logs.
///
/// The server echoes it back in the response metadata.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest request ID accepted from a client before a fresh one is generated.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation ID attached to a single call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generates a fresh random (UUID v4) request ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Accepts a client-supplied ID if it is non-empty, at most
    /// [`MAX_REQUEST_ID_LEN`] bytes and made of visible ASCII only.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = !raw.is_empty()
            && raw.len() <= MAX_REQUEST_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_graphic());
        valid.then(|| Self(raw.to_string()))
    }

    /// Uses `raw` when it is a valid ID, otherwise generates one.
    pub fn parse_or_generate(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
