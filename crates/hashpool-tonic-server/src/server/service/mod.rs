//! gRPC service implementation and request plumbing.
//!
//! This module contains the client-facing `CalculateHashes` handler, the
//! interceptor that attaches request IDs, and the wiring that turns them into a
//! service the tonic router can serve.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`HashService`).
//! - [`request_id`] - `x-request-id` propagation.

pub mod handler;
pub mod request_id;

use handler::HashService;
use hashpool_tonic_core::proto::hasher_service_server::HasherServiceServer;
use request_id::RequestIdInterceptor;
use tonic::{codec::CompressionEncoding, service::interceptor::InterceptedService};

/// Largest request body accepted. Requests are also bounded by string count,
/// but not by string length.
pub const MAX_DECODING_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

pub type HasherServer = InterceptedService<HasherServiceServer<HashService>, RequestIdInterceptor>;

/// Wraps `service` with compression support, a request size limit and the
/// request-ID interceptor.
pub fn build_hash_service(service: HashService) -> HasherServer {
    let server = HasherServiceServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
        .max_decoding_message_size(MAX_DECODING_MESSAGE_SIZE);
    InterceptedService::new(server, RequestIdInterceptor)
}

#[cfg(test)]
mod tests;
