//! Assembles the gRPC router and runs it until a shutdown trigger fires.
//!
//! The router carries three services on one plain HTTP/2 listener: gRPC
//! health checks, reflection, and `hasher.HasherService`. Once the trigger
//! resolves the health status flips to `NOT_SERVING`, the hashing service
//! drains its in-flight requests, and only then does the listener close.

use crate::server::service::{build_hash_service, handler::HashService};
use hashpool_tonic_core::proto::{FILE_DESCRIPTOR_SET, hasher_service_server::HasherServiceServer};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic_reflection::server::Builder;

/// Serves `service` on `listener` until `trigger` completes, then shuts it
/// down gracefully.
///
/// Returns once every connection has closed. The hashing service has already
/// refused new work and cancelled anything that outlived its drain timeout by
/// then.
pub async fn serve<S>(
    listener: TcpListener,
    service: HashService,
    trigger: S,
) -> anyhow::Result<()>
where
    S: Future<Output = ()>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<HasherServiceServer<HashService>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let draining = service.clone();
    let shutdown = async move {
        trigger.await;

        #[cfg(feature = "tracing")]
        tracing::info!("Shutdown requested, draining hash service");

        health_reporter
            .set_not_serving::<HasherServiceServer<HashService>>()
            .await;
        draining.shutdown().await;
    };

    Server::builder()
        .http2_adaptive_window(Some(true))
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_hash_service(service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    Ok(())
}
