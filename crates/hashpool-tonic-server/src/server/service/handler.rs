//! gRPC service implementation for batch hashing.
//!
//! This module defines [`HashService`], the concrete implementation of the
//! [`HasherService`] gRPC service defined in `proto/hasher.proto`. Each
//! `CalculateHashes` call fans its strings out over a fresh [`HashPool`] run
//! and returns the digests in input order.
//!
//! ## Responsibilities
//!
//! - Validate incoming requests and enforce limits.
//! - Tie each request's cancellation to both the caller (future dropped on
//!   disconnect or gRPC deadline) and the service shutdown token.
//! - Track in-flight requests so shutdown can drain them.
//! - Emit logs and metrics per request.

use crate::server::{
    config::ServerConfig,
    service::request_id::request_id_of,
    telemetry::ServiceMetrics,
};
use core::time::Duration;
use hashpool::{CancellationToken, HashPool, Instant};
use hashpool_tonic_core::{
    Error,
    proto::{HashRequest, HashResponse, hasher_service_server::HasherService},
    types::REQUEST_ID_HEADER,
};
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tonic::{Request, Response, Status, metadata::MetadataValue};

/// Shutdown coordination shared by every clone of a [`HashService`].
#[derive(Debug, Default)]
struct ServiceState {
    /// Parent of every per-request token. Cancelled once draining gives up.
    shutdown_token: CancellationToken,
    shutting_down: AtomicBool,
    inflight: AtomicUsize,
}

/// Decrements the in-flight count when a request finishes, however it ends.
struct InflightGuard<'a> {
    state: &'a ServiceState,
    metrics: &'a ServiceMetrics,
}

impl<'a> InflightGuard<'a> {
    fn enter(state: &'a ServiceState, metrics: &'a ServiceMetrics) -> Self {
        state.inflight.fetch_add(1, Ordering::SeqCst);
        metrics.request_started();
        Self { state, metrics }
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.state.inflight.fetch_sub(1, Ordering::SeqCst);
        self.metrics.request_finished();
    }
}

/// gRPC service that hashes batches of strings in parallel.
///
/// Implements the [`HasherService`] service defined in the protobuf schema.
/// Clones share shutdown state, so the clone handed to the shutdown signal
/// handler controls the one registered with the server.
#[derive(Clone)]
pub struct HashService {
    config: ServerConfig,
    pool: HashPool,
    state: Arc<ServiceState>,
    metrics: ServiceMetrics,
}

impl HashService {
    pub fn new(config: ServerConfig, metrics: ServiceMetrics) -> Self {
        let pool = HashPool::new(config.pool.clone(), config.digest);
        Self {
            config,
            pool,
            state: Arc::new(ServiceState::default()),
            metrics,
        }
    }

    /// Number of requests currently being hashed.
    pub fn inflight(&self) -> usize {
        self.state.inflight.load(Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state.shutting_down.load(Ordering::SeqCst)
    }

    /// Gracefully shuts the service down.
    ///
    /// New requests are refused immediately. In-flight requests get up to
    /// `shutdown_timeout` to finish, after which the shutdown token is
    /// cancelled and whatever is still running fails with `UNAVAILABLE`.
    pub async fn shutdown(&self) {
        // === Phase 0: Stop accepting new requests ===
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new requests");
        self.state.shutting_down.store(true, Ordering::SeqCst);

        // === Phase 1: Wait for in-flight requests to drain ===
        #[cfg(feature = "tracing")]
        tracing::info!("Draining in-flight requests ({} active)", self.inflight());
        let drain_result = timeout(self.config.shutdown_timeout, async {
            while self.inflight() > 0 {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        match drain_result {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("All in-flight requests drained successfully");
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Graceful drain timed out ({} requests still active)",
                    self.inflight()
                );
            }
        }

        // === Phase 2: Cancel any remaining work ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling remaining work via shutdown token");
        self.state.shutdown_token.cancel();

        #[cfg(feature = "tracing")]
        tracing::info!("Hashing service shutdown complete");
    }

    /// Validates and hashes one batch.
    async fn hash(&self, strings: Vec<String>) -> Result<Vec<String>, Error> {
        // Counted before the shutdown check so `shutdown` either sees this
        // request in flight or this request sees the flag.
        let _inflight = InflightGuard::enter(&self.state, &self.metrics);

        if self.is_shutting_down() {
            return Err(Error::ServiceShutdown);
        }

        if strings.len() > self.config.max_allowed_strings {
            return Err(Error::InvalidRequest {
                reason: format!(
                    "Request holds {} strings, exceeding the maximum allowed ({})",
                    strings.len(),
                    self.config.max_allowed_strings
                ),
            });
        }

        // Cancelled when the service gives up on draining, or when this
        // future is dropped (client went away, gRPC deadline hit).
        let token = self.state.shutdown_token.child_token();
        let _cancel_on_drop = token.clone().drop_guard();

        let result = match self.config.request_timeout {
            Some(limit) => {
                self.pool
                    .hash_with_deadline(strings, &token, Instant::now() + limit)
                    .await
            }
            None => self.pool.hash(strings, &token).await,
        };

        result.map_err(|err| {
            if self.state.shutdown_token.is_cancelled() {
                Error::ServiceShutdown
            } else {
                Error::Hashing(err)
            }
        })
    }
}

#[tonic::async_trait]
impl HasherService for HashService {
    /// Hashes every string in the request and returns the digests in input
    /// order.
    ///
    /// If `tracing` is enabled, each request gets a span carrying its string
    /// count and request ID.
    ///
    /// Metrics recorded per request:
    /// - request rate and strings per request
    /// - concurrent requests
    /// - request duration and strings hashed
    /// - errors by status code
    #[cfg_attr(feature = "tracing", tracing::instrument(
        skip_all,
        fields(count = req.get_ref().strings.len(), request_id = tracing::field::Empty),
    ))]
    async fn calculate_hashes(
        &self,
        req: Request<HashRequest>,
    ) -> Result<Response<HashResponse>, Status> {
        let start = std::time::Instant::now();
        let request_id = request_id_of(&req);
        let count = req.get_ref().strings.len();

        #[cfg(feature = "tracing")]
        {
            tracing::Span::current().record("request_id", request_id.as_str());
            tracing::info!("Hashing request started");
        }

        self.metrics.record_request(count);

        let echo = MetadataValue::try_from(request_id.as_str()).ok();
        match self.hash(req.into_inner().strings).await {
            Ok(hashes) => {
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                self.metrics.record_success(count, elapsed_ms);

                #[cfg(feature = "tracing")]
                tracing::info!(elapsed_ms, "Hashing request done");

                let mut response = Response::new(HashResponse { hashes });
                if let Some(echo) = echo {
                    response.metadata_mut().insert(REQUEST_ID_HEADER, echo);
                }
                Ok(response)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "Hashing request failed");

                let mut status = Status::from(err);
                self.metrics.record_error(status.code());
                if let Some(echo) = echo {
                    status.metadata_mut().insert(REQUEST_ID_HEADER, echo);
                }
                Err(status)
            }
        }
    }
}
