//! Server-side components of the `hashpool` gRPC service.
//!
//! ## Submodules
//!
//! - [`app`] - Router assembly, serving and shutdown sequencing.
//! - [`config`] - CLI / environment configuration and its validation.
//! - [`service`] - The `CalculateHashes` handler, request-ID interceptor and
//!   graceful shutdown.
//! - [`telemetry`] - Logging, optional OpenTelemetry export and service
//!   metrics.
//!
//! `main.rs` only binds the listener and hands the signal future to
//! [`app::serve`].

pub mod app;
pub mod config;
pub mod service;
pub mod telemetry;
