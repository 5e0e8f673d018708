//! Shared types and error definitions used by both the server and clients.
//!
//! ## Submodules
//!
//! - [`error`] - Service error type and its mapping to `tonic::Status`.
//! - [`types`] - Request-ID handling and shared constants.
//! - [`proto`] - Code generated from `proto/hasher.proto`.

pub mod error;
pub mod types;
pub mod proto {
    tonic::include_proto!("hasher");
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("hasher_descriptor");
}

pub use error::{Error, Result};
