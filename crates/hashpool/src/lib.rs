#![doc = include_str!("../README.md")]

mod config;
mod digest;
mod error;
mod hash_pool;
pub mod pool;

pub use crate::config::*;
pub use crate::digest::*;
pub use crate::error::*;
pub use crate::hash_pool::*;
pub use crate::pool::map_ordered;
// Re-exported so callers share the exact token type the pool listens on.
pub use tokio::time::Instant;
pub use tokio_util::sync::CancellationToken;
