#![doc = include_str!("../README.md")]

pub mod client;
mod common;
pub use common::*;
// Public re-export so downstream crates can reach the engine via
// `hashpool_tonic_core::hashpool`
pub use hashpool;
