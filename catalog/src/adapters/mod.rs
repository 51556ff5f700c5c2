//! Adapters that live inside the core crate for convenience.
//!
//! The in-memory store backs the demo CLI, the default server mode and unit
//! tests. Durable storage lives in separate adapter crates.

pub mod memory_repo;
