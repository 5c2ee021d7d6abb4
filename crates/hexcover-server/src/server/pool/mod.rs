//! Worker pool abstraction for concurrent geometry conversion.
//!
//! This module manages a set of asynchronous worker tasks that convert
//! geometries into cell sets in parallel. It provides:
//!
//! - Round-robin load balancing across workers
//! - Bounded, backpressure-aware worker queues
//! - Graceful shutdown coordination via cancellation tokens and one-shot
//!   acknowledgements
//!
//! ## Submodules
//!
//! - [`manager`] - Orchestrates the pool, routing, and shutdown logic.
//! - [`request`] - The message protocol between pool and workers.
//! - [`worker`] - The worker task loop.

pub mod manager;
pub mod request;
pub mod worker;
