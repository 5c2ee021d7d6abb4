//! HTTP surface of the indexing service.
//!
//! ## Structure
//!
//! - [`handler`] - Routes and request handlers (`POST /create-index`,
//!   `GET /health`).
//! - [`middleware`] - Per-request access logging.

pub mod handler;
pub mod middleware;
