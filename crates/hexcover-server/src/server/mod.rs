pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod pool;
pub mod service;
pub mod telemetry;
