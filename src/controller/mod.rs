//! # Controller
//!
//! Core controller modules for the Frigate controller.
//!
//! - `backoff`: Exponential backoff for per-resource retries
//! - `reconciler`: Core reconciliation logic
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
