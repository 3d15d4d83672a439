//! # Runtime
//!
//! Process-level wiring around the reconciler.
//!
//! - `initialization`: TLS provider, logging, metrics, probe server, Kubernetes client
//! - `watch_loop`: kube-runtime controller that schedules reconciliations
//! - `error_policy`: per-resource retry backoff and watch error handling

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
