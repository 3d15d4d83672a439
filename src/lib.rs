//! Frigate Controller Library
//!
//! A level-triggered Kubernetes controller: for every `Frigate` resource it
//! keeps a Pod with the same `namespace/name` in existence, created with a
//! `bob` container running `nginx` and immediately converged to `redis`.
//!
//! ## Quick Start
//!
//! ```rust
//! use frigate_controller::prelude::*;
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
