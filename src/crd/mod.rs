//! # Custom Resource Definitions
//!
//! CRD types for the Frigate controller.
//!
//! A `Frigate` names the Pod the controller keeps converged: every Frigate
//! `namespace/name` maps to a Pod with the same `namespace/name`.

mod spec;

pub use spec::{Frigate, FrigateSpec};
