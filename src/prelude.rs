//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use frigate_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::{Frigate, FrigateSpec};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, reconcile_pod, PodStore, ReconcileOutcome, Reconciler, ReconcilerError,
    ResourceIdentity, StoreError,
};

// Config types
pub use crate::config::{ControllerConfig, ConvergencePolicy, ServerConfig};
