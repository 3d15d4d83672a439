//! # Reconciler
//!
//! Core reconciliation logic for the Pod managed on behalf of each `Frigate`.
//!
//! ## Reconciliation Flow
//!
//! 1. Fetch the Pod with the Frigate's `namespace/name` from the state store
//! 2. NotFound: create it from the desired state (container `bob`, image `nginx`)
//! 3. Right after creating, update the container image to `redis`
//! 4. Already present: converged (or, with [`ConvergencePolicy::EnforceImage`],
//!    updated once if its image differs)
//!
//! Every store failure is wrapped with a stage tag (`G:` pre-get, `U:` create,
//! `C:` update) and surfaced; retries are the error policy's job.
//!
//! [`ConvergencePolicy::EnforceImage`]: crate::config::ConvergencePolicy::EnforceImage

pub mod desired;
pub mod reconcile;
pub mod store;
pub mod types;

// Re-export public API
pub use desired::{container_image, desired_pod, set_container_image};
pub use reconcile::{reconcile, reconcile_pod, reconcile_with_timeout};
pub use store::{KubePodStore, PodStore, StoreError};
pub use types::{BackoffState, ReconcileOutcome, Reconciler, ReconcilerError, ResourceIdentity};
