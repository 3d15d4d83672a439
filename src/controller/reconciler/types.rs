//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::ExponentialBackoff;
use crate::controller::reconciler::store::{KubePodStore, PodStore, StoreError};
use kube::{Client, Resource, ResourceExt};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Namespace and name of one reconciled object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentity {
    pub namespace: String,
    pub name: String,
}

impl ResourceIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of any kube object; objects without a namespace land in `default`
    pub fn from_resource<K: Resource>(obj: &K) -> Self {
        Self {
            namespace: obj.namespace().unwrap_or_else(|| "default".to_string()),
            name: obj.name_any(),
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// Ask the scheduler to run this identity again without a new event
    pub requeue: bool,
}

impl ReconcileOutcome {
    /// Converged until the next external trigger
    #[must_use]
    pub fn done() -> Self {
        Self { requeue: false }
    }
}

/// A failed reconciliation, tagged with the stage that failed
///
/// The tags let logs and metrics attribute failures to a phase:
/// `G:` pre-get, `U:` create, `C:` update, `T:` timeout.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("G: resource pre-getting failed: {0}")]
    PreGet(#[source] StoreError),
    #[error("U: resource could not be created: {0}")]
    Create(#[source] StoreError),
    #[error("C: resource could not be updated: {0}")]
    Update(#[source] StoreError),
    #[error("T: reconciliation timed out after {0:?}")]
    TimedOut(Duration),
}

impl ReconcilerError {
    /// Stable stage label, used for metrics
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            ReconcilerError::PreGet(_) => "pre-get",
            ReconcilerError::Create(_) => "create",
            ReconcilerError::Update(_) => "update",
            ReconcilerError::TimedOut(_) => "timeout",
        }
    }

    /// Short tag prefixed to the message
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            ReconcilerError::PreGet(_) => "G:",
            ReconcilerError::Create(_) => "U:",
            ReconcilerError::Update(_) => "C:",
            ReconcilerError::TimedOut(_) => "T:",
        }
    }
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: ExponentialBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(start_ms: u64, max_ms: u64) -> Self {
        Self {
            backoff: ExponentialBackoff::new(start_ms, max_ms),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Shared context handed to every reconciliation
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn PodStore>,
    pub config: Arc<ControllerConfig>,
    // Backoff state per resource (identified by namespace/name)
    // Only touched from the error policy and on success; never across an await
    pub backoff_states: Arc<Mutex<HashMap<ResourceIdentity, BackoffState>>>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Reconciler backed by the Kubernetes API
    #[must_use]
    pub fn new(client: Client, config: Arc<ControllerConfig>) -> Self {
        Self::with_store(Arc::new(KubePodStore::new(client)), config)
    }

    /// Reconciler backed by any state store
    #[must_use]
    pub fn with_store(store: Arc<dyn PodStore>, config: Arc<ControllerConfig>) -> Self {
        Self {
            store,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a failure for `identity` and return the delay before the next attempt
    pub fn next_error_backoff(&self, identity: &ResourceIdentity) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states.entry(identity.clone()).or_insert_with(|| {
                    BackoffState::new(self.config.backoff_start_ms, self.config.backoff_max_ms)
                });
                state.increment_error();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (Duration::from_millis(self.config.backoff_max_ms), 0)
            }
        }
    }

    /// Forget accumulated failures for `identity` after a successful reconciliation
    ///
    /// The entry is dropped rather than reset so identities that later
    /// disappear leave nothing behind; the next failure starts a fresh one.
    pub fn reset_backoff(&self, identity: &ResourceIdentity) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                states.remove(identity);
            }
            Err(e) => warn!("Failed to lock backoff_states: {}, backoff not reset", e),
        }
    }

    /// Current error count for `identity`, zero if it never failed
    #[must_use]
    pub fn error_count(&self, identity: &ResourceIdentity) -> u32 {
        self.backoff_states
            .lock()
            .ok()
            .and_then(|states| states.get(identity).map(|s| s.error_count))
            .unwrap_or(0)
    }
}
