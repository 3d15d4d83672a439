//! # State Store
//!
//! The reconciler reads and writes Pods only through [`PodStore`]. The
//! Kubernetes implementation talks to the API server; tests substitute an
//! in-memory store.
//!
//! Cancellation is by drop: a caller that stops polling a store future (for
//! example on timeout) abandons the in-flight request.

use crate::constants::FIELD_MANAGER;
use crate::controller::reconciler::types::ResourceIdentity;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, PostParams};
use kube::Client;
use thiserror::Error;

/// Failure of a single state store call
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist; an expected outcome of `get`
    #[error("pod {0} not found")]
    NotFound(ResourceIdentity),
    /// The store rejected a write because it conflicts with current state
    #[error("conflicting write to pod {identity}: {message}")]
    Conflict {
        identity: ResourceIdentity,
        message: String,
    },
    /// Any other API failure
    #[error("state store request failed: {0}")]
    Api(#[source] kube::Error),
    /// The store could not be reached or answered with something unusable
    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Classify a kube client error for `identity`
    #[must_use]
    pub fn from_kube(identity: &ResourceIdentity, error: kube::Error) -> Self {
        match &error {
            kube::Error::Api(status) if status.code == 404 => {
                StoreError::NotFound(identity.clone())
            }
            kube::Error::Api(status) if status.code == 409 => StoreError::Conflict {
                identity: identity.clone(),
                message: status.message.clone(),
            },
            _ => StoreError::Api(error),
        }
    }
}

/// Abstract get/create/update access to managed Pods
#[async_trait]
pub trait PodStore: Send + Sync {
    /// Read the current Pod; a missing Pod is `StoreError::NotFound`
    async fn get(&self, identity: &ResourceIdentity) -> Result<Pod, StoreError>;

    /// Create the Pod and return it as stored
    async fn create(&self, pod: &Pod) -> Result<Pod, StoreError>;

    /// Replace the Pod and return it as stored
    ///
    /// The Pod should carry the resource version it was read or created
    /// with so the store can reject stale writes.
    async fn update(&self, pod: &Pod) -> Result<Pod, StoreError>;
}

/// [`PodStore`] over the Kubernetes API
#[derive(Clone)]
pub struct KubePodStore {
    client: Client,
}

impl std::fmt::Debug for KubePodStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubePodStore").finish_non_exhaustive()
    }
}

impl KubePodStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PostParams::default()
        }
    }
}

#[async_trait]
impl PodStore for KubePodStore {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Pod, StoreError> {
        self.api(&identity.namespace)
            .get(&identity.name)
            .await
            .map_err(|e| StoreError::from_kube(identity, e))
    }

    async fn create(&self, pod: &Pod) -> Result<Pod, StoreError> {
        let identity = ResourceIdentity::from_resource(pod);
        self.api(&identity.namespace)
            .create(&Self::post_params(), pod)
            .await
            .map_err(|e| StoreError::from_kube(&identity, e))
    }

    async fn update(&self, pod: &Pod) -> Result<Pod, StoreError> {
        let identity = ResourceIdentity::from_resource(pod);
        self.api(&identity.namespace)
            .replace(&identity.name, &Self::post_params(), pod)
            .await
            .map_err(|e| StoreError::from_kube(&identity, e))
    }
}
