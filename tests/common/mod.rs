//! Common test utilities
//!
//! An in-memory [`PodStore`] that records every call, can be told to fail a
//! given operation, and enforces resource versions on update the way the API
//! server does.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use frigate_controller::config::ControllerConfig;
use frigate_controller::controller::reconciler::{
    desired_pod, set_container_image, PodStore, Reconciler, ResourceIdentity, StoreError,
};
use frigate_controller::crd::{Frigate, FrigateSpec};
use k8s_openapi::api::core::v1::Pod;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Create,
    Update,
}

#[derive(Debug, Default)]
pub struct InMemoryPodStore {
    pods: Mutex<HashMap<ResourceIdentity, Pod>>,
    calls: Mutex<Vec<(Op, ResourceIdentity)>>,
    failing: Mutex<Vec<Op>>,
    get_delay: Mutex<Option<Duration>>,
    next_version: Mutex<u64>,
}

impl InMemoryPodStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed an existing Pod running `image`
    pub fn insert_with_image(&self, identity: &ResourceIdentity, image: &str) {
        let mut pod = desired_pod(identity);
        set_container_image(&mut pod, image);
        pod.metadata.resource_version = Some(self.bump_version());
        self.pods.lock().unwrap().insert(identity.clone(), pod);
    }

    /// Make every call of `op` fail with an unavailable error
    pub fn fail_on(&self, op: Op) {
        self.failing.lock().unwrap().push(op);
    }

    /// Delay every `get` by `delay`
    pub fn delay_gets(&self, delay: Duration) {
        *self.get_delay.lock().unwrap() = Some(delay);
    }

    pub fn pod(&self, identity: &ResourceIdentity) -> Option<Pod> {
        self.pods.lock().unwrap().get(identity).cloned()
    }

    pub fn len(&self) -> usize {
        self.pods.lock().unwrap().len()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.calls.lock().unwrap().iter().map(|(op, _)| *op).collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.ops().into_iter().filter(|o| *o == op).count()
    }

    fn record(&self, op: Op, identity: &ResourceIdentity) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push((op, identity.clone()));
        if self.failing.lock().unwrap().contains(&op) {
            return Err(StoreError::Unavailable(format!("injected {op:?} failure")));
        }
        Ok(())
    }

    fn bump_version(&self) -> String {
        let mut version = self.next_version.lock().unwrap();
        *version += 1;
        version.to_string()
    }
}

#[async_trait]
impl PodStore for InMemoryPodStore {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Pod, StoreError> {
        let delay = *self.get_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Op::Get, identity)?;
        self.pod(identity)
            .ok_or_else(|| StoreError::NotFound(identity.clone()))
    }

    async fn create(&self, pod: &Pod) -> Result<Pod, StoreError> {
        let identity = ResourceIdentity::from_resource(pod);
        self.record(Op::Create, &identity)?;

        let mut pods = self.pods.lock().unwrap();
        if pods.contains_key(&identity) {
            return Err(StoreError::Conflict {
                identity,
                message: "already exists".to_string(),
            });
        }
        let mut stored = pod.clone();
        stored.metadata.resource_version = Some(self.bump_version());
        pods.insert(identity, stored.clone());
        Ok(stored)
    }

    async fn update(&self, pod: &Pod) -> Result<Pod, StoreError> {
        let identity = ResourceIdentity::from_resource(pod);
        self.record(Op::Update, &identity)?;

        let mut pods = self.pods.lock().unwrap();
        let Some(current) = pods.get(&identity) else {
            return Err(StoreError::NotFound(identity));
        };
        if current.metadata.resource_version != pod.metadata.resource_version {
            return Err(StoreError::Conflict {
                identity,
                message: "the object has been modified".to_string(),
            });
        }
        let mut stored = pod.clone();
        stored.metadata.resource_version = Some(self.bump_version());
        pods.insert(identity, stored.clone());
        Ok(stored)
    }
}

pub fn identity(name: &str) -> ResourceIdentity {
    ResourceIdentity::new("fleet", name)
}

pub fn frigate(name: &str) -> Arc<Frigate> {
    let mut frigate = Frigate::new(name, FrigateSpec::default());
    frigate.metadata.namespace = Some("fleet".to_string());
    Arc::new(frigate)
}

pub fn reconciler_with(store: Arc<InMemoryPodStore>, config: ControllerConfig) -> Arc<Reconciler> {
    Arc::new(Reconciler::with_store(store, Arc::new(config)))
}
