//! # Desired State
//!
//! Pure builders for the managed Pod. Nothing here touches the store.

use crate::constants::{CONTAINER_NAME, INITIAL_IMAGE, MANAGED_BY_LABEL, MANAGED_BY_VALUE};
use crate::controller::reconciler::types::ResourceIdentity;
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// The Pod created for `identity`: one `bob` container running `nginx`
#[must_use]
pub fn desired_pod(identity: &ResourceIdentity) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(identity.name.clone()),
            namespace: Some(identity.namespace.clone()),
            labels: Some(BTreeMap::from([(
                MANAGED_BY_LABEL.to_string(),
                MANAGED_BY_VALUE.to_string(),
            )])),
            ..ObjectMeta::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: CONTAINER_NAME.to_string(),
                image: Some(INITIAL_IMAGE.to_string()),
                ..Container::default()
            }],
            ..PodSpec::default()
        }),
        ..Pod::default()
    }
}

/// Image of the managed container, falling back to the first container
#[must_use]
pub fn container_image(pod: &Pod) -> Option<&str> {
    let containers = &pod.spec.as_ref()?.containers;
    containers
        .iter()
        .find(|c| c.name == CONTAINER_NAME)
        .or_else(|| containers.first())
        .and_then(|c| c.image.as_deref())
}

/// Point the managed container at `image`
///
/// Returns false when the Pod has no container to change.
pub fn set_container_image(pod: &mut Pod, image: &str) -> bool {
    let Some(spec) = pod.spec.as_mut() else {
        return false;
    };
    let index = spec
        .containers
        .iter()
        .position(|c| c.name == CONTAINER_NAME)
        .unwrap_or(0);
    match spec.containers.get_mut(index) {
        Some(container) => {
            container.image = Some(image.to_string());
            true
        }
        None => false,
    }
}
