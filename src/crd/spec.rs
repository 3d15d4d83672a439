//! # Frigate Spec
//!
//! Main CRD specification.

use serde::{Deserialize, Serialize};

/// Frigate Custom Resource Definition
///
/// Its identity is the only input the reconciler consults; the spec carries
/// no desired-state fields of its own.
///
/// # Example
///
/// ```yaml
/// apiVersion: ship.my.domain/v1beta1
/// kind: Frigate
/// metadata:
///   name: hms-example
///   namespace: default
/// spec:
///   description: escort for the morning convoy
/// ```
#[derive(
    kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema,
)]
#[kube(
    kind = "Frigate",
    group = "ship.my.domain",
    version = "v1beta1",
    namespaced,
    shortname = "frg",
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct FrigateSpec {
    /// Free-form description for operators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
