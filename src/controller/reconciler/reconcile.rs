//! # Reconciliation Logic
//!
//! Main reconciliation for the Pod behind a `Frigate`.

use crate::config::ConvergencePolicy;
use crate::constants::CONVERGED_IMAGE;
use crate::controller::reconciler::desired::{container_image, desired_pod, set_container_image};
use crate::controller::reconciler::store::PodStore;
use crate::controller::reconciler::types::{
    ReconcileOutcome, Reconciler, ReconcilerError, ResourceIdentity,
};
use crate::crd::Frigate;
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Pod;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Drive the Pod for `identity` toward its desired state
///
/// Reads fresh state on every call and keeps nothing between calls. Issues
/// at most one create and one update; never deletes. Any store failure other
/// than NotFound on the initial read is returned, tagged with its stage.
///
/// # Errors
///
/// - [`ReconcilerError::PreGet`] when the read fails for any reason but NotFound
/// - [`ReconcilerError::Create`] when creating the absent Pod fails
/// - [`ReconcilerError::Update`] when converging the image fails; a Pod
///   created in the same call is left as created
pub async fn reconcile_pod(
    identity: &ResourceIdentity,
    store: &dyn PodStore,
    policy: ConvergencePolicy,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let current = match store.get(identity).await {
        Ok(pod) => Some(pod),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(ReconcilerError::PreGet(e)),
    };

    if let Some(pod) = current {
        return converge_existing(identity, store, pod, policy).await;
    }

    debug!(resource = %identity, "Pod not found, creating it");
    let created = store
        .create(&desired_pod(identity))
        .await
        .map_err(ReconcilerError::Create)?;
    metrics::increment_pods_created();
    info!(resource = %identity, "Created pod");

    // Mutate what the store returned so the update carries its resource version
    let mut converged = created;
    set_container_image(&mut converged, CONVERGED_IMAGE);
    store
        .update(&converged)
        .await
        .map_err(ReconcilerError::Update)?;
    metrics::increment_pods_updated();
    info!(resource = %identity, image = CONVERGED_IMAGE, "Converged pod image");

    Ok(ReconcileOutcome::done())
}

async fn converge_existing(
    identity: &ResourceIdentity,
    store: &dyn PodStore,
    mut pod: Pod,
    policy: ConvergencePolicy,
) -> Result<ReconcileOutcome, ReconcilerError> {
    match policy {
        ConvergencePolicy::ExistenceOnly => {
            debug!(resource = %identity, "Pod exists, nothing to do");
            Ok(ReconcileOutcome::done())
        }
        ConvergencePolicy::EnforceImage => {
            if container_image(&pod) == Some(CONVERGED_IMAGE) {
                debug!(resource = %identity, "Pod already runs the converged image");
                return Ok(ReconcileOutcome::done());
            }
            if !set_container_image(&mut pod, CONVERGED_IMAGE) {
                warn!(resource = %identity, "Pod has no container to converge");
                return Ok(ReconcileOutcome::done());
            }
            store.update(&pod).await.map_err(ReconcilerError::Update)?;
            metrics::increment_pods_updated();
            info!(resource = %identity, image = CONVERGED_IMAGE, "Re-converged pod image");
            Ok(ReconcileOutcome::done())
        }
    }
}

/// Reconcile entry point for the kube-runtime controller
///
/// Errors are handled by the error policy in [`crate::runtime::error_policy`],
/// which owns retry backoff.
///
/// # Errors
///
/// Whatever [`reconcile_pod`] returns.
pub async fn reconcile(frigate: Arc<Frigate>, ctx: Arc<Reconciler>) -> Result<Action, ReconcilerError> {
    let identity = ResourceIdentity::from_resource(frigate.as_ref());
    let span = tracing::info_span!(
        "controller.reconcile",
        resource.name = identity.name.as_str(),
        resource.namespace = identity.namespace.as_str(),
        resource.kind = "Frigate",
        policy = ctx.config.convergence_policy.as_str()
    );

    let start = Instant::now();
    metrics::increment_reconciliations();
    let result = reconcile_pod(&identity, ctx.store.as_ref(), ctx.config.convergence_policy)
        .instrument(span)
        .await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    let outcome = result?;
    ctx.reset_backoff(&identity);

    if outcome.requeue {
        metrics::increment_requeues_total("requested");
        Ok(Action::requeue(ctx.config.requeue_interval()))
    } else {
        Ok(Action::await_change())
    }
}

/// [`reconcile`] bounded by the configured reconcile timeout
///
/// On expiry the reconcile future is dropped, abandoning any in-flight store
/// call. The attempt still counts toward the duration histogram.
///
/// # Errors
///
/// [`ReconcilerError::TimedOut`] on expiry, otherwise whatever [`reconcile`] returns.
pub async fn reconcile_with_timeout(
    frigate: Arc<Frigate>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let timeout = ctx.config.reconcile_timeout();
    let start = tokio::time::Instant::now();
    match tokio::time::timeout(timeout, reconcile(frigate, ctx)).await {
        Ok(result) => result,
        Err(_elapsed) => {
            metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
            Err(ReconcilerError::TimedOut(timeout))
        }
    }
}
