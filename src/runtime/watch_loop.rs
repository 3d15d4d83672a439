//! # Watch Loop
//!
//! Controller watch loop that monitors `Frigate` resources and their managed
//! Pods and triggers reconciliation when either changes.
//!
//! kube-runtime provides the work queue: at most one in-flight reconciliation
//! per object, coalescing of rapid re-triggers, and requeue scheduling.

use crate::constants::{MANAGED_BY_LABEL, MANAGED_BY_VALUE};
use crate::controller::reconciler::{reconcile_with_timeout, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::Frigate;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::controller::{self, Controller};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::watcher;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Label selector matching Pods this controller created
#[must_use]
pub fn managed_pod_selector() -> String {
    format!("{MANAGED_BY_LABEL}={MANAGED_BY_VALUE}")
}

/// Map a managed Pod event to the Frigate with the same namespace/name
#[must_use]
pub fn frigate_for_pod(pod: &Pod) -> Option<ObjectRef<Frigate>> {
    let namespace = pod.namespace()?;
    Some(ObjectRef::new(&pod.name_any()).within(&namespace))
}

/// Run the controller watch loop
///
/// Watches Frigates (create/update/delete) and managed Pods, reconciling the
/// matching identity on every event. Restarts the controller when its stream
/// ends and exits on SIGINT/SIGTERM.
///
/// # Errors
///
/// Currently always returns `Ok` once shutdown completes.
pub async fn run_watch_loop(
    frigates: Api<Frigate>,
    pods: Api<Pod>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let config = reconciler.config.clone();
    let backoff_ms = Arc::new(AtomicU64::new(config.backoff_start_ms));

    // The controller drains itself on the same signals via shutdown_on_signal();
    // this flag only stops the loop from restarting it
    let shutdown_requested = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown_requested.clone();
    let shutdown_server_state = server_state.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        shutdown_flag.store(true, Ordering::Relaxed);
        shutdown_server_state.set_ready(false);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });

    loop {
        if shutdown_requested.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        info!(
            namespace = config.watch_namespace.as_deref().unwrap_or("*"),
            policy = config.convergence_policy.as_str(),
            "Starting controller watch loop..."
        );
        server_state.set_ready(true);

        let backoff_for_stream = backoff_ms.clone();
        let config_for_stream = config.clone();
        let controller_config = controller::Config::default()
            .concurrency(config.max_concurrent_reconciliations);

        Controller::new(frigates.clone(), watcher::Config::default().any_semantic())
            .watches(
                pods.clone(),
                watcher::Config::default().labels(&managed_pod_selector()),
                |pod| frigate_for_pod(&pod),
            )
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(
                reconcile_with_timeout,
                handle_reconciliation_error,
                reconciler.clone(),
            )
            .filter_map(move |item| {
                let backoff = backoff_for_stream.clone();
                let config = config_for_stream.clone();
                async move {
                    match item {
                        Ok((obj, action)) => {
                            backoff.store(config.backoff_start_ms, Ordering::Relaxed);
                            debug!(resource = %obj, action = ?action, "watch.event.reconciled");
                            Some(())
                        }
                        Err(controller::Error::ReconcilerFailed(e, obj)) => {
                            // Already handled by the error policy
                            debug!(resource = %obj, error = %e, "watch.event.reconciliation_failed");
                            None
                        }
                        Err(e) => {
                            let error_string = format!("{e:?}");
                            handle_watch_stream_error(
                                &error_string,
                                &backoff,
                                config.backoff_max_ms,
                                config.watch_restart_delay(),
                            )
                            .await
                        }
                    }
                }
            })
            .for_each(|()| futures::future::ready(()))
            .await;

        // Give the signal task a moment to record a shutdown that ended the stream
        tokio::time::sleep(config.watch_restart_delay_after_end()).await;
        if shutdown_requested.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!("Controller watch stream ended, restarting...");
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Resolve on the first SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::{desired_pod, ResourceIdentity};

    #[test]
    fn test_managed_pod_selector_matches_desired_labels() {
        let pod = desired_pod(&ResourceIdentity::new("fleet", "hms-example"));
        let labels = pod.metadata.labels.unwrap();
        let selector = managed_pod_selector();
        let (key, value) = selector.split_once('=').unwrap();
        assert_eq!(labels.get(key).map(String::as_str), Some(value));
    }

    #[test]
    fn test_frigate_for_pod_keeps_identity() {
        let pod = desired_pod(&ResourceIdentity::new("fleet", "hms-example"));
        let obj = frigate_for_pod(&pod).unwrap();
        assert_eq!(obj.name, "hms-example");
        assert_eq!(obj.namespace.as_deref(), Some("fleet"));
    }

    #[test]
    fn test_frigate_for_pod_without_namespace() {
        let mut pod = desired_pod(&ResourceIdentity::new("fleet", "hms-example"));
        pod.metadata.namespace = None;
        assert!(frigate_for_pod(&pod).is_none());
    }
}
