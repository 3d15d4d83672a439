//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::controller::reconciler::{Reconciler, ReconcilerError, ResourceIdentity};
use crate::crd::Frigate;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Handle a failed reconciliation with per-resource exponential backoff
///
/// Backoff state is tracked per resource to avoid cross-resource interference
/// and is reset by the next successful reconciliation of that resource.
pub fn handle_reconciliation_error(
    obj: Arc<Frigate>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let identity = ResourceIdentity::from_resource(obj.as_ref());

    error!(
        resource.name = identity.name.as_str(),
        resource.namespace = identity.namespace.as_str(),
        stage = error.stage(),
        error = %error,
        "Reconciliation error"
    );
    metrics::increment_reconciliation_errors(error.stage());

    let (backoff, error_count) = ctx.next_error_backoff(&identity);
    let next_trigger_time = chrono::Utc::now()
        + chrono::TimeDelta::from_std(backoff).unwrap_or(chrono::TimeDelta::zero());

    info!(
        resource = %identity,
        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
        error_count,
        next_retry = next_trigger_time.to_rfc3339().as_str(),
        "Retrying with exponential backoff (trigger source: error-backoff)"
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(backoff)
}

/// Classes of watch stream failure, each handled differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// 401: RBAC revoked or token expired
    Unauthorized,
    /// 410: resource version too old, normal across restarts
    Expired,
    /// 429: API server throttling or storage reinitializing
    Throttled,
    /// 404: CRD missing or object deleted
    NotFound,
    Other,
}

/// Classify a watch error from its debug rendering
///
/// 404 is checked before 401 because a plain-text 404 can surface wrapped in
/// an error chain that also mentions watch failure.
#[must_use]
pub fn classify_watch_error(error: &str) -> WatchErrorKind {
    let is_not_found =
        error.contains("ObjectNotFound") || error.contains("404") || error.contains("not found");
    if (error.contains("401") || error.contains("Unauthorized")) && !is_not_found {
        WatchErrorKind::Unauthorized
    } else if error.contains("410")
        || error.contains("too old resource version")
        || error.contains("Expired")
        || error.contains("Gone")
    {
        WatchErrorKind::Expired
    } else if error.contains("429")
        || error.contains("storage is (re)initializing")
        || error.contains("TooManyRequests")
    {
        WatchErrorKind::Throttled
    } else if is_not_found {
        WatchErrorKind::NotFound
    } else {
        WatchErrorKind::Other
    }
}

/// Handle watch stream errors with classification and backoff
///
/// Returns `None` to drop the item, `Some(())` to pass it on.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff_ms: &AtomicU64,
    max_backoff_ms: u64,
    watch_restart_delay: Duration,
) -> Option<()> {
    match classify_watch_error(error_string) {
        WatchErrorKind::Unauthorized => {
            error!("Watch authentication failed (401 Unauthorized) - RBAC may have been revoked or token expired");
            error!("Verify the controller ServiceAccount can still list frigates and pods:");
            error!("  kubectl auth can-i list frigates.ship.my.domain --as=system:serviceaccount:<namespace>:frigate-controller");
            error!("  kubectl auth can-i create pods --as=system:serviceaccount:<namespace>:frigate-controller");
            warn!(
                "Waiting {}s before retrying watch (RBAC may need time to propagate)...",
                watch_restart_delay.as_secs()
            );
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
        WatchErrorKind::Expired => {
            warn!(error_type = "410", "Watch resource version expired, watch will restart");
            None
        }
        WatchErrorKind::Throttled => {
            let current = backoff_ms.load(Ordering::Relaxed);
            warn!(
                "API server throttling (429), backing off for {}ms before restart...",
                current
            );
            tokio::time::sleep(Duration::from_millis(current)).await;
            backoff_ms.store(current.saturating_mul(2).min(max_backoff_ms), Ordering::Relaxed);
            None
        }
        WatchErrorKind::NotFound => {
            warn!(
                "Resource not found (404) - normal if the object was deleted, otherwise check the Frigate CRD is installed. Error: {}",
                error_string
            );
            Some(())
        }
        WatchErrorKind::Other => {
            error!("Controller stream error: {}", error_string);
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
    }
}
