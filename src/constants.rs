//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Field manager recorded on every write the controller makes
pub const FIELD_MANAGER: &str = "frigate-controller";

/// Label key stamped on managed Pods so the watch can select them
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Label value paired with [`MANAGED_BY_LABEL`]
pub const MANAGED_BY_VALUE: &str = "frigate-controller";

/// Name of the single container in the managed Pod
pub const CONTAINER_NAME: &str = "bob";

/// Image the managed Pod is created with
pub const INITIAL_IMAGE: &str = "nginx";

/// Image the managed Pod is converged to right after creation
pub const CONVERGED_IMAGE: &str = "redis";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default per-resource error backoff starting value (milliseconds)
pub const DEFAULT_BACKOFF_START_MS: u64 = 1000;

/// Default per-resource error backoff maximum value (milliseconds)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 300_000;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Default upper bound on a single reconciliation (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 30;

/// Default delay used when a reconciliation explicitly asks to be requeued (seconds)
pub const DEFAULT_REQUEUE_INTERVAL_SECS: u64 = 300;

/// Default limit on reconciliations running at the same time
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;
