//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::{parse_bool_or_default, parse_or_default};
use crate::constants::{
    DEFAULT_BACKOFF_MAX_MS, DEFAULT_BACKOFF_START_MS, DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
    DEFAULT_RECONCILE_TIMEOUT_SECS, DEFAULT_REQUEUE_INTERVAL_SECS,
    DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS, DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use std::time::Duration;

/// How an already existing Pod is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvergencePolicy {
    /// Any existing Pod counts as converged, whatever its image
    #[default]
    ExistenceOnly,
    /// An existing Pod whose container image differs from the converged image is updated
    EnforceImage,
}

impl ConvergencePolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConvergencePolicy::ExistenceOnly => "existence-only",
            ConvergencePolicy::EnforceImage => "enforce-image",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "plain" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Namespace to watch; `None` watches every namespace
    pub watch_namespace: Option<String>,
    /// Per-resource error backoff starting value (milliseconds)
    pub backoff_start_ms: u64,
    /// Per-resource error backoff maximum value (milliseconds)
    pub backoff_max_ms: u64,
    /// Watch stream restart delay after unknown errors (seconds)
    pub watch_restart_delay_secs: u64,
    /// Watch stream restart delay after stream ends (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// Upper bound on one reconciliation, enforced by the watch loop (seconds)
    pub reconcile_timeout_secs: u64,
    /// Delay before re-running a reconciliation that asked to be requeued (seconds)
    pub requeue_interval_secs: u64,
    /// Maximum concurrent reconciliations
    pub max_concurrent_reconciliations: u16,
    /// How existing Pods are judged
    pub convergence_policy: ConvergencePolicy,
    /// Log format (json, text)
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            backoff_start_ms: DEFAULT_BACKOFF_START_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            watch_restart_delay_after_end_secs: DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            reconcile_timeout_secs: DEFAULT_RECONCILE_TIMEOUT_SECS,
            requeue_interval_secs: DEFAULT_REQUEUE_INTERVAL_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            convergence_policy: ConvergencePolicy::ExistenceOnly,
            log_format: LogFormat::Json,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let convergence_policy =
            if parse_bool_or_default(lookup("ENFORCE_IMAGE_CONVERGENCE"), false) {
                ConvergencePolicy::EnforceImage
            } else {
                ConvergencePolicy::ExistenceOnly
            };

        Self {
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
            backoff_start_ms: parse_or_default(lookup("BACKOFF_START_MS"), defaults.backoff_start_ms),
            backoff_max_ms: parse_or_default(lookup("BACKOFF_MAX_MS"), defaults.backoff_max_ms),
            watch_restart_delay_secs: parse_or_default(
                lookup("WATCH_RESTART_DELAY_SECS"),
                defaults.watch_restart_delay_secs,
            ),
            watch_restart_delay_after_end_secs: parse_or_default(
                lookup("WATCH_RESTART_DELAY_AFTER_END_SECS"),
                defaults.watch_restart_delay_after_end_secs,
            ),
            reconcile_timeout_secs: parse_or_default(
                lookup("RECONCILE_TIMEOUT_SECS"),
                defaults.reconcile_timeout_secs,
            ),
            requeue_interval_secs: parse_or_default(
                lookup("REQUEUE_INTERVAL_SECS"),
                defaults.requeue_interval_secs,
            ),
            max_concurrent_reconciliations: parse_or_default(
                lookup("MAX_CONCURRENT_RECONCILIATIONS"),
                defaults.max_concurrent_reconciliations,
            ),
            convergence_policy,
            log_format: parse_or_default(lookup("LOG_FORMAT"), defaults.log_format),
        }
    }

    /// Get reconcile timeout duration
    #[must_use]
    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }

    /// Get requeue interval duration
    #[must_use]
    pub fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.requeue_interval_secs)
    }

    /// Get watch restart delay duration
    #[must_use]
    pub fn watch_restart_delay(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    /// Get watch restart delay after end duration
    #[must_use]
    pub fn watch_restart_delay_after_end(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = ControllerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.watch_namespace, None);
        assert_eq!(config.backoff_start_ms, DEFAULT_BACKOFF_START_MS);
        assert_eq!(config.backoff_max_ms, DEFAULT_BACKOFF_MAX_MS);
        assert_eq!(config.reconcile_timeout(), Duration::from_secs(30));
        assert_eq!(config.convergence_policy, ConvergencePolicy::ExistenceOnly);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = ControllerConfig::from_lookup(lookup_from(&[
            ("WATCH_NAMESPACE", "fleet"),
            ("BACKOFF_START_MS", "250"),
            ("BACKOFF_MAX_MS", "4000"),
            ("RECONCILE_TIMEOUT_SECS", "5"),
            ("MAX_CONCURRENT_RECONCILIATIONS", "3"),
            ("ENFORCE_IMAGE_CONVERGENCE", "true"),
            ("LOG_FORMAT", "text"),
        ]));
        assert_eq!(config.watch_namespace.as_deref(), Some("fleet"));
        assert_eq!(config.backoff_start_ms, 250);
        assert_eq!(config.backoff_max_ms, 4000);
        assert_eq!(config.reconcile_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_concurrent_reconciliations, 3);
        assert_eq!(config.convergence_policy, ConvergencePolicy::EnforceImage);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_blank_namespace_means_all_namespaces() {
        let config = ControllerConfig::from_lookup(lookup_from(&[("WATCH_NAMESPACE", "  ")]));
        assert_eq!(config.watch_namespace, None);
    }

    #[test]
    fn test_unknown_log_format_falls_back_to_json() {
        let config = ControllerConfig::from_lookup(lookup_from(&[("LOG_FORMAT", "xml")]));
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
