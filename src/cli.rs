//! # Command Line
//!
//! Command-line overrides for the environment-driven configuration.
//! Flags win over environment variables; unset flags leave the loaded value alone.

use crate::config::{ControllerConfig, ConvergencePolicy, LogFormat, ServerConfig};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "frigate-controller",
    version,
    about = "Converges a managed Pod for every Frigate resource"
)]
pub struct ControllerArgs {
    /// Only watch this namespace (default: all namespaces)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Port for /metrics, /healthz and /readyz
    #[arg(long)]
    pub metrics_port: Option<u16>,

    /// Upper bound on a single reconciliation, in seconds
    #[arg(long)]
    pub reconcile_timeout_secs: Option<u64>,

    /// Maximum number of reconciliations running at once
    #[arg(long)]
    pub max_concurrent_reconciliations: Option<u16>,

    /// Update existing Pods whose image differs from the converged image
    #[arg(long)]
    pub enforce_image_convergence: bool,

    /// Log output format: json or text
    #[arg(long, value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,
}

fn parse_log_format(raw: &str) -> Result<LogFormat, String> {
    raw.parse()
}

impl ControllerArgs {
    /// Fold the flags into configuration loaded from the environment
    pub fn apply(self, controller: &mut ControllerConfig, server: &mut ServerConfig) {
        if let Some(namespace) = self.namespace {
            controller.watch_namespace = Some(namespace);
        }
        if let Some(port) = self.metrics_port {
            server.metrics_port = port;
        }
        if let Some(timeout) = self.reconcile_timeout_secs {
            controller.reconcile_timeout_secs = timeout;
        }
        if let Some(max) = self.max_concurrent_reconciliations {
            controller.max_concurrent_reconciliations = max;
        }
        if self.enforce_image_convergence {
            controller.convergence_policy = ConvergencePolicy::EnforceImage;
        }
        if let Some(format) = self.log_format {
            controller.log_format = format;
        }
    }
}
