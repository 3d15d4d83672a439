//! # Frigate Controller
//!
//! Keeps a managed Pod converged for every `Frigate` resource in the cluster.
//!
//! Configuration comes from environment variables (see [`ControllerConfig`] and
//! [`ServerConfig`]) with command-line flags taking precedence.

use anyhow::Result;
use clap::Parser;
use frigate_controller::cli::ControllerArgs;
use frigate_controller::config::{ControllerConfig, ServerConfig};
use frigate_controller::runtime::initialization::initialize;
use frigate_controller::runtime::watch_loop::run_watch_loop;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ControllerArgs::parse();
    let mut controller_config = ControllerConfig::from_env();
    let mut server_config = ServerConfig::from_env();
    args.apply(&mut controller_config, &mut server_config);

    let init = initialize(controller_config, server_config).await?;

    run_watch_loop(init.frigates, init.pods, init.reconciler, init.server_state).await
}
