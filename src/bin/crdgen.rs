//! Prints the Frigate CustomResourceDefinition as YAML.
//!
//! ```sh
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use frigate_controller::crd::Frigate;
use kube::core::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&Frigate::crd())?);
    Ok(())
}
