//! Prints the VirtPlatform CRD manifest as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/virtplatform.yaml`

use crds::VirtPlatform;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crd = VirtPlatform::crd();
    print!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}
