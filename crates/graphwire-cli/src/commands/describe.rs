use crate::demo;
use graphwire_core::{snapshot, Config};
use graphwire_proto::codec;
use miette::Result;
use tracing::debug;

/// Print a metadata snapshot of the demo plant.
pub fn run(config: &Config) -> Result<()> {
    let registry = demo::registry().map_err(|e| miette::miette!("Invalid demo graph: {}", e))?;
    let root = demo::root();

    debug!(depth = config.metadata_depth, "Describing demo plant");
    let class = snapshot::class(registry.as_ref(), &root, config.metadata_depth);
    let text = codec::encode_pretty(&class)
        .map_err(|e| miette::miette!("Failed to encode snapshot: {}", e))?;
    println!("{text}");
    Ok(())
}
