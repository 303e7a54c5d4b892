//! The `sortdeck categorize` command: sort images into category folders only.

use clap::Args;
use sortdeck_core::Sortdeck;

use super::common::{load_config, sort_phase, BucketArgs, SortArgs};

/// Arguments for the `categorize` command.
#[derive(Args, Debug)]
pub struct CategorizeArgs {
    #[command(flatten)]
    pub buckets: BucketArgs,

    #[command(flatten)]
    pub sort: SortArgs,
}

/// Execute the categorize command.
pub async fn execute(args: CategorizeArgs) -> anyhow::Result<()> {
    let config = load_config(|config| {
        args.buckets.apply(config);
        args.sort.apply(config);
    })?;
    let manifest = args.sort.manifest_target(&config);
    let sortdeck = Sortdeck::new(config);

    // Model inference is CPU-bound; keep it off the async runtime.
    tokio::task::spawn_blocking(move || sort_phase(&sortdeck, manifest)).await??;
    Ok(())
}
