//! The `sortdeck run` command: categorize every image, then build the decks.

use clap::Args;
use sortdeck_core::Sortdeck;

use super::common::{deck_phase, load_config, sort_phase, BucketArgs, DeckArgs, SortArgs};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub buckets: BucketArgs,

    #[command(flatten)]
    pub sort: SortArgs,

    #[command(flatten)]
    pub decks: DeckArgs,
}

/// Execute both phases in order. A fatal error in the first phase skips the second.
pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(|config| {
        args.buckets.apply(config);
        args.sort.apply(config);
        args.decks.apply(config);
    })?;
    let manifest = args.sort.manifest_target(&config);
    let sortdeck = Sortdeck::new(config);

    tokio::task::spawn_blocking(move || {
        let sorted = sort_phase(&sortdeck, manifest)?;
        tracing::debug!(
            "Phase 1 assigned {} images; building decks",
            sorted.assigned()
        );
        deck_phase(&sortdeck)
    })
    .await??;

    Ok(())
}
