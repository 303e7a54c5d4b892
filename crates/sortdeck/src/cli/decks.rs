//! The `sortdeck decks` command: build decks from existing category folders.

use clap::Args;
use sortdeck_core::Sortdeck;

use super::common::{deck_phase, load_config, BucketArgs, DeckArgs};

/// Arguments for the `decks` command.
#[derive(Args, Debug)]
pub struct DecksArgs {
    #[command(flatten)]
    pub buckets: BucketArgs,

    #[command(flatten)]
    pub decks: DeckArgs,
}

/// Execute the decks command.
pub async fn execute(args: DecksArgs) -> anyhow::Result<()> {
    let config = load_config(|config| {
        args.buckets.apply(config);
        args.decks.apply(config);
    })?;
    let sortdeck = Sortdeck::new(config);

    tokio::task::spawn_blocking(move || deck_phase(&sortdeck)).await??;
    Ok(())
}
