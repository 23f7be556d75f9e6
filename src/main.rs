// Entrypoint for the CLI application.
// - Keeps `main` small: load configuration, build the uploader and minter,
//   and hand the flow to the UI loop.
// - Logs go to stderr, filtered by `RUST_LOG` (default `warn`).

use campnft_cli::{
    config::MintConfig, controller::MintFlow, mint::Minter, ui::main_menu, upload::Uploader,
    wallet::JsonRpcWallet,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Pinning token and contract address come from CAMPNFT_* variables or
    // the user's config.json. See `MintConfig::load`.
    let config = MintConfig::load()?;
    tracing::debug!(?config, "configuration loaded");

    let uploader = Uploader::new(&config)?;
    let minter = Minter::new(JsonRpcWallet::new(&config)?, &config);

    // Blocks until the user exits.
    main_menu(MintFlow::new(uploader, minter), &config)?;
    Ok(())
}
