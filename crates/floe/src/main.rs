//! Floe CLI: discovery and incremental sync of parquet files in object storage.

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use floe::{
    Catalog, CliArgs, Config, JsonLinesEmitter, Mode, StorageProvider, SyncState, TapError,
    discover, init_tracing, sync,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.log_level.as_filter());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<(), TapError> {
    let config = Config::from_file(&args.config)?;

    match args.mode() {
        Mode::Discover => {
            let storage = connect(&config).await?;
            let catalog = discover(&config, &storage).await?;
            catalog.write_pretty(std::io::stdout().lock())?;
        }
        Mode::Sync { catalog, state } => {
            let catalog = Catalog::from_file(&catalog)?;
            let state = state.map(SyncState::from_file).unwrap_or_default();
            let storage = connect(&config).await?;

            let mut emitter = JsonLinesEmitter::new(std::io::stdout().lock());
            sync(&config, &storage, &catalog, state, &mut emitter).await?;
        }
    }

    Ok(())
}

async fn connect(config: &Config) -> Result<StorageProvider, TapError> {
    let storage =
        StorageProvider::for_url_with_options(&config.bucket_url(), config.storage_options.clone())
            .await?;
    info!(
        bucket = %storage.canonical_url(),
        tables = config.tables.len(),
        "Connected to storage"
    );
    Ok(storage)
}
