//! Paramcache CLI application entry point
//!
//! Loads the configured parameter store into the cache, then runs one command
//! against it.
//!
//! # Usage
//!
//! ```bash
//! # Show the tree (default command)
//! paramcache
//! paramcache ls /app -d 2
//!
//! # Read, change and create parameters
//! paramcache get /app/db/host
//! paramcache set /app/db/host db.internal
//! paramcache add /app/api/key s3cr3t -t securestring
//!
//! # Delete
//! paramcache rm /app/api/key
//! paramcache rmdir /app/legacy -y
//!
//! # Ranked search
//! paramcache search db
//!
//! # Quiet mode (only output results), more logging with -v / -vv
//! paramcache -q search db
//! ```
//!
//! # Configuration
//!
//! On first run, paramcache prompts for initial setup. Configuration is stored
//! in the user's config directory (`~/.config/paramcache/config.toml` on Linux).

use paramcache::{
    ParamCacheError,
    cli::{Cli, Commands},
    commands,
    config::ParamCacheConfig,
    output,
    remote::FileStore,
    sync::SyncEngine,
};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

type Result<T> = std::result::Result<T, ParamCacheError>;

fn init_tracing(cli: &Cli) {
    let filter = match cli.log_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "paramcache=warn".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(&cli);

    let mut config = ParamCacheConfig::load_or_setup()?;
    let quiet = cli.quiet || config.quiet;
    let command = cli.get_command();

    if let Commands::Config { command } = &command {
        return commands::config(&mut config, command, quiet);
    }

    let store_path = cli.store.clone().unwrap_or_else(|| config.store.clone());
    tracing::debug!(store = %store_path.display(), "opening store");
    let engine = SyncEngine::with_remote(config.sync.clone(), Arc::new(FileStore::new(store_path)));

    let summary = engine.reload().await?;
    if !quiet && matches!(command, Commands::Tree { .. } | Commands::Status { .. }) {
        println!("{}", output::load_summary(&summary));
    }

    match command {
        Commands::Tree { path, depth } => commands::tree(&engine, path.as_deref(), depth, quiet)?,
        Commands::Get { path, json, reveal } => commands::get(&engine, &path, json, reveal)?,
        Commands::Set { path, value } => commands::set(&engine, &path, &value, quiet).await?,
        Commands::Add {
            path,
            value,
            param_type,
        } => commands::add(&engine, &path, &value, param_type, quiet).await?,
        Commands::Rm { path } => commands::rm(&engine, &path, quiet).await?,
        Commands::Rmdir { path, yes } => commands::rmdir(&engine, &path, yes, quiet).await?,
        Commands::Search { query, json, limit } => {
            commands::search(&engine, &query, json, limit, quiet)?;
        }
        Commands::Status { json } => commands::status(&engine, json)?,
        Commands::Config { .. } => unreachable!(),
    }

    Ok(())
}
