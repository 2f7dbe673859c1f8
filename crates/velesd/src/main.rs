//! Veles login/gateway daemon
//!
//! Usage:
//!   velesd [config]            # defaults to veles.toml
//!
//! Exits 0 on clean shutdown, non-zero when initialization fails.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veles_patch::{MemoryPatchDao, Patcher};
use veles_server::{Gateway, IpBanCache, MockAccountService, NullUserDao};

use crate::config::FileConfig;

#[derive(Debug, Parser)]
#[command(name = "velesd", about = "Veles login/gateway daemon")]
struct Cli {
    /// Path to the configuration file
    #[arg(default_value = "veles.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = FileConfig::load(&cli.config)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Logger configured successfully");

    let gateway = boot(&config).await?;
    let runner = tokio::spawn(gateway.clone().run());

    info!("Veles gateway started successfully");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    gateway.shutdown();
    runner.abort();

    info!("Veles gateway terminated");
    Ok(())
}

async fn boot(config: &FileConfig) -> anyhow::Result<Arc<Gateway>> {
    info!("Loading IP ban list...");
    let bans = config
        .bans
        .iter()
        .map(|rule| rule.parse())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| anyhow::anyhow!("Bad ban rule: {err}"))?;
    let ban_cache = IpBanCache::new(bans);

    info!("Loading patch data...");
    let patch_dao = MemoryPatchDao::new(config.patch_rows());
    let patches = Patcher::load_patches(&config.patches.bin_path, &patch_dao)?;

    let mut patcher = Patcher::new(config.allowed_versions(), patches);

    if config.survey.enabled {
        info!("Loading survey data...");
        patcher.set_survey(&config.survey.bin_path, config.survey.id)?;
    }

    // development stand-in for the upstream account service; a deployment
    // wires its RPC client through the same trait
    let accounts = Arc::new(MockAccountService::new());
    for account in &config.accounts {
        accounts.insert_session(&account.username, account.session_key.clone());
    }

    let addr = config.bind_addr();
    info!(%addr, "Starting network service");

    let gateway = Gateway::bind(
        &addr,
        config.gateway_config(),
        Arc::new(patcher),
        accounts,
        Arc::new(NullUserDao),
        ban_cache,
    )
    .await?;

    Ok(Arc::new(gateway))
}
