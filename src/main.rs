use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use pyth_publisher_daemon::{
    config::Config,
    keystore,
    rpc::{HttpTransport as _, RpcHttpClient},
    supervisor,
};

/// The daemon's own flag set is small: everything else about a run lives in the YAML config file
/// it loads. This keeps `clap::Parser`'s surface to what actually varies per-invocation, the way
/// the teacher's own `args.rs` kept one derive per binary rather than a sprawling flag set.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to the daemon's YAML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Directory holding `publish_key_pair.json`, `mapping_key_pair.json`, `program_key.json`.
    #[arg(long)]
    key_store_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config_text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("reading {}", args.config.to_string_lossy()))?;
    let config = Config::from_yaml_str(&config_text).context("parsing configuration")?;

    let key_store_dir = args.key_store_dir.unwrap_or_else(|| config.key_store_dir.clone());
    let keystore = keystore::Keystore::load(&key_store_dir).context("loading keystore")?;

    log::info!(
        "starting publisher daemon: rpc_host={} tx_host={} publish_key={}",
        config.rpc_host,
        config.tx_host,
        keystore.publish_pubkey(),
    );

    let commitment = solana_sdk::commitment_config::CommitmentConfig {
        commitment: config.commitment,
    };
    let http: Arc<dyn HttpTransport> = Arc::new(RpcHttpClient::new(config.rpc_http_url(), commitment));
    let tx_http: Arc<dyn HttpTransport> = Arc::new(RpcHttpClient::new(config.tx_http_url(), commitment));

    let exit = CancellationToken::new();
    {
        let exit = exit.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            exit.cancel();
        });
    }

    let ws_url = config.rpc_ws_url();
    let mut supervisor = supervisor::Supervisor::new(
        config,
        http,
        tx_http,
        keystore.publish_key,
        keystore.mapping_key,
        exit,
    );
    supervisor
        .run(ws_url)
        .await
        .map_err(|err| anyhow::anyhow!(err.to_string()))
}
