use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use envconfig::Envconfig;
use flexi_logger::{Cleanup, Criterion, Logger, Naming};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use whalewatch::services::watch::config::WatchConfig;
use whalewatch::services::watch::start_watch_service;
use whalewatch::wire::rpc::subscribe_logs::LogSubscriptionConfig;
use whalewatch::wire::rpc::RpcLedgerClient;
use whalewatch::wire::ws::server::start_observer_server;

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Config {
    /// Solana HTTP RPC URL
    #[clap(env = "RPC_URL")]
    rpc_url: String,
    /// Solana websocket RPC URL
    #[clap(env = "WS_URL")]
    ws_url: String,
    /// Port the observer server listens on
    #[clap(env = "LISTEN_PORT", long, default_value_t = 8080)]
    listen_port: u16,
    /// Optional directory for rotated log files; stdout only when unset
    #[clap(env = "LOG_DIR", long)]
    log_dir: Option<String>,
    #[clap(env = "LOG_MAX_SIZE_MB", long, default_value_t = 200)] // default is 200 mb
    log_max_size_mb: u64,
    #[clap(env = "LOG_KEEP_TXT_COUNT", long, default_value_t = 5)]
    log_keep_txt_count: usize,
    #[clap(env = "LOG_KEEP_COMPRESSED_COUNT", long, default_value_t = 95)]
    log_keep_compressed_count: usize,
}

fn log_formatter(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "[{}] {} [{}] ",
        now.format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.module_path().unwrap_or("<unnamed>"),
    )?;

    write!(w, "{}", record.args())
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::parse();

    let logger = Logger::try_with_env_or_str("info")?.format(log_formatter);
    let logger = match &config.log_dir {
        Some(log_dir) => logger
            .log_to_file(flexi_logger::FileSpec::default().directory(log_dir))
            .cleanup_in_background_thread(true)
            .rotate(
                Criterion::Size(config.log_max_size_mb * 1024 * 1024), // convert to bytes
                Naming::Numbers,
                Cleanup::KeepLogAndCompressedFiles(
                    config.log_keep_txt_count,
                    config.log_keep_compressed_count,
                ),
            )
            .duplicate_to_stdout(flexi_logger::Duplicate::All),
        None => logger.log_to_stdout(),
    };
    logger.start()?;

    log::info!("Config: {:#?}", config);

    let commitment = CommitmentConfig::confirmed();
    let rpc_client = Arc::new(RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        commitment,
    ));
    log::info!("Solana connection established: {}", rpc_client.url());

    let watch_config = WatchConfig::init_from_env()?;
    log::info!("Watch config: {:#?}", watch_config);

    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    let log_source = LogSubscriptionConfig {
        ws_url: config.ws_url.clone(),
        commitment,
        reconnect_after: Duration::from_secs(watch_config.reconnect_after_secs),
    };
    let service = start_watch_service(
        Arc::new(RpcLedgerClient::new(Arc::clone(&rpc_client))),
        watch_config,
        Some(log_source),
        shutdown_tx.clone(),
    );

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.listen_port)).await?;
    let server_task = start_observer_server(
        listener,
        service.commands_tx.clone(),
        shutdown_tx.subscribe(),
    );

    let tasks = vec![server_task, service.task];

    tokio::signal::ctrl_c().await?;
    log::warn!("Received ctrl-c. Shutting down");
    match shutdown_tx.send(()) {
        Ok(_) => log::info!("Broadcast shutdown signal to tasks successfully"),
        Err(_) => log::info!("Failed sending broadcast shutdown signal. No active receivers"),
    }
    futures::future::join_all(tasks).await;
    log::warn!("Exiting whalewatch...");
    Ok(())
}
