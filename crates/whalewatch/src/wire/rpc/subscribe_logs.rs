use crate::core::types::LogNotification;
use crate::core::JoinHandleResult;

use std::time::Duration;

use futures::StreamExt;
use log::{error, info};
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter};
use solana_sdk::commitment_config::CommitmentConfig;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedSender;

pub const DEFAULT_RECONNECT_AFTER: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct LogSubscriptionConfig {
    pub ws_url: String,
    pub commitment: CommitmentConfig,
    pub reconnect_after: Duration,
}

impl LogSubscriptionConfig {
    pub fn new(ws_url: String) -> Self {
        LogSubscriptionConfig {
            ws_url,
            commitment: CommitmentConfig::confirmed(),
            reconnect_after: DEFAULT_RECONNECT_AFTER,
        }
    }
}

/// Spawns the whole-network log subscription. Raw notifications are forwarded
/// on `notifications_tx`; the task reconnects with a fixed delay whenever the
/// stream ends and exits on the shutdown broadcast.
pub fn spawn_log_subscription(
    config: LogSubscriptionConfig,
    notifications_tx: UnboundedSender<LogNotification>,
    shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandleResult<anyhow::Error> {
    tokio::spawn(watch_logs_task(config, notifications_tx, shutdown_rx))
}

async fn watch_logs_task(
    config: LogSubscriptionConfig,
    notifications_tx: UnboundedSender<LogNotification>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let mut connection_retries = 0;
    loop {
        info!(
            "Connecting to pubsub endpoint {}. Connection retries: {}",
            config.ws_url, connection_retries
        );
        let client = match PubsubClient::new(&config.ws_url).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed connecting to pubsub endpoint: {}", e);
                tokio::time::sleep(config.reconnect_after).await;
                connection_retries += 1;
                continue;
            }
        };

        let subscription = client
            .logs_subscribe(
                RpcTransactionLogsFilter::All,
                RpcTransactionLogsConfig {
                    commitment: Some(config.commitment),
                },
            )
            .await;
        let (mut log_notifications, logs_unsubscribe) = match subscription {
            Ok(subscription) => subscription,
            Err(e) => {
                error!("Log subscription failed: {}", e);
                tokio::time::sleep(config.reconnect_after).await;
                connection_retries += 1;
                continue;
            }
        };
        info!("Log subscription active. Waiting for notifications");

        let shutdown_notified;
        loop {
            tokio::select! {
                _shutdown_result = shutdown_rx.recv() => {
                    logs_unsubscribe().await;
                    shutdown_notified = true;
                    break;
                }
                maybe_update = log_notifications.next() => {
                    match maybe_update {
                        Some(update) => {
                            let notification = LogNotification {
                                signature: update.value.signature,
                                err: update.value.err,
                            };
                            if notifications_tx.send(notification).is_err() {
                                error!("Failed sending log notification. Receiving channel closed?");
                                shutdown_notified = true;
                                break;
                            }
                        }
                        None => {
                            info!("Log notification stream ended");
                            shutdown_notified = false;
                            break;
                        }
                    }
                }
            }
        }

        if shutdown_notified {
            break;
        }
        tokio::time::sleep(config.reconnect_after).await;
        connection_retries += 1;
    }

    info!("Log subscription task reached end");
    Ok(())
}
