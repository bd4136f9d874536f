pub mod config;

use crate::core::dedup::SignatureWindow;
use crate::core::transfer::net_transfer_sol;
use crate::core::types::{LogNotification, TransactionDetail, TransactionEvent};
use crate::core::JoinHandleResult;
use crate::wire::rpc::resolve::get_transaction_detail_with_retry;
use crate::wire::rpc::subscribe_logs::{spawn_log_subscription, LogSubscriptionConfig};
use crate::wire::rpc::LedgerClient;
use crate::wire::ws::{ServerMessage, WatchStatus};

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use config::WatchConfig;
use log::{debug, error, info, warn};
use solana_sdk::signature::Signature;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug)]
pub enum WatchCommand {
    Start { threshold_sol: f64 },
    Stop,
    ObserverConnected {
        id: u64,
        sender: UnboundedSender<ServerMessage>,
    },
    ObserverDisconnected { id: u64 },
}

#[derive(Debug, Clone, Copy)]
struct WatchState {
    is_watching: bool,
    threshold_sol: f64,
}

struct ObserverHandle {
    id: u64,
    sender: UnboundedSender<ServerMessage>,
}

struct ResolvedTransfer {
    detail: TransactionDetail,
    sol_amount: f64,
}

pub struct WatchServiceHandle {
    pub commands_tx: UnboundedSender<WatchCommand>,
    pub notifications_tx: UnboundedSender<LogNotification>,
    pub task: JoinHandleResult<anyhow::Error>,
}

/// Starts the watch service task. All shared state (watch status, threshold,
/// dedup window, the observer handle) lives inside the task and is mutated
/// only through its mailbox.
pub fn start_watch_service(
    ledger: Arc<dyn LedgerClient>,
    config: WatchConfig,
    log_source: Option<LogSubscriptionConfig>,
    shutdown_tx: broadcast::Sender<()>,
) -> WatchServiceHandle {
    let (commands_tx, commands_rx) = unbounded_channel();
    let (notifications_tx, notifications_rx) = unbounded_channel();
    let (resolved_tx, resolved_rx) = unbounded_channel();

    let service = WatchService {
        state: WatchState {
            is_watching: false,
            threshold_sol: config.default_threshold_sol,
        },
        window: SignatureWindow::new(config.signature_window),
        observer: None,
        subscribed: false,
        subscription_task: None,
        ledger,
        config,
        log_source,
        notifications_tx: notifications_tx.clone(),
        resolved_tx,
        shutdown_tx,
    };
    let task = tokio::spawn(service.run(commands_rx, notifications_rx, resolved_rx));

    WatchServiceHandle {
        commands_tx,
        notifications_tx,
        task,
    }
}

struct WatchService {
    state: WatchState,
    window: SignatureWindow,
    observer: Option<ObserverHandle>,
    subscribed: bool,
    subscription_task: Option<JoinHandleResult<anyhow::Error>>,
    ledger: Arc<dyn LedgerClient>,
    config: WatchConfig,
    log_source: Option<LogSubscriptionConfig>,
    notifications_tx: UnboundedSender<LogNotification>,
    resolved_tx: UnboundedSender<ResolvedTransfer>,
    shutdown_tx: broadcast::Sender<()>,
}

impl WatchService {
    async fn run(
        mut self,
        mut commands_rx: UnboundedReceiver<WatchCommand>,
        mut notifications_rx: UnboundedReceiver<LogNotification>,
        mut resolved_rx: UnboundedReceiver<ResolvedTransfer>,
    ) -> anyhow::Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                _shutdown_result = shutdown_rx.recv() => {
                    info!("Watch service shutting down");
                    break;
                }
                maybe_command = commands_rx.recv() => {
                    match maybe_command {
                        Some(command) => self.handle_command(command),
                        None => {
                            info!("Command channel closed. Exiting watch service");
                            break;
                        }
                    }
                }
                // Neither channel can yield `None` here: the service holds a
                // sender for each so in-flight resolutions stay deliverable.
                Some(notification) = notifications_rx.recv() => {
                    self.handle_notification(notification);
                }
                Some(resolved) = resolved_rx.recv() => {
                    self.handle_resolved(resolved);
                }
            }
        }

        if let Some(task) = self.subscription_task.take() {
            // Covers the command-channel-closed exit, where no broadcast was
            // sent; the subscription task only terminates on shutdown.
            let _ = self.shutdown_tx.send(());
            match task.await {
                Ok(Ok(())) => info!("Log subscription task completed"),
                Ok(Err(e)) => warn!("Log subscription task returned error {}", e),
                Err(e) => error!("Log subscription task failed to complete: {}", e),
            }
        }
        Ok(())
    }

    fn handle_command(&mut self, command: WatchCommand) {
        match command {
            WatchCommand::Start { threshold_sol } => {
                info!("Observer requested watch with threshold {} SOL", threshold_sol);
                self.state.threshold_sol = threshold_sol;
                if !self.state.is_watching {
                    self.state.is_watching = true;
                    self.ensure_subscribed();
                }
            }
            WatchCommand::Stop => {
                // The subscription stays up and transfers keep being
                // evaluated against the threshold; only the status reported
                // to observers changes.
                self.state.is_watching = false;
                info!("Stopped watching transactions");
            }
            WatchCommand::ObserverConnected { id, sender } => {
                // A new connection replaces any prior handle; dropping the
                // old sender ends the old connection's writer.
                self.observer = Some(ObserverHandle { id, sender });
                let status = ServerMessage::Status {
                    data: WatchStatus {
                        is_watching: self.state.is_watching,
                        threshold: self.state.threshold_sol,
                    },
                };
                self.emit(status);
            }
            WatchCommand::ObserverDisconnected { id } => match &self.observer {
                Some(handle) if handle.id == id => {
                    info!("Observer {} disconnected", id);
                    self.observer = None;
                    self.state.is_watching = false;
                }
                _ => debug!("Ignoring disconnect for stale observer {}", id),
            },
        }
    }

    fn handle_notification(&mut self, notification: LogNotification) {
        debug!("New transaction log detected: {}", notification.signature);
        if let Some(err) = notification.err {
            debug!(
                "Skipping failed transaction {}: {}",
                notification.signature, err
            );
            return;
        }
        if self.window.seen(&notification.signature) {
            debug!("Duplicate signature, skipping: {}", notification.signature);
            return;
        }
        self.window.record(notification.signature.clone());

        let signature = match Signature::from_str(&notification.signature) {
            Ok(signature) => signature,
            Err(e) => {
                warn!("Unparseable signature {}: {}", notification.signature, e);
                return;
            }
        };

        // Resolution runs off the service loop so one slow lookup doesn't
        // stall the notifications behind it. The result comes back through
        // the mailbox and is filtered against the threshold current at
        // completion time.
        let ledger = Arc::clone(&self.ledger);
        let resolved_tx = self.resolved_tx.clone();
        let retries = self.config.resolve_retries;
        let delay = Duration::from_millis(self.config.resolve_retry_delay_ms);
        tokio::spawn(async move {
            let detail =
                get_transaction_detail_with_retry(ledger.as_ref(), &signature, retries, delay)
                    .await;
            if let Some(detail) = detail {
                let sol_amount = net_transfer_sol(&detail);
                if resolved_tx
                    .send(ResolvedTransfer { detail, sol_amount })
                    .is_err()
                {
                    error!("Failed sending resolved transfer. Watch service gone?");
                }
            }
        });
    }

    fn handle_resolved(&mut self, resolved: ResolvedTransfer) {
        info!(
            "Total transfer for {}: {} SOL",
            resolved.detail.signature, resolved.sol_amount
        );
        if resolved.sol_amount >= self.state.threshold_sol {
            let event = TransactionEvent::new(&resolved.detail, resolved.sol_amount);
            info!("Sending transaction event to observer: {:?}", event);
            self.emit(ServerMessage::Transaction { data: event });
        }
    }

    fn emit(&mut self, message: ServerMessage) {
        match &self.observer {
            Some(handle) => {
                if handle.sender.send(message).is_err() {
                    error!(
                        "Failed sending to observer {}. Connection closed?",
                        handle.id
                    );
                }
            }
            None => debug!("No observer attached. Dropping message"),
        }
    }

    fn ensure_subscribed(&mut self) {
        if self.subscribed {
            return;
        }
        self.subscribed = true;
        info!(
            "Watching for transactions >= {} SOL on the entire network",
            self.state.threshold_sol
        );
        if let Some(source) = self.log_source.take() {
            let task = spawn_log_subscription(
                source,
                self.notifications_tx.clone(),
                self.shutdown_tx.subscribe(),
            );
            self.subscription_task = Some(task);
        }
    }
}
