use super::{parse_client_command, ClientCommand, ServerMessage};
use crate::core::JoinHandleResult;
use crate::services::watch::WatchCommand;

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio_tungstenite::{accept_async, tungstenite::Message};

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(0);

/// Accepts observer connections and spawns a task per connection. The watch
/// service enforces the single-observer rule; a new connection simply
/// announces itself and replaces any prior handle there.
pub fn start_observer_server(
    listener: TcpListener,
    commands_tx: UnboundedSender<WatchCommand>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandleResult<anyhow::Error> {
    tokio::spawn(async move {
        info!(
            "Observer server listening on {}",
            listener.local_addr()?
        );
        loop {
            tokio::select! {
                _shutdown_result = shutdown_rx.recv() => {
                    info!("Observer server shutting down");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let id = NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed);
                            info!("Observer {} connected from {}", id, addr);
                            let commands_tx = commands_tx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = observer_connection_task(stream, id, commands_tx).await {
                                    error!("Observer {} connection error: {}", id, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Failed accepting observer connection: {}", e);
                        }
                    }
                }
            }
        }
        Ok(())
    })
}

async fn observer_connection_task(
    stream: TcpStream,
    id: u64,
    commands_tx: UnboundedSender<WatchCommand>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    let (outbound_tx, mut outbound_rx) = unbounded_channel::<ServerMessage>();
    commands_tx.send(WatchCommand::ObserverConnected {
        id,
        sender: outbound_tx,
    })?;

    loop {
        tokio::select! {
            maybe_message = outbound_rx.recv() => {
                match maybe_message {
                    Some(message) => {
                        let text = serde_json::to_string(&message)?;
                        if let Err(e) = write.send(Message::Text(text)).await {
                            error!("Failed sending to observer {}: {}", id, e);
                            break;
                        }
                    }
                    // The watch service dropped our sender; a newer observer
                    // replaced this connection.
                    None => {
                        info!("Observer {} replaced by a newer connection", id);
                        break;
                    }
                }
            }
            maybe_frame = read.next() => {
                match maybe_frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_observer_message(id, &text, &commands_tx)?;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Observer {} disconnected", id);
                        break;
                    }
                    Some(Ok(_)) => {} // ping/pong/binary frames are ignored
                    Some(Err(e)) => {
                        error!("Observer {} connection error: {}", id, e);
                        break;
                    }
                }
            }
        }
    }

    // Best-effort: the service may already be gone during shutdown.
    let _ = commands_tx.send(WatchCommand::ObserverDisconnected { id });
    Ok(())
}

fn handle_observer_message(
    id: u64,
    text: &str,
    commands_tx: &UnboundedSender<WatchCommand>,
) -> anyhow::Result<()> {
    debug!("Received message from observer {}: {}", id, text);
    match parse_client_command(text) {
        Ok(Some(ClientCommand::Start { threshold })) => {
            commands_tx.send(WatchCommand::Start {
                threshold_sol: threshold,
            })?;
        }
        Ok(Some(ClientCommand::Stop)) => {
            commands_tx.send(WatchCommand::Stop)?;
        }
        Ok(None) => {
            debug!("Ignoring unrecognized command from observer {}", id);
        }
        Err(e) => {
            warn!("Invalid message format from observer {}: {}", id, e);
        }
    }
    Ok(())
}
