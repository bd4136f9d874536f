pub mod server;

use crate::core::types::TransactionEvent;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed observer message: {0}")]
    MalformedMessage(#[from] serde_json::Error),
}

/// Current watch status, pushed to an observer as soon as it connects.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchStatus {
    pub is_watching: bool,
    pub threshold: f64,
}

/// Server-to-observer messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Status { data: WatchStatus },
    Transaction { data: TransactionEvent },
}

/// Observer-to-server commands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientCommand {
    Start { threshold: f64 },
    Stop,
}

/// Parses one inbound observer message. Valid JSON that isn't a recognized
/// command yields `Ok(None)` and is ignored without comment; anything that
/// isn't JSON at all is a [ProtocolError] for the caller to log. Neither
/// outcome closes the connection.
pub fn parse_client_command(text: &str) -> Result<Option<ClientCommand>, ProtocolError> {
    match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => Ok(Some(command)),
        Err(_) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(_) => Ok(None),
            Err(e) => Err(ProtocolError::MalformedMessage(e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_command() {
        let command = parse_client_command(r#"{"type":"start","threshold":25.5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(command, ClientCommand::Start { threshold: 25.5 });
    }

    #[test]
    fn parses_stop_command() {
        let command = parse_client_command(r#"{"type":"stop"}"#).unwrap().unwrap();
        assert_eq!(command, ClientCommand::Stop);
    }

    #[test]
    fn unrecognized_tag_is_ignored() {
        assert!(parse_client_command(r#"{"type":"pause"}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn non_json_input_is_an_error() {
        assert!(parse_client_command("not-json").is_err());
    }

    #[test]
    fn status_message_wire_shape() {
        let message = ServerMessage::Status {
            data: WatchStatus {
                is_watching: true,
                threshold: 100.0,
            },
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "status",
                "data": { "isWatching": true, "threshold": 100.0 }
            })
        );
    }

    #[test]
    fn transaction_message_wire_shape() {
        let message = ServerMessage::Transaction {
            data: TransactionEvent {
                signature: "abc".to_string(),
                sol_amount: 51.0,
                block_time: None,
                slot: 42,
            },
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "transaction",
                "data": {
                    "signature": "abc",
                    "solAmount": 51.0,
                    "blockTime": null,
                    "slot": 42
                }
            })
        );
    }
}
