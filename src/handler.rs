//! WebSocket connection handler
//!
//! Drives one connection session: WebSocket handshake, an inbound loop
//! feeding decoded messages to the RoomServer actor, and an outbound loop
//! draining the member's mailbox back to the socket. Whichever loop ends
//! first wins the select, after which the disconnect command triggers
//! room teardown on the actor.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::Outbound;
use crate::server::ServerCommand;
use crate::types::ConnId;

/// A custom outgoing pipeline step
///
/// Applied by the outbound loop to the encoded form of every message
/// right before the socket write.
pub type OutgoingStep = Box<dyn Fn(ConnId, &mut Value) + Send + Sync>;

/// Ordered list of outgoing steps, shared by every connection
#[derive(Default)]
pub struct OutgoingSteps {
    steps: Vec<OutgoingStep>,
}

impl OutgoingSteps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step; steps run in registration order
    pub fn push(&mut self, step: impl Fn(ConnId, &mut Value) + Send + Sync + 'static) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Freeze the list for sharing across connection tasks
    pub fn share(self) -> SharedOutgoingSteps {
        Arc::new(self)
    }

    fn apply(&self, conn: ConnId, message: &mut Value) {
        for step in &self.steps {
            step(conn, message);
        }
    }
}

pub type SharedOutgoingSteps = Arc<OutgoingSteps>;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, registers a member with the actor,
/// and runs the inbound/outbound loops until disconnect.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    outgoing: SharedOutgoingSteps,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let conn = ConnId::new();
    info!("Connection {} accepted from {}", conn, peer_addr);

    // The member's mailbox: pipeline steps and rooms produce, only this
    // connection's write task consumes.
    let (mailbox, mut mail_rx) = mpsc::unbounded_channel::<Outbound>();

    // Register with the RoomServer actor
    if cmd_tx
        .send(ServerCommand::Connect { conn, mailbox })
        .await
        .is_err()
    {
        error!("Failed to register connection {} - server closed", conn);
        return Err(AppError::ChannelSend);
    }

    let cmd_tx_read = cmd_tx.clone();

    // Inbound loop (WebSocket -> pipeline)
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match serde_json::from_str::<Value>(&text) {
                    Ok(message) if message.is_object() => {
                        if cmd_tx_read
                            .send(ServerCommand::Inbound { conn, message })
                            .await
                            .is_err()
                        {
                            debug!("Server closed, ending read task for {}", conn);
                            break;
                        }
                    }
                    Ok(_) => {
                        warn!("Non-object message from {}", conn);
                    }
                    Err(e) => {
                        warn!("Invalid JSON from {}: {}", conn, e);
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("Connection {} sent close frame", conn);
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Pong replies are handled by tungstenite
                }
                Ok(_) => {
                    // Binary or other frame types - ignore
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", conn, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", conn);
    });

    // Outbound loop (mailbox -> outgoing steps -> WebSocket)
    let write_task = tokio::spawn(async move {
        while let Some(msg) = mail_rx.recv().await {
            let mut value = match serde_json::to_value(&msg) {
                Ok(value) => value,
                Err(e) => {
                    error!("Failed to encode message: {}", e);
                    continue;
                }
            };
            outgoing.apply(conn, &mut value);
            let json = value.to_string();
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                debug!("WebSocket send failed, ending write task");
                break;
            }
        }
        debug!("Write task ended for {}", conn);

        let _ = ws_sender.close().await;
    });

    // Whichever loop ends first tears the session down
    tokio::select! {
        _ = read_task => {
            debug!("Read task completed for {}", conn);
        }
        _ = write_task => {
            debug!("Write task completed for {}", conn);
        }
    }

    // Teardown: the actor removes the member from any room it is in
    let _ = cmd_tx.send(ServerCommand::Disconnect { conn }).await;

    info!("Connection {} closed", conn);

    Ok(())
}
