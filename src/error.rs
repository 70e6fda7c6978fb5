//! Error types for the rooms server
//!
//! Defines connection-level errors and mailbox send errors.
//! Uses thiserror for ergonomic error definitions.
//!
//! Protocol-level failures (bad room code, taken username) are not errors
//! here: they travel back to the client as structured responses such as
//! `join_room{success: false}`. Unauthorized or unrecognized messages are
//! dropped without a response.

use thiserror::Error;

/// Connection-level errors
///
/// Anything that ends a connection session rather than producing a
/// response message.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - server actor is gone)
    #[error("Channel send error")]
    ChannelSend,
}

/// Mailbox send errors
///
/// Occurs when enqueueing to a member whose connection has ended.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the mailbox has been closed
    #[error("Mailbox closed")]
    MailboxClosed,
}
