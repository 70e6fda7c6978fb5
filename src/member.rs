//! Member struct definition
//!
//! Represents one connected participant: identity, outbound mailbox,
//! and a back-reference to the room currently joined.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::Outbound;
use crate::types::RoomCode;

/// Producer half of a member's outbound queue
///
/// Unbounded so that broadcasts never suspend: many pipeline steps and
/// rooms may enqueue concurrently, while only the owning connection's
/// write task drains.
pub type Mailbox = mpsc::UnboundedSender<Outbound>;

/// One connected participant
///
/// Created when a connection is accepted, destroyed when the session
/// ends. The identity is set by the first create/join/load message.
#[derive(Debug)]
pub struct Member {
    /// Display name, unique within the current room (None before first join)
    pub username: Option<String>,
    /// Outbound message queue, drained by this member's write task
    pub mailbox: Mailbox,
    /// Code of the room currently joined, if any
    ///
    /// Lookup-only: resolves through the registry, never owns the room.
    /// A code left dangling by `close_room` simply resolves to nothing.
    pub room: Option<RoomCode>,
}

impl Member {
    /// Create a new member with the given mailbox sender
    pub fn new(mailbox: Mailbox) -> Self {
        Self {
            username: None,
            mailbox,
            room: None,
        }
    }

    /// Enqueue a message for this member
    ///
    /// Returns an error if the connection has already gone away.
    pub fn send(&self, msg: Outbound) -> Result<(), SendError> {
        self.mailbox.send(msg).map_err(|_| SendError::MailboxClosed)
    }

    /// Get the display name for this member
    ///
    /// Returns the username if set, otherwise "Unknown".
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("Unknown")
    }
}
