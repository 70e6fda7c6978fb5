//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enum
//! for type-safe serialization/deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Client → Server message
///
/// All messages handled by the default pipeline steps. Uses tagged enum
/// with snake_case naming; a message whose `type` is not listed here (or
/// that is missing a required field) fails to decode and is left to the
/// custom incoming steps.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// Create a new room, becoming its first member and host
    CreateRoom { username: String },
    /// Join an existing room by code
    JoinRoom { username: String, code: String },
    /// Create a new room from a saved snapshot
    LoadRoom { username: String, save_data: Snapshot },
    /// Close the current room for everyone (host only)
    CloseRoom,
    /// Leave the current room
    LeaveRoom,
    /// Remove another member from the room (host only)
    RemoveFromRoom { username: String },
    /// Request a snapshot of the current room
    SaveRoom,
    /// Promote another member to host (host only)
    MakeHost { username: String },
    /// Give up own host status
    RemoveHost,
    /// Hand host status to another member (host only)
    ChangeHost { username: String },
}

/// Server → Client message
///
/// Everything the default steps and Room broadcasts can enqueue on a
/// member's mailbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Room created; carries the freshly allocated code
    CreateRoom { room_code: String },
    /// Join outcome; `fail_reason` present only on failure
    JoinRoom {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        fail_reason: Option<String>,
    },
    /// Room restored from a snapshot; carries the new code
    LoadRoom { room_code: String },
    /// Full membership snapshot, broadcast after membership changes
    UsersUpdate { users: BTreeMap<String, UserStatus> },
    /// Host set changed by one identity
    HostsUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        added: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        removed: Option<String>,
    },
    /// Private notice to a member who just became host
    HostPromotion,
    /// A member left or was removed
    RemovedFromRoom { username: String },
    /// The room was closed by a host
    RoomClosed,
    /// Snapshot of the current room, returned to the requester
    SaveRoom { save_data: Snapshot },
}

/// Per-member entry inside a `users_update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatus {
    pub host: bool,
}

/// Serializable room summary used for save/load
///
/// `members` and `hosts` preserve join order. Any other top-level fields a
/// custom room flavor adds ride along in `extra` and are passed through
/// verbatim when the snapshot is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub members: Vec<String>,
    pub hosts: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Outbound {
    /// Shorthand for a `hosts_update` announcing a promotion
    pub fn host_added(username: &str) -> Self {
        Outbound::HostsUpdate {
            added: Some(username.to_string()),
            removed: None,
        }
    }

    /// Shorthand for a `hosts_update` announcing a demotion
    pub fn host_removed(username: &str) -> Self {
        Outbound::HostsUpdate {
            added: None,
            removed: Some(username.to_string()),
        }
    }

    /// Shorthand for a failed `join_room` response
    pub fn join_failed(reason: &str) -> Self {
        Outbound::JoinRoom {
            success: false,
            fail_reason: Some(reason.to_string()),
        }
    }
}
