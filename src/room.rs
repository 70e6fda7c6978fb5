//! Room struct definition
//!
//! A room owns its members and the subset that are hosts, and is the only
//! place membership and host status change. Two invariants hold after
//! every operation: the host set is a subset of the member set (structural
//! here, since host status is a flag on a seat), and a room with members
//! always has at least one host (kept by promoting a replacement before
//! any demotion that would empty the host set).

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::member::Mailbox;
use crate::message::{Outbound, Snapshot, UserStatus};
use crate::types::RoomCode;

/// One member's seat in a room: identity, host flag, and a clone of their
/// mailbox sender for broadcasts.
#[derive(Debug)]
struct Seat {
    username: String,
    host: bool,
    mailbox: Mailbox,
}

/// A named group of connected members sharing broadcast scope
///
/// Seats are kept in join order, which makes host-promotion tie-breaks
/// deterministic: the longest-standing non-host is promoted first.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    seats: Vec<Seat>,
    loaded: bool,
    extra: Map<String, Value>,
}

impl Room {
    /// Create an empty room with the given code
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            seats: Vec::new(),
            loaded: false,
            extra: Map::new(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Whether this room was restored from a snapshot
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn member_count(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.seats.iter().any(|s| s.username == username)
    }

    /// Whether the named member currently holds host status
    pub fn is_host(&self, username: &str) -> bool {
        self.seats.iter().any(|s| s.username == username && s.host)
    }

    /// Member identities in join order
    pub fn member_names(&self) -> Vec<String> {
        self.seats.iter().map(|s| s.username.clone()).collect()
    }

    /// Host identities in join order
    pub fn host_names(&self) -> Vec<String> {
        self.seats
            .iter()
            .filter(|s| s.host)
            .map(|s| s.username.clone())
            .collect()
    }

    /// Add a member
    ///
    /// Fails without mutation if the identity is already taken. `host`
    /// seeds the member's host status (room creators and loaders join as
    /// hosts).
    pub fn add_member(&mut self, username: &str, host: bool, mailbox: Mailbox) -> bool {
        if self.contains(username) {
            return false;
        }
        self.seats.push(Seat {
            username: username.to_string(),
            host,
            mailbox,
        });
        true
    }

    /// Remove a member, returning true iff the room is now empty
    ///
    /// A departing host is demoted first so a replacement gets promoted
    /// while the member set still justifies one. The removed member gets a
    /// private `removed_from_room`, then the remaining members receive the
    /// same notification followed by a `users_update` snapshot.
    pub fn remove_member(&mut self, username: &str) -> bool {
        let Some(idx) = self.seats.iter().position(|s| s.username == username) else {
            return self.seats.is_empty();
        };

        if self.seats[idx].host {
            self.demote_host(username);
        }

        let seat = self.seats.remove(idx);
        let notice = Outbound::RemovedFromRoom {
            username: seat.username.clone(),
        };
        let _ = seat.mailbox.send(notice.clone());
        self.broadcast(&notice);
        self.send_users_update();

        self.seats.is_empty()
    }

    /// Promote a member to host
    ///
    /// With no explicit target, the first non-host in join order is
    /// chosen. No-op if the target is absent or already a host, or if
    /// every member already hosts. The promoted member receives a private
    /// `host_promotion` before the room-wide `hosts_update`.
    pub fn promote_host(&mut self, target: Option<&str>) {
        let idx = match target {
            Some(name) => self.seats.iter().position(|s| s.username == name),
            None => self.seats.iter().position(|s| !s.host),
        };
        let Some(idx) = idx else { return };
        if self.seats[idx].host {
            return;
        }

        self.seats[idx].host = true;
        let username = self.seats[idx].username.clone();
        let _ = self.seats[idx].mailbox.send(Outbound::HostPromotion);
        self.broadcast(&Outbound::host_added(&username));
    }

    /// Demote a host
    ///
    /// No-op if the member is not currently a host. Demoting the sole
    /// host promotes a replacement first; when no replacement exists
    /// (single-member room) the demotion is refused so the room never
    /// holds members without a host.
    pub fn demote_host(&mut self, username: &str) {
        if !self.is_host(username) {
            return;
        }

        if self.host_names().len() == 1 {
            self.promote_host(None);
            if self.host_names().len() == 1 {
                return;
            }
        }

        if let Some(seat) = self.seats.iter_mut().find(|s| s.username == username) {
            seat.host = false;
        }
        self.broadcast(&Outbound::host_removed(username));
    }

    /// Enqueue a message onto every current member's mailbox
    pub fn broadcast(&self, msg: &Outbound) {
        for seat in &self.seats {
            let _ = seat.mailbox.send(msg.clone());
        }
    }

    /// Enqueue a message onto every current host's mailbox
    pub fn send_to_hosts(&self, msg: &Outbound) {
        for seat in self.seats.iter().filter(|s| s.host) {
            let _ = seat.mailbox.send(msg.clone());
        }
    }

    /// Build the `users_update` snapshot message for this room
    pub fn users_update(&self) -> Outbound {
        let users: BTreeMap<String, UserStatus> = self
            .seats
            .iter()
            .map(|s| (s.username.clone(), UserStatus { host: s.host }))
            .collect();
        Outbound::UsersUpdate { users }
    }

    /// Broadcast the current membership snapshot
    pub fn send_users_update(&self) {
        self.broadcast(&self.users_update());
    }

    /// Serialize membership for saving
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            members: self.member_names(),
            hosts: self.host_names(),
            extra: self.extra.clone(),
        }
    }

    /// Restore state carried by a snapshot
    ///
    /// Marks the room as loaded and installs the snapshot's extension
    /// fields. The saved member and host rosters are not replayed: those
    /// identities have no live connection and must re-join over the wire.
    /// Never broadcasts; announcing the restored room is the caller's job.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.loaded = true;
        self.extra = snapshot.extra;
    }
}
