//! RoomServer actor implementation
//!
//! The central actor that owns all shared state: the member table and the
//! room registry. Connection handlers talk to it through an mpsc command
//! channel, so every room mutation is serialized on one task and no step
//! can observe a half-applied membership change. Member mailboxes are
//! unbounded, which keeps every pipeline step synchronous: a step runs to
//! completion before the next command is taken.
//!
//! Inbound dispatch is the state-transition table: one match arm per
//! default message type, in the documented order, followed by any custom
//! incoming steps registered before the actor started. Unauthorized,
//! unknown, and malformed messages are dropped without a response and
//! without mutation.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::member::{Mailbox, Member};
use crate::message::{Inbound, Outbound};
use crate::registry::RoomRegistry;
use crate::room::Room;
use crate::types::{ConnId, RoomCode};

/// Commands sent from connection handlers to the RoomServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection accepted
    Connect { conn: ConnId, mailbox: Mailbox },
    /// Connection ended; run room teardown
    Disconnect { conn: ConnId },
    /// Decoded inbound message to run through the pipeline
    Inbound { conn: ConnId, message: Value },
}

/// A custom incoming pipeline step
///
/// Runs after the default dispatch on every inbound message, including
/// types the default set does not recognize. Steps get mutable access to
/// the whole server state, the sender's connection id, and the raw JSON
/// message.
pub type IncomingStep = Box<dyn FnMut(&mut ServerState, ConnId, &Value) + Send>;

/// Everything the pipeline operates on: the member table and the registry
#[derive(Debug)]
pub struct ServerState {
    members: HashMap<ConnId, Member>,
    registry: RoomRegistry,
}

impl ServerState {
    /// Fresh state with the default room-code length
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
            registry: RoomRegistry::new(),
        }
    }

    /// Fresh state with a configured room-code length
    pub fn with_code_length(code_length: usize) -> Self {
        Self {
            members: HashMap::new(),
            registry: RoomRegistry::with_code_length(code_length),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RoomRegistry {
        &mut self.registry
    }

    pub fn member(&self, conn: ConnId) -> Option<&Member> {
        self.members.get(&conn)
    }

    pub fn member_mut(&mut self, conn: ConnId) -> Option<&mut Member> {
        self.members.get_mut(&conn)
    }

    /// The room a connection's member currently sits in, if it is live
    pub fn current_room_mut(&mut self, conn: ConnId) -> Option<&mut Room> {
        let code = self.members.get(&conn)?.room.clone()?;
        self.registry.lookup_mut(&code)
    }

    /// Register a new connection's member
    pub fn connect(&mut self, conn: ConnId, mailbox: Mailbox) {
        info!("Connection {} registered", conn);
        self.members.insert(conn, Member::new(mailbox));
    }

    /// Tear down a connection's member
    ///
    /// Runs regardless of how the connection ended: the member is removed
    /// from its room first (releasing the room if that emptied it), then
    /// dropped from the table.
    pub fn disconnect(&mut self, conn: ConnId) {
        if let Some((code, username)) = self.room_and_name(conn) {
            debug!("Connection {} dropped while in room {}", conn, code);
            self.remove_named(&code, &username);
        }
        self.members.remove(&conn);
        info!("Connection {} removed", conn);
    }

    /// Run one inbound message through the default pipeline
    ///
    /// Messages that do not decode to a known type are a no-op here; the
    /// caller still hands them to the custom steps.
    pub fn dispatch(&mut self, conn: ConnId, message: &Value) {
        let inbound = match Inbound::deserialize(message) {
            Ok(inbound) => inbound,
            Err(e) => {
                debug!("Message from {} skipped default steps: {}", conn, e);
                return;
            }
        };

        match inbound {
            Inbound::CreateRoom { username } => self.create_room(conn, username),
            Inbound::JoinRoom { username, code } => self.join_room(conn, username, code),
            Inbound::LoadRoom {
                username,
                save_data,
            } => self.load_room(conn, username, save_data),
            Inbound::CloseRoom => self.close_room(conn),
            Inbound::LeaveRoom => self.leave_room(conn),
            Inbound::RemoveFromRoom { username } => self.remove_from_room(conn, username),
            Inbound::SaveRoom => self.save_room(conn),
            Inbound::MakeHost { username } => self.make_host(conn, username),
            Inbound::RemoveHost => self.remove_host(conn),
            Inbound::ChangeHost { username } => self.change_host(conn, username),
        }
    }

    /// Whether the connection's member currently sits in a live room
    ///
    /// A stale code left behind by `close_room` does not count.
    fn in_live_room(&self, conn: ConnId) -> bool {
        self.members
            .get(&conn)
            .and_then(|m| m.room.as_ref())
            .is_some_and(|code| self.registry.lookup(code).is_some())
    }

    /// Live room code and identity of a connection's member
    fn room_and_name(&self, conn: ConnId) -> Option<(RoomCode, String)> {
        let member = self.members.get(&conn)?;
        let code = member.room.clone()?;
        self.registry.lookup(&code)?;
        Some((code, member.username.clone()?))
    }

    fn create_room(&mut self, conn: ConnId, username: String) {
        if self.in_live_room(conn) {
            return;
        }
        let Some(member) = self.members.get_mut(&conn) else {
            return;
        };
        member.username = Some(username.clone());
        let mailbox = member.mailbox.clone();

        let code = self.registry.allocate();
        member.room = Some(code.clone());
        let _ = member.send(Outbound::CreateRoom {
            room_code: code.to_string(),
        });

        let Some(room) = self.registry.lookup_mut(&code) else {
            return;
        };
        room.add_member(&username, true, mailbox);
        room.send_users_update();
        info!("{} created room {}", username, code);
    }

    fn join_room(&mut self, conn: ConnId, username: String, code: String) {
        if self.in_live_room(conn) {
            return;
        }
        let Some(member) = self.members.get_mut(&conn) else {
            return;
        };
        member.username = Some(username.clone());
        let mailbox = member.mailbox.clone();

        let code = RoomCode::from(code);
        let Some(room) = self.registry.lookup_mut(&code) else {
            let _ = member.send(Outbound::join_failed("invalid code"));
            return;
        };
        if !room.add_member(&username, false, mailbox) {
            let _ = member.send(Outbound::join_failed("username taken"));
            return;
        }

        member.room = Some(code.clone());
        let _ = member.send(Outbound::JoinRoom {
            success: true,
            fail_reason: None,
        });
        room.send_users_update();
        info!("{} joined room {}", username, code);
    }

    fn load_room(&mut self, conn: ConnId, username: String, save_data: crate::message::Snapshot) {
        if self.in_live_room(conn) {
            return;
        }
        let Some(member) = self.members.get_mut(&conn) else {
            return;
        };
        member.username = Some(username.clone());
        let mailbox = member.mailbox.clone();

        let code = self.registry.allocate();
        member.room = Some(code.clone());
        let _ = member.send(Outbound::LoadRoom {
            room_code: code.to_string(),
        });

        let Some(room) = self.registry.lookup_mut(&code) else {
            return;
        };
        room.add_member(&username, true, mailbox);
        room.restore(save_data);
        room.send_users_update();
        info!("{} loaded a saved room as {}", username, code);
    }

    fn close_room(&mut self, conn: ConnId) {
        let Some((code, username)) = self.room_and_name(conn) else {
            return;
        };
        let Some(room) = self.registry.lookup(&code) else {
            return;
        };
        if !room.is_host(&username) {
            return;
        }

        room.broadcast(&Outbound::RoomClosed);
        self.registry.release(&code);
        for member in self.members.values_mut() {
            if member.room.as_ref() == Some(&code) {
                member.room = None;
            }
        }
        info!("{} closed room {}", username, code);
    }

    fn leave_room(&mut self, conn: ConnId) {
        let Some((code, username)) = self.room_and_name(conn) else {
            return;
        };
        self.remove_named(&code, &username);
    }

    fn remove_from_room(&mut self, conn: ConnId, target: String) {
        let Some((code, username)) = self.room_and_name(conn) else {
            return;
        };
        let Some(room) = self.registry.lookup(&code) else {
            return;
        };
        if !room.is_host(&username) || !room.contains(&target) {
            return;
        }
        self.remove_named(&code, &target);
    }

    fn save_room(&mut self, conn: ConnId) {
        let Some((code, _)) = self.room_and_name(conn) else {
            return;
        };
        let Some(room) = self.registry.lookup(&code) else {
            return;
        };
        let save_data = room.snapshot();
        let Some(member) = self.members.get(&conn) else {
            return;
        };
        let _ = member.send(Outbound::SaveRoom { save_data });
    }

    fn make_host(&mut self, conn: ConnId, target: String) {
        let Some((code, username)) = self.room_and_name(conn) else {
            return;
        };
        let Some(room) = self.registry.lookup_mut(&code) else {
            return;
        };
        if !room.is_host(&username) || !room.contains(&target) {
            return;
        }
        room.promote_host(Some(&target));
    }

    fn remove_host(&mut self, conn: ConnId) {
        let Some((code, username)) = self.room_and_name(conn) else {
            return;
        };
        let Some(room) = self.registry.lookup_mut(&code) else {
            return;
        };
        if !room.is_host(&username) {
            return;
        }
        room.demote_host(&username);
    }

    fn change_host(&mut self, conn: ConnId, target: String) {
        let Some((code, username)) = self.room_and_name(conn) else {
            return;
        };
        let Some(room) = self.registry.lookup_mut(&code) else {
            return;
        };
        if !room.is_host(&username) || !room.contains(&target) || room.is_host(&target) {
            return;
        }
        // Promote before demote so the room is never host-less in between.
        room.promote_host(Some(&target));
        room.demote_host(&username);
        info!("{} handed host to {} in {}", username, target, code);
    }

    /// Remove a named member from a room and reclaim the room if emptied
    fn remove_named(&mut self, code: &RoomCode, target: &str) {
        let Some(room) = self.registry.lookup_mut(code) else {
            return;
        };
        if !room.contains(target) {
            return;
        }
        let now_empty = room.remove_member(target);
        if now_empty {
            self.registry.release(code);
        }
        for member in self.members.values_mut() {
            if member.username.as_deref() == Some(target) && member.room.as_ref() == Some(code) {
                member.room = None;
            }
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// The room server actor
///
/// Receives commands from all connection handlers and applies them to the
/// shared state one at a time. Custom incoming steps registered before
/// `run` execute after the default dispatch, in registration order.
pub struct RoomServer {
    state: ServerState,
    receiver: mpsc::Receiver<ServerCommand>,
    incoming_steps: Vec<IncomingStep>,
}

impl RoomServer {
    /// Create a server actor reading commands from `receiver`
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            state: ServerState::new(),
            receiver,
            incoming_steps: Vec::new(),
        }
    }

    /// Create a server actor with a configured room-code length
    pub fn with_code_length(receiver: mpsc::Receiver<ServerCommand>, code_length: usize) -> Self {
        Self {
            state: ServerState::with_code_length(code_length),
            receiver,
            incoming_steps: Vec::new(),
        }
    }

    /// Append a custom incoming pipeline step
    ///
    /// Custom steps always run after the default steps, in the order they
    /// were registered.
    pub fn incoming_step(
        &mut self,
        step: impl FnMut(&mut ServerState, ConnId, &Value) + Send + 'static,
    ) -> &mut Self {
        self.incoming_steps.push(Box::new(step));
        self
    }

    /// Run the actor event loop
    ///
    /// Processes commands until every handler's sender is dropped.
    pub async fn run(mut self) {
        info!("RoomServer started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                ServerCommand::Connect { conn, mailbox } => self.state.connect(conn, mailbox),
                ServerCommand::Disconnect { conn } => self.state.disconnect(conn),
                ServerCommand::Inbound { conn, message } => {
                    self.state.dispatch(conn, &message);
                    for step in &mut self.incoming_steps {
                        step(&mut self.state, conn, &message);
                    }
                }
            }
        }

        info!("RoomServer shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Snapshot;
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn connect(state: &mut ServerState) -> (ConnId, UnboundedReceiver<Outbound>) {
        let conn = ConnId::new();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        state.connect(conn, tx);
        (conn, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Create a room as `username` and return its code
    fn create_room(state: &mut ServerState, conn: ConnId, username: &str) -> String {
        state.dispatch(conn, &json!({"type": "create_room", "username": username}));
        let member = state.member(conn).unwrap();
        member.room.clone().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_room_registers_creator_as_host() {
        let mut state = ServerState::new();
        let (alice, mut rx) = connect(&mut state);

        let code = create_room(&mut state, alice, "alice");

        let room = state.registry().lookup(&RoomCode::from(code.as_str())).unwrap();
        assert_eq!(room.member_names(), vec!["alice"]);
        assert_eq!(room.host_names(), vec!["alice"]);
        assert!(!room.is_loaded());

        let msgs = drain(&mut rx);
        assert_eq!(msgs[0], Outbound::CreateRoom { room_code: code });
        assert!(matches!(msgs[1], Outbound::UsersUpdate { .. }));
    }

    #[tokio::test]
    async fn test_created_codes_are_distinct() {
        let mut state = ServerState::new();
        let (alice, _rx_a) = connect(&mut state);
        let (bob, _rx_b) = connect(&mut state);

        let code_a = create_room(&mut state, alice, "alice");
        let code_b = create_room(&mut state, bob, "bob");
        assert_ne!(code_a, code_b);
    }

    #[tokio::test]
    async fn test_join_room_updates_everyone() {
        let mut state = ServerState::new();
        let (alice, mut rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        drain(&mut rx_a);

        let (bob, mut rx_b) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );

        let to_bob = drain(&mut rx_b);
        assert_eq!(
            to_bob[0],
            Outbound::JoinRoom {
                success: true,
                fail_reason: None
            }
        );
        let Outbound::UsersUpdate { users } = &to_bob[1] else {
            panic!("expected users_update");
        };
        assert!(users["alice"].host);
        assert!(!users["bob"].host);

        // The existing member sees the same snapshot.
        assert_eq!(drain(&mut rx_a), vec![to_bob[1].clone()]);
    }

    #[tokio::test]
    async fn test_join_room_invalid_code() {
        let mut state = ServerState::new();
        let (bob, mut rx) = connect(&mut state);

        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": "ZZZZZZZZ"}),
        );

        assert_eq!(drain(&mut rx), vec![Outbound::join_failed("invalid code")]);
        assert!(state.registry().is_empty());
        assert!(state.member(bob).unwrap().room.is_none());
    }

    #[tokio::test]
    async fn test_join_room_username_taken() {
        let mut state = ServerState::new();
        let (alice, mut rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        drain(&mut rx_a);

        let (imposter, mut rx_i) = connect(&mut state);
        state.dispatch(
            imposter,
            &json!({"type": "join_room", "username": "alice", "code": code}),
        );

        assert_eq!(
            drain(&mut rx_i),
            vec![Outbound::join_failed("username taken")]
        );
        let room = state.registry().lookup(&RoomCode::from(code.as_str())).unwrap();
        assert_eq!(room.member_count(), 1);
        // No users_update reached the original member.
        assert!(drain(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn test_remove_host_promotes_before_demoting() {
        let mut state = ServerState::new();
        let (alice, mut rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        let (bob, mut rx_b) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );
        drain(&mut rx_a);
        drain(&mut rx_b);

        state.dispatch(alice, &json!({"type": "remove_host"}));

        let to_bob = drain(&mut rx_b);
        assert_eq!(to_bob[0], Outbound::HostPromotion);
        assert_eq!(to_bob[1], Outbound::host_added("bob"));
        assert_eq!(to_bob[2], Outbound::host_removed("alice"));

        let room = state.registry().lookup(&RoomCode::from(code.as_str())).unwrap();
        assert_eq!(room.host_names(), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_leave_room_releases_empty_room() {
        let mut state = ServerState::new();
        let (alice, _rx) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");

        state.dispatch(alice, &json!({"type": "leave_room"}));

        assert!(state
            .registry()
            .lookup(&RoomCode::from(code.as_str()))
            .is_none());
        assert!(state.member(alice).unwrap().room.is_none());
    }

    #[tokio::test]
    async fn test_host_can_remove_member() {
        let mut state = ServerState::new();
        let (alice, _rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        let (bob, mut rx_b) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );
        drain(&mut rx_b);

        state.dispatch(alice, &json!({"type": "remove_from_room", "username": "bob"}));

        let to_bob = drain(&mut rx_b);
        assert_eq!(
            to_bob[0],
            Outbound::RemovedFromRoom {
                username: "bob".to_string()
            }
        );
        let room = state.registry().lookup(&RoomCode::from(code.as_str())).unwrap();
        assert_eq!(room.member_names(), vec!["alice"]);
        assert!(state.member(bob).unwrap().room.is_none());
    }

    #[tokio::test]
    async fn test_non_host_cannot_remove_member() {
        let mut state = ServerState::new();
        let (alice, _rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        let (bob, mut rx_b) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );
        drain(&mut rx_b);

        state.dispatch(bob, &json!({"type": "remove_from_room", "username": "alice"}));

        // Silently dropped: no response, no mutation.
        assert!(drain(&mut rx_b).is_empty());
        let room = state.registry().lookup(&RoomCode::from(code.as_str())).unwrap();
        assert_eq!(room.member_count(), 2);
    }

    #[tokio::test]
    async fn test_close_room_broadcasts_and_releases() {
        let mut state = ServerState::new();
        let (alice, mut rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        let (bob, mut rx_b) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );
        drain(&mut rx_a);
        drain(&mut rx_b);

        state.dispatch(alice, &json!({"type": "close_room"}));

        assert_eq!(drain(&mut rx_a), vec![Outbound::RoomClosed]);
        assert_eq!(drain(&mut rx_b), vec![Outbound::RoomClosed]);
        assert!(state.registry().is_empty());

        // Former members are free to start over.
        let code2 = create_room(&mut state, bob, "bob");
        assert!(state
            .registry()
            .lookup(&RoomCode::from(code2.as_str()))
            .is_some());
    }

    #[tokio::test]
    async fn test_close_room_requires_host() {
        let mut state = ServerState::new();
        let (alice, _rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        let (bob, mut rx_b) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );
        drain(&mut rx_b);

        state.dispatch(bob, &json!({"type": "close_room"}));

        assert!(drain(&mut rx_b).is_empty());
        assert_eq!(state.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let mut state = ServerState::new();
        let (alice, mut rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        let (bob, _rx_b) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );
        drain(&mut rx_a);

        state.dispatch(alice, &json!({"type": "save_room"}));
        let msgs = drain(&mut rx_a);
        let Outbound::SaveRoom { save_data } = &msgs[0] else {
            panic!("expected save_room response");
        };
        assert_eq!(save_data.members, vec!["alice", "bob"]);
        assert_eq!(save_data.hosts, vec!["alice"]);

        // Load the snapshot on a fresh connection.
        let (carol, mut rx_c) = connect(&mut state);
        state.dispatch(
            carol,
            &json!({
                "type": "load_room",
                "username": "carol",
                "save_data": serde_json::to_value(save_data).unwrap(),
            }),
        );

        let to_carol = drain(&mut rx_c);
        let Outbound::LoadRoom { room_code } = &to_carol[0] else {
            panic!("expected load_room response");
        };
        let loaded = state
            .registry()
            .lookup(&RoomCode::from(room_code.as_str()))
            .unwrap();
        assert!(loaded.is_loaded());
        assert_eq!(loaded.member_names(), vec!["carol"]);
        assert_eq!(loaded.host_names(), vec!["carol"]);
    }

    #[tokio::test]
    async fn test_make_host_requires_host() {
        let mut state = ServerState::new();
        let (alice, _rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        let (bob, _rx_b) = connect(&mut state);
        let (carol, _rx_c) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );
        state.dispatch(
            carol,
            &json!({"type": "join_room", "username": "carol", "code": code}),
        );

        state.dispatch(bob, &json!({"type": "make_host", "username": "carol"}));
        let room = state.registry().lookup(&RoomCode::from(code.as_str())).unwrap();
        assert_eq!(room.host_names(), vec!["alice"]);

        state.dispatch(alice, &json!({"type": "make_host", "username": "carol"}));
        let room = state.registry().lookup(&RoomCode::from(code.as_str())).unwrap();
        assert_eq!(room.host_names(), vec!["alice", "carol"]);
    }

    #[tokio::test]
    async fn test_change_host_swaps_in_one_step() {
        let mut state = ServerState::new();
        let (alice, _rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        let (bob, mut rx_b) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );
        drain(&mut rx_b);

        state.dispatch(alice, &json!({"type": "change_host", "username": "bob"}));

        let room = state.registry().lookup(&RoomCode::from(code.as_str())).unwrap();
        assert_eq!(room.host_names(), vec!["bob"]);
        let to_bob = drain(&mut rx_b);
        assert_eq!(to_bob[0], Outbound::HostPromotion);
        assert_eq!(to_bob[1], Outbound::host_added("bob"));
        assert_eq!(to_bob[2], Outbound::host_removed("alice"));
    }

    #[tokio::test]
    async fn test_disconnect_cleans_up_room() {
        let mut state = ServerState::new();
        let (alice, _rx_a) = connect(&mut state);
        let code = create_room(&mut state, alice, "alice");
        let (bob, mut rx_b) = connect(&mut state);
        state.dispatch(
            bob,
            &json!({"type": "join_room", "username": "bob", "code": code}),
        );
        drain(&mut rx_b);

        state.disconnect(alice);

        // bob inherited the room and host status.
        let room = state.registry().lookup(&RoomCode::from(code.as_str())).unwrap();
        assert_eq!(room.host_names(), vec!["bob"]);
        assert!(state.member(alice).is_none());

        state.disconnect(bob);
        assert!(state.registry().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_message_type_is_dropped() {
        let mut state = ServerState::new();
        let (alice, mut rx) = connect(&mut state);
        create_room(&mut state, alice, "alice");
        drain(&mut rx);

        state.dispatch(alice, &json!({"type": "teleport", "to": "the moon"}));
        state.dispatch(alice, &json!({"type": "join_room"}));

        assert!(drain(&mut rx).is_empty());
        assert_eq!(state.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_custom_incoming_step_runs_after_defaults() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let mut server = RoomServer::new(cmd_rx);
        server.incoming_step(|state, conn, message| {
            if message["type"] == "ping" {
                if let Some(member) = state.member(conn) {
                    let _ = member.send(Outbound::RoomClosed);
                }
            }
        });
        let handle = tokio::spawn(server.run());

        let conn = ConnId::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        cmd_tx
            .send(ServerCommand::Connect { conn, mailbox: tx })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Inbound {
                conn,
                message: json!({"type": "ping"}),
            })
            .await
            .unwrap();
        drop(cmd_tx);
        handle.await.unwrap();

        assert_eq!(rx.try_recv().unwrap(), Outbound::RoomClosed);
    }
}
