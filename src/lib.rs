//! Room-based WebSocket Server Library
//!
//! Clients join named groups identified by a short random code, exchange
//! structured JSON messages, and a subset of members (hosts) holds
//! elevated privileges: closing the room, promoting and demoting hosts,
//! and removing members. Built with tokio-tungstenite using the Actor
//! pattern for state management.
//!
//! # Features
//! - Room creation with collision-free short codes
//! - Room joining with duplicate-identity rejection
//! - Host set with promote/demote/hand-over, never leaving a non-empty
//!   room host-less
//! - Membership broadcasts (`users_update`, `hosts_update`)
//! - Room save/load snapshots with pass-through extension fields
//! - Custom incoming and outgoing pipeline steps, run after the defaults
//! - Disconnection teardown
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `RoomServer` is the central actor owning the member table and the
//!   room registry; every room mutation is serialized on its task
//! - Each connection runs an inbound loop (socket → pipeline) and an
//!   outbound loop (mailbox → socket)
//! - Member mailboxes are unbounded, so broadcasts never suspend and each
//!   pipeline step completes atomically
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use wsrooms::{handle_connection, OutgoingSteps, RoomServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     let mut server = RoomServer::new(cmd_rx);
//!     server.incoming_step(|state, conn, message| {
//!         // react to message types the default pipeline does not know
//!         let _ = (state, conn, message);
//!     });
//!     tokio::spawn(server.run());
//!
//!     let outgoing = OutgoingSteps::new().share();
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         let outgoing = outgoing.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx, outgoing));
//!     }
//! }
//! ```

pub mod error;
pub mod handler;
pub mod member;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use error::{AppError, SendError};
pub use handler::{handle_connection, OutgoingStep, OutgoingSteps, SharedOutgoingSteps};
pub use member::{Mailbox, Member};
pub use message::{Inbound, Outbound, Snapshot, UserStatus};
pub use registry::RoomRegistry;
pub use room::Room;
pub use server::{IncomingStep, RoomServer, ServerCommand, ServerState};
pub use types::{ConnId, RoomCode, DEFAULT_CODE_LENGTH};
