//! Room registry
//!
//! Process-wide authority on which room codes are live. Owns every Room,
//! allocates codes through the collision-free generator, and reclaims
//! entries the moment a room runs out of members. Each registry owns its
//! own map, constructed fresh; nothing here is shared between instances.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::room::Room;
use crate::types::{RoomCode, DEFAULT_CODE_LENGTH};

/// Mapping from code to live Room
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    code_length: usize,
}

impl RoomRegistry {
    /// Create an empty registry using the default code length
    pub fn new() -> Self {
        Self::with_code_length(DEFAULT_CODE_LENGTH)
    }

    /// Create an empty registry with a configured code length
    pub fn with_code_length(code_length: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            code_length,
        }
    }

    /// Allocate a fresh room under a collision-free code
    ///
    /// The generator is handed the currently live code set, so the new
    /// code is unique against the registry at the moment of allocation.
    pub fn allocate(&mut self) -> RoomCode {
        let existing: HashSet<String> = self.rooms.keys().map(|c| c.0.clone()).collect();
        let code = RoomCode::generate(&existing, self.code_length);
        self.rooms.insert(code.clone(), Room::new(code.clone()));
        debug!("Allocated room {} ({} live)", code, self.rooms.len());
        code
    }

    /// Drop a room from the registry
    ///
    /// Callers release a room once it has no members left (or after a
    /// `room_closed` broadcast). The code becomes reusable afterwards.
    pub fn release(&mut self, code: &RoomCode) -> Option<Room> {
        let room = self.rooms.remove(code);
        if room.is_some() {
            debug!("Released room {} ({} live)", code, self.rooms.len());
        }
        room
    }

    pub fn lookup(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn lookup_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
