//! Basic type definitions for the rooms server
//!
//! Provides newtype wrappers for type safety:
//! - `ConnId`: UUID-based unique connection identifier
//! - `RoomCode`: short alphanumeric room code with collision-free generation

use std::collections::HashSet;

use uuid::Uuid;

/// Default room code length when none is configured
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4. Usernames are only unique within a single room,
/// so connections need a process-wide key of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(pub Uuid);

impl ConnId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room code (alphanumeric, mixed case)
///
/// Identifies a live room. Generated against the set of currently
/// registered codes so a fresh code is always unique at allocation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Generate a code of `length` characters that is not in `existing`
    ///
    /// Draws uniformly from `[A-Za-z0-9]` and re-draws on collision.
    /// Terminates almost surely for any `length >= 1` and finite `existing`.
    pub fn generate(existing: &HashSet<String>, length: usize) -> Self {
        use rand::Rng;
        loop {
            let code: String = rand::thread_rng()
                .sample_iter(&rand::distributions::Alphanumeric)
                .take(length)
                .map(char::from)
                .collect();
            if !existing.contains(&code) {
                break Self(code);
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
