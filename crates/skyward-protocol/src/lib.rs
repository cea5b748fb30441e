//! Wire protocol for Skyward multiplayer sessions.
//!
//! Defines the closed set of replication messages exchanged between a host
//! and its participants, the entity identifier newtypes they carry, and the
//! hand-specified binary encoding (one tag byte followed by fixed-width
//! big-endian scalar fields per kind).

mod ids;
mod kinds;
mod message;
mod wire;

pub use ids::{CollectableId, EnemyId, GroundId, PlayerId};
pub use kinds::{ActorState, BuyableKind, CollectableKind, EnemyKind, GroundClass, GroundKind};
pub use message::{Message, WireError};

/// TCP port the host listens on by default.
pub const DEFAULT_TCP_PORT: u16 = 2307;

/// Port reserved for a future unreliable datagram channel. Nothing binds it.
pub const RESERVED_DATAGRAM_PORT: u16 = 2309;

/// Minimum interval between periodic position broadcasts, in milliseconds.
pub const MIN_BROADCAST_INTERVAL_MS: u64 = 10;

/// Per-attempt timeout when connecting to a host, in milliseconds.
pub const CONNECT_TIMEOUT_MS: u64 = 1000;

/// Number of connection attempts before giving up.
pub const CONNECT_ATTEMPTS: u32 = 10;

/// Hearts a freshly spawned avatar starts with.
pub const SPAWN_HEALTH: u8 = 5;
