//! Replication error types.

use skyward_net::TransportError;
use skyward_protocol::{CollectableId, EnemyId, GroundId, PlayerId, WireError};

/// Errors surfaced by a replication session.
///
/// The `Unknown*` variants mean a peer referenced an identifier this side
/// has no binding for. That is an internal-consistency violation, not a
/// recoverable glitch: continuing would let the worlds silently diverge, so
/// the session loop stops and hands the error to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    #[error("no binding for {0}")]
    UnknownPlayer(PlayerId),

    #[error("no binding for {0}")]
    UnknownGround(GroundId),

    #[error("no binding for {0}")]
    UnknownEnemy(EnemyId),

    #[error("no binding for {0}")]
    UnknownCollectable(CollectableId),

    /// A local handle was passed to a notify call before it was announced.
    #[error("{category} handle has no wire identifier")]
    UnboundHandle { category: &'static str },

    /// All 256 avatar identifiers are taken.
    #[error("player identifier space exhausted")]
    PlayerIdsExhausted,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("session i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
