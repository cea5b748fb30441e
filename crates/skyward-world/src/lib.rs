//! Replicated simulation state.
//!
//! Holds the four entity categories a session keeps in sync (avatars,
//! terrain, enemies, collectables) plus the race bookkeeping. The
//! replication layer talks to it exclusively through the [`WorldView`]
//! trait, so a game can substitute its own simulation.

mod arena;
mod view;
mod world;

pub use arena::Arena;
pub use view::{
    CollectableHandle, EnemyHandle, GroundHandle, GroundSpawn, PlayerHandle, WorldView,
};
pub use world::World;

/// Where freshly spawned avatars appear.
pub const START_POSITION: (i64, i64) = (1080, 700);
