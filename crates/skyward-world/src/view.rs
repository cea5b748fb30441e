//! The read/write contract between the replication layer and a simulation.

use skyward_protocol::{ActorState, CollectableKind, EnemyKind, GroundClass, PlayerId};

/// Opaque reference to an avatar in a [`WorldView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerHandle(pub u32);

/// Opaque reference to a terrain block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroundHandle(pub u32);

/// Opaque reference to an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnemyHandle(pub u32);

/// Opaque reference to a collectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectableHandle(pub u32);

/// Everything needed to materialize a terrain block, locally or on a peer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSpawn {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub class: GroundClass,
}

/// Narrow view of the simulation that replication needs.
///
/// Handles are only valid between the create and destroy calls for the same
/// entity; accessors return `None` afterwards. The replication layer pairs
/// every handle with a wire id and tears both down together, so a `None`
/// here indicates a bug in the caller rather than a decodable peer message.
pub trait WorldView {
    // --- avatars ---
    fn spawn_player(&mut self, x: i64, y: i64) -> PlayerHandle;
    fn despawn_player(&mut self, player: PlayerHandle);
    fn player_position(&self, player: PlayerHandle) -> Option<(i64, i64)>;
    fn set_player_position(&mut self, player: PlayerHandle, x: i64, y: i64);
    fn player_state(&self, player: PlayerHandle) -> Option<ActorState>;
    fn set_player_state(&mut self, player: PlayerHandle, state: ActorState);
    fn player_direction(&self, player: PlayerHandle) -> Option<i8>;
    fn set_player_direction(&mut self, player: PlayerHandle, direction: i8);
    fn player_health(&self, player: PlayerHandle) -> Option<u8>;
    /// Apply damage; health saturates at zero.
    fn damage_player(&mut self, player: PlayerHandle, damage: i8);
    /// Set health to an absolute value (heals and buy-backs).
    fn set_player_health(&mut self, player: PlayerHandle, hp: u8);
    /// Credit a picked-up collectable to the avatar. Returns whether the
    /// item was actually consumed (a heart at full health is not).
    fn credit_collection(&mut self, player: PlayerHandle, kind: CollectableKind) -> bool;

    // --- terrain ---
    fn spawn_ground(&mut self, spawn: GroundSpawn) -> GroundHandle;
    fn despawn_ground(&mut self, ground: GroundHandle);
    fn ground_spawn(&self, ground: GroundHandle) -> Option<GroundSpawn>;
    fn set_ground_position(&mut self, ground: GroundHandle, x: i64, y: i64);

    // --- enemies ---
    fn spawn_enemy(&mut self, kind: EnemyKind, x: i64, y: i64) -> EnemyHandle;
    fn despawn_enemy(&mut self, enemy: EnemyHandle);
    fn enemy_kind(&self, enemy: EnemyHandle) -> Option<EnemyKind>;
    fn enemy_position(&self, enemy: EnemyHandle) -> Option<(i64, i64)>;
    fn set_enemy_position(&mut self, enemy: EnemyHandle, x: i64, y: i64);
    fn enemy_state(&self, enemy: EnemyHandle) -> Option<ActorState>;
    fn set_enemy_state(&mut self, enemy: EnemyHandle, state: ActorState);
    fn enemy_direction(&self, enemy: EnemyHandle) -> Option<i8>;
    fn set_enemy_direction(&mut self, enemy: EnemyHandle, direction: i8);
    /// Play out the death of an enemy that stays in the world as a corpse.
    fn kill_enemy(&mut self, enemy: EnemyHandle);

    // --- collectables ---
    fn spawn_collectable(&mut self, kind: CollectableKind, x: i64, y: i64) -> CollectableHandle;
    fn despawn_collectable(&mut self, collectable: CollectableHandle);
    fn collectable_kind(&self, collectable: CollectableHandle) -> Option<CollectableKind>;
    fn collectable_position(&self, collectable: CollectableHandle) -> Option<(i64, i64)>;

    // --- race ---
    fn set_race_distance(&mut self, distance: u16);
    fn race_distance(&self) -> u16;
    /// Record the finisher and reset the running race.
    fn record_winner(&mut self, winner: PlayerId, time_ms: u32);
    fn last_winner(&self) -> Option<(PlayerId, u32)>;
}
