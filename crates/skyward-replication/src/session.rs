//! The capability surface gameplay code talks to.

use skyward_world::{CollectableHandle, EnemyHandle, GroundHandle, PlayerHandle};

use crate::error::ReplicationError;

/// What a game can ask of its replication session, whichever role it runs.
///
/// Gameplay code holds a `&mut dyn ReplicationSession` (or a generic) and
/// reports local events through it; it never needs to know whether it is
/// hosting, participating, or playing alone. Calls that only the host may
/// originate are logged and ignored on a participant, and vice versa, so
/// shared gameplay code can notify unconditionally.
pub trait ReplicationSession {
    /// Whether this session is the authority of the match.
    fn is_host(&self) -> bool;

    /// Ask for an additional locally-controlled avatar. Reserved; no
    /// current host honors it.
    fn notify_want_add_player(&mut self, x: i64, y: i64) -> Result<(), ReplicationError>;

    // Events about the locally-controlled avatar. The session reads the
    // current value from its world, so apply the change before notifying.
    fn notify_state_changed(&mut self) -> Result<(), ReplicationError>;
    fn notify_direction_changed(&mut self) -> Result<(), ReplicationError>;
    fn notify_damage_taken(&mut self, damage: i8) -> Result<(), ReplicationError>;
    fn notify_healed(&mut self, new_hp: u8) -> Result<(), ReplicationError>;

    // Entity lifecycle and updates; host authority.
    fn notify_ground_added(&mut self, ground: GroundHandle) -> Result<(), ReplicationError>;
    fn notify_ground_moved(&mut self, ground: GroundHandle) -> Result<(), ReplicationError>;
    fn notify_ground_removed(&mut self, ground: GroundHandle) -> Result<(), ReplicationError>;
    fn notify_enemy_added(&mut self, enemy: EnemyHandle) -> Result<(), ReplicationError>;
    fn notify_enemy_state_changed(&mut self, enemy: EnemyHandle) -> Result<(), ReplicationError>;
    fn notify_enemy_direction_changed(
        &mut self,
        enemy: EnemyHandle,
    ) -> Result<(), ReplicationError>;
    fn notify_enemy_died(&mut self, enemy: EnemyHandle) -> Result<(), ReplicationError>;
    fn notify_enemy_removed(&mut self, enemy: EnemyHandle) -> Result<(), ReplicationError>;
    fn notify_collectable_added(
        &mut self,
        collectable: CollectableHandle,
    ) -> Result<(), ReplicationError>;
    fn notify_collectable_collected(
        &mut self,
        collectable: CollectableHandle,
        player: PlayerHandle,
    ) -> Result<(), ReplicationError>;
    fn notify_collectable_removed(
        &mut self,
        collectable: CollectableHandle,
    ) -> Result<(), ReplicationError>;

    // Race lifecycle; host authority.
    fn notify_race_setup(&mut self, distance: u16) -> Result<(), ReplicationError>;
    fn notify_winner(
        &mut self,
        player: PlayerHandle,
        time_ms: u32,
    ) -> Result<(), ReplicationError>;
}

/// Null session for single-player runs.
///
/// Stands in where gameplay expects a session but no match is running;
/// every notification succeeds and goes nowhere. The local simulation is
/// the only authority, so `is_host` answers true.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSession;

impl ReplicationSession for NoopSession {
    fn is_host(&self) -> bool {
        true
    }

    fn notify_want_add_player(&mut self, _x: i64, _y: i64) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_state_changed(&mut self) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_direction_changed(&mut self) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_damage_taken(&mut self, _damage: i8) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_healed(&mut self, _new_hp: u8) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_ground_added(&mut self, _ground: GroundHandle) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_ground_moved(&mut self, _ground: GroundHandle) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_ground_removed(&mut self, _ground: GroundHandle) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_enemy_added(&mut self, _enemy: EnemyHandle) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_enemy_state_changed(&mut self, _enemy: EnemyHandle) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_enemy_direction_changed(
        &mut self,
        _enemy: EnemyHandle,
    ) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_enemy_died(&mut self, _enemy: EnemyHandle) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_enemy_removed(&mut self, _enemy: EnemyHandle) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_collectable_added(
        &mut self,
        _collectable: CollectableHandle,
    ) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_collectable_collected(
        &mut self,
        _collectable: CollectableHandle,
        _player: PlayerHandle,
    ) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_collectable_removed(
        &mut self,
        _collectable: CollectableHandle,
    ) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_race_setup(&mut self, _distance: u16) -> Result<(), ReplicationError> {
        Ok(())
    }

    fn notify_winner(
        &mut self,
        _player: PlayerHandle,
        _time_ms: u32,
    ) -> Result<(), ReplicationError> {
        Ok(())
    }
}
