//! Role-aware message application.
//!
//! Two pure functions, one per role, take an inbound message and decide
//! what happens: mutate the world, relay to the other participants, or
//! drop. Keeping them free of socket state makes every routing rule
//! testable without a connection.

use skyward_protocol::Message;
use skyward_world::{PlayerHandle, WorldView};
use tracing::{debug, error, info};

use crate::error::ReplicationError;
use crate::registry::EntityRegistry;

/// What the session loop should do after a message was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Applied locally; nothing further to send.
    Applied,
    /// Applied locally; forward to every participant except `exclude`.
    Relay { exclude: skyward_protocol::PlayerId },
    /// Dropped. Wrong-role traffic is logged and ignored, never answered
    /// with a disconnect.
    Rejected,
}

/// Route a message that arrived at the host from the participant `sender`.
///
/// Participants may only talk about their own avatar; each accepted update
/// is applied to the authoritative world and relayed to everyone else.
pub fn apply_as_host<W: WorldView>(
    message: &Message,
    sender: skyward_protocol::PlayerId,
    world: &mut W,
    registry: &mut EntityRegistry,
) -> Result<Outcome, ReplicationError> {
    match message {
        Message::WantAddPlayer { .. } => {
            // Placeholder for a hotseat-over-network feature.
            error!("WantAddPlayer is not supported yet, dropping");
            Ok(Outcome::Rejected)
        }
        Message::PlayerSetPos { player, x, y } => {
            let handle = registry.player(*player)?;
            world.set_player_position(handle, *x, *y);
            Ok(Outcome::Relay { exclude: sender })
        }
        Message::PlayerChangeState { player, state } => {
            let handle = registry.player(*player)?;
            world.set_player_state(handle, *state);
            Ok(Outcome::Relay { exclude: sender })
        }
        Message::PlayerHorizontalDir { player, direction } => {
            let handle = registry.player(*player)?;
            world.set_player_direction(handle, *direction);
            Ok(Outcome::Relay { exclude: sender })
        }
        Message::PlayerTakeDamage { player, damage } => {
            let handle = registry.player(*player)?;
            world.damage_player(handle, *damage);
            Ok(Outcome::Relay { exclude: sender })
        }
        Message::PlayerHeal { player, new_hp } => {
            let handle = registry.player(*player)?;
            world.set_player_health(handle, *new_hp);
            Ok(Outcome::Relay { exclude: sender })
        }
        other => {
            error!(
                kind = other.kind_name(),
                %sender,
                "host-only message received from a participant, dropping"
            );
            Ok(Outcome::Rejected)
        }
    }
}

/// Route a message that arrived at a participant from the host.
///
/// `local_player` is the handle of the locally-controlled avatar; it gets
/// bound to its wire id when `AcceptAddPlayer` arrives.
pub fn apply_as_client<W: WorldView>(
    message: &Message,
    local_player: PlayerHandle,
    world: &mut W,
    registry: &mut EntityRegistry,
) -> Result<Outcome, ReplicationError> {
    match message {
        Message::WantAddPlayer { .. } => {
            error!("WantAddPlayer received by a participant, dropping");
            Ok(Outcome::Rejected)
        }
        Message::AddPlayer {
            player,
            x,
            y,
            state,
            direction,
        } => {
            let handle = world.spawn_player(*x, *y);
            world.set_player_state(handle, *state);
            world.set_player_direction(handle, *direction);
            registry.players.bind(player.0 as u32, handle);
            debug!(%player, "avatar mirrored");
            Ok(Outcome::Applied)
        }
        Message::AcceptAddPlayer { player } => {
            registry.players.bind(player.0 as u32, local_player);
            info!(%player, "joined session");
            Ok(Outcome::Applied)
        }
        Message::PlayerSetPos { player, x, y } => {
            let handle = registry.player(*player)?;
            world.set_player_position(handle, *x, *y);
            Ok(Outcome::Applied)
        }
        Message::PlayerChangeState { player, state } => {
            let handle = registry.player(*player)?;
            world.set_player_state(handle, *state);
            Ok(Outcome::Applied)
        }
        Message::PlayerHorizontalDir { player, direction } => {
            let handle = registry.player(*player)?;
            world.set_player_direction(handle, *direction);
            Ok(Outcome::Applied)
        }
        Message::PlayerTakeDamage { player, damage } => {
            let handle = registry.player(*player)?;
            world.damage_player(handle, *damage);
            Ok(Outcome::Applied)
        }
        Message::PlayerHeal { player, new_hp } => {
            let handle = registry.player(*player)?;
            world.set_player_health(handle, *new_hp);
            Ok(Outcome::Applied)
        }
        Message::AddGround {
            ground,
            x,
            y,
            width,
            height,
            class,
        } => {
            let handle = world.spawn_ground(skyward_world::GroundSpawn {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                class: *class,
            });
            registry.grounds.bind(ground.0, handle);
            Ok(Outcome::Applied)
        }
        Message::GroundSetPos { ground, x, y } => {
            let handle = registry.ground(*ground)?;
            world.set_ground_position(handle, *x, *y);
            Ok(Outcome::Applied)
        }
        Message::RemoveGround { ground } => {
            // Unbind first so no identifier ever dangles over a dead handle.
            let handle = registry
                .grounds
                .unbind(ground.0)
                .ok_or(ReplicationError::UnknownGround(*ground))?;
            world.despawn_ground(handle);
            Ok(Outcome::Applied)
        }
        Message::AddEnemy {
            enemy,
            x,
            y,
            state,
            direction,
            kind,
        } => {
            let handle = world.spawn_enemy(*kind, *x, *y);
            world.set_enemy_state(handle, *state);
            world.set_enemy_direction(handle, *direction);
            registry.enemies.bind(enemy.0, handle);
            Ok(Outcome::Applied)
        }
        Message::EnemySetPos { enemy, x, y } => {
            let handle = registry.enemy(*enemy)?;
            world.set_enemy_position(handle, *x, *y);
            Ok(Outcome::Applied)
        }
        Message::EnemyChangeState { enemy, state } => {
            let handle = registry.enemy(*enemy)?;
            world.set_enemy_state(handle, *state);
            Ok(Outcome::Applied)
        }
        Message::EnemyHorizontalDir { enemy, direction } => {
            let handle = registry.enemy(*enemy)?;
            world.set_enemy_direction(handle, *direction);
            Ok(Outcome::Applied)
        }
        Message::EnemyDie { enemy } => {
            let handle = registry.enemy(*enemy)?;
            world.kill_enemy(handle);
            Ok(Outcome::Applied)
        }
        Message::RemoveEnemy { enemy } => {
            let handle = registry
                .enemies
                .unbind(enemy.0)
                .ok_or(ReplicationError::UnknownEnemy(*enemy))?;
            world.despawn_enemy(handle);
            Ok(Outcome::Applied)
        }
        Message::AddCollectable {
            collectable,
            x,
            y,
            kind,
        } => {
            let handle = world.spawn_collectable(*kind, *x, *y);
            registry.collectables.bind(collectable.0, handle);
            Ok(Outcome::Applied)
        }
        Message::CollectableCollected {
            collectable,
            player,
        } => {
            let handle = registry
                .collectables
                .unbind(collectable.0)
                .ok_or(ReplicationError::UnknownCollectable(*collectable))?;
            let player_handle = registry.player(*player)?;
            if let Some(kind) = world.collectable_kind(handle)
                && !world.credit_collection(player_handle, kind)
            {
                debug!(%collectable, %player, "collectable removed without effect");
            }
            world.despawn_collectable(handle);
            Ok(Outcome::Applied)
        }
        Message::RemoveCollectable { collectable } => {
            // The host may have announced a collection for this id in the
            // same burst; a second removal for it is not an error.
            match registry.collectables.unbind(collectable.0) {
                Some(handle) => world.despawn_collectable(handle),
                None => debug!(%collectable, "removal for an already-gone collectable"),
            }
            Ok(Outcome::Applied)
        }
        Message::SetupRace { distance } => {
            world.set_race_distance(*distance);
            info!(distance, "race started");
            Ok(Outcome::Applied)
        }
        Message::DeclareWinner { player, time_ms } => {
            world.record_winner(*player, *time_ms);
            info!(%player, time = %format_race_time(*time_ms), "race won");
            Ok(Outcome::Applied)
        }
    }
}

/// Render a race time as `m:ss:mmm`.
pub(crate) fn format_race_time(ms: u32) -> String {
    format!("{}:{:02}:{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyward_protocol::{
        ActorState, CollectableId, CollectableKind, EnemyId, EnemyKind, GroundClass, GroundId,
        Message, PlayerId, SPAWN_HEALTH,
    };
    use skyward_world::World;

    fn host_with_two_players() -> (World, EntityRegistry, PlayerHandle, PlayerHandle) {
        let mut world = World::new();
        let mut registry = EntityRegistry::new();
        let own = world.spawn_player(0, 0);
        registry.players.bind(0, own);
        let remote = world.spawn_player(10, 10);
        registry.players.bind(1, remote);
        (world, registry, own, remote)
    }

    #[test]
    fn host_applies_and_relays_excluding_the_sender() {
        let (mut world, mut registry, _own, remote) = host_with_two_players();
        let message = Message::PlayerSetPos {
            player: PlayerId(1),
            x: 55,
            y: 66,
        };
        let outcome = apply_as_host(&message, PlayerId(1), &mut world, &mut registry).unwrap();
        assert_eq!(
            outcome,
            Outcome::Relay {
                exclude: PlayerId(1)
            }
        );
        assert_eq!(world.player_position(remote), Some((55, 66)));
    }

    #[test]
    fn host_applies_damage_before_relaying() {
        let (mut world, mut registry, _own, remote) = host_with_two_players();
        let message = Message::PlayerTakeDamage {
            player: PlayerId(1),
            damage: 2,
        };
        apply_as_host(&message, PlayerId(1), &mut world, &mut registry).unwrap();
        assert_eq!(world.player_health(remote), Some(SPAWN_HEALTH - 2));
    }

    #[test]
    fn host_drops_host_only_messages_without_error() {
        let (mut world, mut registry, _, _) = host_with_two_players();
        let message = Message::RemoveGround {
            ground: GroundId(0),
        };
        let outcome = apply_as_host(&message, PlayerId(1), &mut world, &mut registry).unwrap();
        assert_eq!(outcome, Outcome::Rejected);
    }

    #[test]
    fn host_rejects_want_add_player() {
        let (mut world, mut registry, _, _) = host_with_two_players();
        let message = Message::WantAddPlayer { x: 0, y: 0 };
        let outcome = apply_as_host(&message, PlayerId(1), &mut world, &mut registry).unwrap();
        assert_eq!(outcome, Outcome::Rejected);
    }

    #[test]
    fn host_reports_unknown_player_id_as_fatal() {
        let (mut world, mut registry, _, _) = host_with_two_players();
        let message = Message::PlayerSetPos {
            player: PlayerId(9),
            x: 0,
            y: 0,
        };
        let err = apply_as_host(&message, PlayerId(1), &mut world, &mut registry).unwrap_err();
        assert!(matches!(err, ReplicationError::UnknownPlayer(PlayerId(9))));
    }

    fn fresh_client() -> (World, EntityRegistry, PlayerHandle) {
        let mut world = World::new();
        let local = world.spawn_player(0, 0);
        (world, EntityRegistry::new(), local)
    }

    #[test]
    fn accept_binds_the_local_avatar() {
        let (mut world, mut registry, local) = fresh_client();
        let message = Message::AcceptAddPlayer { player: PlayerId(3) };
        apply_as_client(&message, local, &mut world, &mut registry).unwrap();
        assert_eq!(registry.player(PlayerId(3)).unwrap(), local);
    }

    #[test]
    fn client_mirrors_announced_entities() {
        let (mut world, mut registry, local) = fresh_client();
        let ground = Message::AddGround {
            ground: GroundId(0),
            x: 0,
            y: 500,
            width: 800,
            height: 20,
            class: GroundClass::Solid,
        };
        let enemy = Message::AddEnemy {
            enemy: EnemyId(0),
            x: 100,
            y: 480,
            state: ActorState::Walk,
            direction: 1,
            kind: EnemyKind::Walker,
        };
        apply_as_client(&ground, local, &mut world, &mut registry).unwrap();
        apply_as_client(&enemy, local, &mut world, &mut registry).unwrap();

        assert_eq!(world.ground_count(), 1);
        assert_eq!(world.enemy_count(), 1);
        let handle = registry.enemy(EnemyId(0)).unwrap();
        assert_eq!(world.enemy_state(handle), Some(ActorState::Walk));
    }

    #[test]
    fn removal_clears_registry_and_world() {
        let (mut world, mut registry, local) = fresh_client();
        let add = Message::AddEnemy {
            enemy: EnemyId(2),
            x: 0,
            y: 0,
            state: ActorState::Idle,
            direction: 0,
            kind: EnemyKind::Shooter,
        };
        apply_as_client(&add, local, &mut world, &mut registry).unwrap();
        let remove = Message::RemoveEnemy { enemy: EnemyId(2) };
        apply_as_client(&remove, local, &mut world, &mut registry).unwrap();

        assert_eq!(world.enemy_count(), 0);
        assert!(registry.enemy(EnemyId(2)).is_err());
    }

    #[test]
    fn collection_credits_the_player_and_removes_the_item() {
        let (mut world, mut registry, local) = fresh_client();
        apply_as_client(
            &Message::AcceptAddPlayer { player: PlayerId(1) },
            local,
            &mut world,
            &mut registry,
        )
        .unwrap();
        apply_as_client(
            &Message::AddCollectable {
                collectable: CollectableId(0),
                x: 5,
                y: 5,
                kind: CollectableKind::Coin,
            },
            local,
            &mut world,
            &mut registry,
        )
        .unwrap();

        let message = Message::CollectableCollected {
            collectable: CollectableId(0),
            player: PlayerId(1),
        };
        apply_as_client(&message, local, &mut world, &mut registry).unwrap();

        assert_eq!(world.player_coins(local), Some(1));
        assert_eq!(world.collectable_count(), 0);
        assert!(registry.collectable(CollectableId(0)).is_err());
    }

    #[test]
    fn stale_collectable_removal_is_tolerated() {
        let (mut world, mut registry, local) = fresh_client();
        let message = Message::RemoveCollectable {
            collectable: CollectableId(7),
        };
        let outcome = apply_as_client(&message, local, &mut world, &mut registry).unwrap();
        assert_eq!(outcome, Outcome::Applied);
    }

    #[test]
    fn winner_updates_race_state() {
        let (mut world, mut registry, local) = fresh_client();
        apply_as_client(
            &Message::SetupRace { distance: 900 },
            local,
            &mut world,
            &mut registry,
        )
        .unwrap();
        assert_eq!(world.race_distance(), 900);

        apply_as_client(
            &Message::DeclareWinner {
                player: PlayerId(0),
                time_ms: 61_005,
            },
            local,
            &mut world,
            &mut registry,
        )
        .unwrap();
        assert_eq!(world.race_distance(), 0);
        assert_eq!(world.last_winner(), Some((PlayerId(0), 61_005)));
    }

    #[test]
    fn race_time_formatting() {
        assert_eq!(format_race_time(61_005), "1:01:005");
        assert_eq!(format_race_time(999), "0:00:999");
        assert_eq!(format_race_time(600_000), "10:00:000");
    }
}
