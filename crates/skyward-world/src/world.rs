//! Default [`WorldView`] implementation backed by slot arenas.

use skyward_protocol::{ActorState, CollectableKind, EnemyKind, PlayerId, SPAWN_HEALTH};
use tracing::debug;

use crate::arena::Arena;
use crate::view::{
    CollectableHandle, EnemyHandle, GroundHandle, GroundSpawn, PlayerHandle, WorldView,
};

#[derive(Debug)]
struct PlayerData {
    x: i64,
    y: i64,
    state: ActorState,
    direction: i8,
    health: u8,
    coins: u32,
}

#[derive(Debug)]
struct EnemyData {
    kind: EnemyKind,
    x: i64,
    y: i64,
    state: ActorState,
    direction: i8,
}

#[derive(Debug)]
struct CollectableData {
    kind: CollectableKind,
    x: i64,
    y: i64,
}

/// In-memory simulation state.
#[derive(Debug, Default)]
pub struct World {
    players: Arena<PlayerData>,
    grounds: Arena<GroundSpawn>,
    enemies: Arena<EnemyData>,
    collectables: Arena<CollectableData>,
    race_distance: u16,
    last_winner: Option<(PlayerId, u32)>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn ground_count(&self) -> usize {
        self.grounds.len()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn collectable_count(&self) -> usize {
        self.collectables.len()
    }

    /// Coins the avatar has picked up so far.
    pub fn player_coins(&self, player: PlayerHandle) -> Option<u32> {
        Some(self.players.get(player.0)?.coins)
    }
}

impl WorldView for World {
    fn spawn_player(&mut self, x: i64, y: i64) -> PlayerHandle {
        PlayerHandle(self.players.insert(PlayerData {
            x,
            y,
            state: ActorState::Idle,
            direction: 0,
            health: SPAWN_HEALTH,
            coins: 0,
        }))
    }

    fn despawn_player(&mut self, player: PlayerHandle) {
        if self.players.remove(player.0).is_none() {
            debug!(handle = player.0, "despawn of unknown player ignored");
        }
    }

    fn player_position(&self, player: PlayerHandle) -> Option<(i64, i64)> {
        self.players.get(player.0).map(|p| (p.x, p.y))
    }

    fn set_player_position(&mut self, player: PlayerHandle, x: i64, y: i64) {
        if let Some(p) = self.players.get_mut(player.0) {
            p.x = x;
            p.y = y;
        }
    }

    fn player_state(&self, player: PlayerHandle) -> Option<ActorState> {
        self.players.get(player.0).map(|p| p.state)
    }

    fn set_player_state(&mut self, player: PlayerHandle, state: ActorState) {
        if let Some(p) = self.players.get_mut(player.0) {
            p.state = state;
        }
    }

    fn player_direction(&self, player: PlayerHandle) -> Option<i8> {
        self.players.get(player.0).map(|p| p.direction)
    }

    fn set_player_direction(&mut self, player: PlayerHandle, direction: i8) {
        if let Some(p) = self.players.get_mut(player.0) {
            p.direction = direction;
        }
    }

    fn player_health(&self, player: PlayerHandle) -> Option<u8> {
        self.players.get(player.0).map(|p| p.health)
    }

    fn damage_player(&mut self, player: PlayerHandle, damage: i8) {
        if let Some(p) = self.players.get_mut(player.0) {
            p.health = p.health.saturating_sub(damage.max(0) as u8);
            if p.health == 0 {
                p.state = ActorState::Die;
            }
        }
    }

    fn set_player_health(&mut self, player: PlayerHandle, hp: u8) {
        if let Some(p) = self.players.get_mut(player.0) {
            p.health = hp;
        }
    }

    fn credit_collection(&mut self, player: PlayerHandle, kind: CollectableKind) -> bool {
        let Some(p) = self.players.get_mut(player.0) else {
            return false;
        };
        match kind {
            CollectableKind::Coin => {
                p.coins += 1;
                true
            }
            CollectableKind::Heart => {
                if p.health < SPAWN_HEALTH {
                    p.health += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn spawn_ground(&mut self, spawn: GroundSpawn) -> GroundHandle {
        GroundHandle(self.grounds.insert(spawn))
    }

    fn despawn_ground(&mut self, ground: GroundHandle) {
        if self.grounds.remove(ground.0).is_none() {
            debug!(handle = ground.0, "despawn of unknown ground ignored");
        }
    }

    fn ground_spawn(&self, ground: GroundHandle) -> Option<GroundSpawn> {
        self.grounds.get(ground.0).copied()
    }

    fn set_ground_position(&mut self, ground: GroundHandle, x: i64, y: i64) {
        if let Some(g) = self.grounds.get_mut(ground.0) {
            g.x = x;
            g.y = y;
        }
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, x: i64, y: i64) -> EnemyHandle {
        EnemyHandle(self.enemies.insert(EnemyData {
            kind,
            x,
            y,
            state: ActorState::Idle,
            direction: 0,
        }))
    }

    fn despawn_enemy(&mut self, enemy: EnemyHandle) {
        if self.enemies.remove(enemy.0).is_none() {
            debug!(handle = enemy.0, "despawn of unknown enemy ignored");
        }
    }

    fn enemy_kind(&self, enemy: EnemyHandle) -> Option<EnemyKind> {
        self.enemies.get(enemy.0).map(|e| e.kind)
    }

    fn enemy_position(&self, enemy: EnemyHandle) -> Option<(i64, i64)> {
        self.enemies.get(enemy.0).map(|e| (e.x, e.y))
    }

    fn set_enemy_position(&mut self, enemy: EnemyHandle, x: i64, y: i64) {
        if let Some(e) = self.enemies.get_mut(enemy.0) {
            e.x = x;
            e.y = y;
        }
    }

    fn enemy_state(&self, enemy: EnemyHandle) -> Option<ActorState> {
        self.enemies.get(enemy.0).map(|e| e.state)
    }

    fn set_enemy_state(&mut self, enemy: EnemyHandle, state: ActorState) {
        if let Some(e) = self.enemies.get_mut(enemy.0) {
            e.state = state;
        }
    }

    fn enemy_direction(&self, enemy: EnemyHandle) -> Option<i8> {
        self.enemies.get(enemy.0).map(|e| e.direction)
    }

    fn set_enemy_direction(&mut self, enemy: EnemyHandle, direction: i8) {
        if let Some(e) = self.enemies.get_mut(enemy.0) {
            e.direction = direction;
        }
    }

    fn kill_enemy(&mut self, enemy: EnemyHandle) {
        if let Some(e) = self.enemies.get_mut(enemy.0) {
            e.state = ActorState::Die;
            e.direction = 0;
        }
    }

    fn spawn_collectable(&mut self, kind: CollectableKind, x: i64, y: i64) -> CollectableHandle {
        CollectableHandle(self.collectables.insert(CollectableData { kind, x, y }))
    }

    fn despawn_collectable(&mut self, collectable: CollectableHandle) {
        if self.collectables.remove(collectable.0).is_none() {
            debug!(handle = collectable.0, "despawn of unknown collectable ignored");
        }
    }

    fn collectable_kind(&self, collectable: CollectableHandle) -> Option<CollectableKind> {
        self.collectables.get(collectable.0).map(|c| c.kind)
    }

    fn collectable_position(&self, collectable: CollectableHandle) -> Option<(i64, i64)> {
        self.collectables.get(collectable.0).map(|c| (c.x, c.y))
    }

    fn set_race_distance(&mut self, distance: u16) {
        self.race_distance = distance;
    }

    fn race_distance(&self) -> u16 {
        self.race_distance
    }

    fn record_winner(&mut self, winner: PlayerId, time_ms: u32) {
        self.last_winner = Some((winner, time_ms));
        // The race is over; a distance of zero means none is running.
        self.race_distance = 0;
    }

    fn last_winner(&self) -> Option<(PlayerId, u32)> {
        self.last_winner
    }
}
