//! Authoritative host session.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use skyward_net::{Connection, FrameConfig, Listener, TransportError};
use skyward_protocol::{
    CollectableId, DEFAULT_TCP_PORT, EnemyId, GroundId, MIN_BROADCAST_INTERVAL_MS, Message,
    PlayerId,
};
use skyward_world::{
    CollectableHandle, EnemyHandle, GroundHandle, PlayerHandle, START_POSITION, WorldView,
};
use tracing::{error, info, warn};

use crate::error::ReplicationError;
use crate::registry::EntityRegistry;
use crate::router::{Outcome, apply_as_host};
use crate::session::ReplicationSession;

/// Host-side session settings.
#[derive(Debug, Clone, Copy)]
pub struct HostConfig {
    /// Address the accept socket binds to.
    pub bind_addr: SocketAddr,
    /// Minimum delay between periodic position broadcasts.
    pub broadcast_interval: Duration,
    /// Connections beyond this are refused.
    pub max_peers: usize,
    pub frame: FrameConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_TCP_PORT)),
            broadcast_interval: Duration::from_millis(MIN_BROADCAST_INTERVAL_MS),
            max_peers: 8,
            frame: FrameConfig::default(),
        }
    }
}

/// The authoritative end of a session.
///
/// Owns identifier allocation and the entity lifecycle. Remote avatars are
/// keyed by their wire id in `peers`; the host's own avatar is always id 0
/// and has no connection. Everything happens inside [`HostSession::tick`],
/// driven by the caller's game loop.
pub struct HostSession<W: WorldView> {
    world: W,
    registry: EntityRegistry,
    listener: Listener,
    peers: BTreeMap<u8, Connection>,
    local_player: PlayerHandle,
    joins_allowed: bool,
    last_broadcast: Instant,
    config: HostConfig,
}

impl<W: WorldView> HostSession<W> {
    /// Bind the listener and spawn the host's own avatar as id 0.
    pub fn start(mut world: W, config: HostConfig) -> Result<Self, ReplicationError> {
        let listener = Listener::bind(config.bind_addr)?;
        let local_player = world.spawn_player(START_POSITION.0, START_POSITION.1);
        let mut registry = EntityRegistry::new();
        registry.players.bind(0, local_player);

        Ok(Self {
            world,
            registry,
            listener,
            peers: BTreeMap::new(),
            local_player,
            joins_allowed: true,
            last_broadcast: Instant::now(),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ReplicationError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn local_player(&self) -> PlayerHandle {
        self.local_player
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Gate for new connections. Once the match starts, latecomers are
    /// refused without a bootstrap.
    pub fn set_joins_allowed(&mut self, allowed: bool) {
        self.joins_allowed = allowed;
    }

    pub fn joins_allowed(&self) -> bool {
        self.joins_allowed
    }

    /// Run one host tick: accept joins, drain and route inbound traffic,
    /// emit the periodic position broadcast, flush outbound buffers.
    pub fn tick(&mut self) -> Result<(), ReplicationError> {
        self.accept_pending()?;
        self.pump_peers()?;

        if self.last_broadcast.elapsed() >= self.config.broadcast_interval {
            self.broadcast_positions();
            self.last_broadcast = Instant::now();
        }

        self.flush_peers();
        Ok(())
    }

    // --- joining ---

    fn accept_pending(&mut self) -> Result<(), ReplicationError> {
        while let Some(conn) = self.listener.poll_accept(self.config.frame)? {
            let peer_addr = conn.peer_addr();
            if !self.joins_allowed {
                // Dropping the connection closes it; no protocol-level reply.
                info!(%peer_addr, "join refused, session no longer accepts participants");
                continue;
            }
            if self.peers.len() >= self.config.max_peers {
                warn!(%peer_addr, max = self.config.max_peers, "join refused, session full");
                continue;
            }

            let id = self.registry.allocate_player_id()?;
            let handle = self.world.spawn_player(START_POSITION.0, START_POSITION.1);
            self.registry.players.bind(id.0 as u32, handle);

            // Everyone already present learns about the newcomer...
            let announce = self.describe_player(id)?;
            self.broadcast(&announce);

            // ...and the newcomer gets the full session state.
            self.peers.insert(id.0, conn);
            self.bootstrap(id)?;
            info!(%id, %peer_addr, "participant joined");
        }
        Ok(())
    }

    /// Send the complete session state to a fresh participant, in the fixed
    /// order the other side expects: its id first, then avatars, terrain,
    /// enemies and collectables.
    fn bootstrap(&mut self, newcomer: PlayerId) -> Result<(), ReplicationError> {
        let mut queue = vec![Message::AcceptAddPlayer { player: newcomer }];

        for (id, _) in self.registry.players.iter() {
            let id = PlayerId(id as u8);
            if id == newcomer {
                continue;
            }
            queue.push(self.describe_player(id)?);
        }
        for (id, _) in self.registry.grounds.iter() {
            queue.push(self.describe_ground(GroundId(id))?);
        }
        for (id, _) in self.registry.enemies.iter() {
            queue.push(self.describe_enemy(EnemyId(id))?);
        }
        for (id, _) in self.registry.collectables.iter() {
            queue.push(self.describe_collectable(CollectableId(id))?);
        }

        for message in &queue {
            self.send_to(newcomer, message)?;
        }
        Ok(())
    }

    // --- state snapshots for announcements ---

    fn describe_player(&self, id: PlayerId) -> Result<Message, ReplicationError> {
        let handle = self.registry.player(id)?;
        let (x, y) = self
            .world
            .player_position(handle)
            .ok_or(ReplicationError::UnknownPlayer(id))?;
        let state = self
            .world
            .player_state(handle)
            .ok_or(ReplicationError::UnknownPlayer(id))?;
        let direction = self
            .world
            .player_direction(handle)
            .ok_or(ReplicationError::UnknownPlayer(id))?;
        Ok(Message::AddPlayer {
            player: id,
            x,
            y,
            state,
            direction,
        })
    }

    fn describe_ground(&self, id: GroundId) -> Result<Message, ReplicationError> {
        let handle = self.registry.ground(id)?;
        let spawn = self
            .world
            .ground_spawn(handle)
            .ok_or(ReplicationError::UnknownGround(id))?;
        Ok(Message::AddGround {
            ground: id,
            x: spawn.x,
            y: spawn.y,
            width: spawn.width,
            height: spawn.height,
            class: spawn.class,
        })
    }

    fn describe_enemy(&self, id: EnemyId) -> Result<Message, ReplicationError> {
        let handle = self.registry.enemy(id)?;
        let missing = || ReplicationError::UnknownEnemy(id);
        let (x, y) = self.world.enemy_position(handle).ok_or_else(missing)?;
        let state = self.world.enemy_state(handle).ok_or_else(missing)?;
        let direction = self.world.enemy_direction(handle).ok_or_else(missing)?;
        let kind = self.world.enemy_kind(handle).ok_or_else(missing)?;
        Ok(Message::AddEnemy {
            enemy: id,
            x,
            y,
            state,
            direction,
            kind,
        })
    }

    fn describe_collectable(&self, id: CollectableId) -> Result<Message, ReplicationError> {
        let handle = self.registry.collectable(id)?;
        let missing = || ReplicationError::UnknownCollectable(id);
        let (x, y) = self.world.collectable_position(handle).ok_or_else(missing)?;
        let kind = self.world.collectable_kind(handle).ok_or_else(missing)?;
        Ok(Message::AddCollectable {
            collectable: id,
            x,
            y,
            kind,
        })
    }

    // --- inbound ---

    fn pump_peers(&mut self) -> Result<(), ReplicationError> {
        let mut inbound: Vec<(PlayerId, Message)> = Vec::new();
        let mut departed: Vec<PlayerId> = Vec::new();

        for (&raw_id, conn) in self.peers.iter_mut() {
            let sender = PlayerId(raw_id);
            match conn.poll_frames() {
                Ok(frames) => {
                    for payload in frames {
                        match Message::decode(&payload) {
                            Ok(message) => inbound.push((sender, message)),
                            Err(err) => {
                                // A garbled payload does not cost the peer
                                // its connection; framing isolates it.
                                error!(%sender, %err, "undecodable message, dropping");
                            }
                        }
                    }
                }
                Err(TransportError::Disconnected) => departed.push(sender),
                Err(err) => {
                    // One peer's broken byte stream must not take the
                    // session down for everyone else.
                    warn!(%sender, %err, "receive failure, dropping participant");
                    departed.push(sender);
                }
            }
        }

        for id in departed {
            self.remove_peer(id);
        }

        for (sender, message) in inbound {
            if !self.peers.contains_key(&sender.0) {
                // Sender disconnected in the same tick; its last words
                // would reference ids being torn down.
                continue;
            }
            match apply_as_host(&message, sender, &mut self.world, &mut self.registry)? {
                Outcome::Relay { exclude } => self.broadcast_except(exclude, &message),
                Outcome::Applied | Outcome::Rejected => {}
            }
        }
        Ok(())
    }

    /// Tear down a departed participant: connection, registry binding and
    /// avatar. Nothing is broadcast; the remaining participants simply stop
    /// hearing about the id.
    fn remove_peer(&mut self, id: PlayerId) {
        let Some(conn) = self.peers.remove(&id.0) else {
            return;
        };
        let pending = conn.pending_bytes();
        if pending > 0 {
            warn!(%id, pending, "dropping unsent bytes for departed participant");
        }
        if let Some(handle) = self.registry.players.unbind(id.0 as u32) {
            self.world.despawn_player(handle);
        }
        info!(%id, "participant left");
    }

    // --- outbound ---

    /// Periodic state push: the host's own avatar position plus every
    /// self-moving enemy. Static enemies never move, so their positions
    /// would be wasted bytes.
    fn broadcast_positions(&mut self) {
        if self.peers.is_empty() {
            return;
        }

        let mut updates = Vec::new();
        if let Some((x, y)) = self.world.player_position(self.local_player) {
            updates.push(Message::PlayerSetPos {
                player: PlayerId(0),
                x,
                y,
            });
        }
        for (id, handle) in self.registry.enemies.iter() {
            let Some(kind) = self.world.enemy_kind(handle) else {
                continue;
            };
            if !kind.is_mobile() {
                continue;
            }
            if let Some((x, y)) = self.world.enemy_position(handle) {
                updates.push(Message::EnemySetPos {
                    enemy: EnemyId(id),
                    x,
                    y,
                });
            }
        }

        for message in &updates {
            self.broadcast(message);
        }
    }

    fn broadcast(&mut self, message: &Message) {
        let payload = message.encode();
        for conn in self.peers.values_mut() {
            if let Err(err) = conn.queue_frame(&payload) {
                warn!(%err, kind = message.kind_name(), "frame not queued");
            }
        }
    }

    fn broadcast_except(&mut self, exclude: PlayerId, message: &Message) {
        let payload = message.encode();
        for (&raw_id, conn) in self.peers.iter_mut() {
            if raw_id == exclude.0 {
                continue;
            }
            if let Err(err) = conn.queue_frame(&payload) {
                warn!(%err, kind = message.kind_name(), "frame not queued");
            }
        }
    }

    fn send_to(&mut self, id: PlayerId, message: &Message) -> Result<(), ReplicationError> {
        let conn = self
            .peers
            .get_mut(&id.0)
            .ok_or(ReplicationError::UnknownPlayer(id))?;
        conn.queue_frame(&message.encode())?;
        Ok(())
    }

    fn flush_peers(&mut self) {
        let mut departed = Vec::new();
        for (&raw_id, conn) in self.peers.iter_mut() {
            match conn.flush() {
                Ok(()) => {}
                Err(TransportError::Disconnected) => departed.push(PlayerId(raw_id)),
                Err(err) => {
                    warn!(player = raw_id, %err, "flush failed");
                    departed.push(PlayerId(raw_id));
                }
            }
        }
        for id in departed {
            self.remove_peer(id);
        }
    }

    // --- announcement helpers shared with the session trait ---

    pub(crate) fn announce_ground(
        &mut self,
        ground: GroundHandle,
    ) -> Result<GroundId, ReplicationError> {
        let id = GroundId(self.registry.grounds.allocate());
        self.registry.grounds.bind(id.0, ground);
        let message = self.describe_ground(id)?;
        self.broadcast(&message);
        Ok(id)
    }

    pub(crate) fn ground_id(&self, ground: GroundHandle) -> Result<GroundId, ReplicationError> {
        self.registry
            .grounds
            .id_of(ground)
            .map(GroundId)
            .ok_or(ReplicationError::UnboundHandle { category: "ground" })
    }

    fn enemy_id(&self, enemy: EnemyHandle) -> Result<EnemyId, ReplicationError> {
        self.registry
            .enemies
            .id_of(enemy)
            .map(EnemyId)
            .ok_or(ReplicationError::UnboundHandle { category: "enemy" })
    }

    fn collectable_id(&self, collectable: CollectableHandle) -> Result<CollectableId, ReplicationError> {
        self.registry
            .collectables
            .id_of(collectable)
            .map(CollectableId)
            .ok_or(ReplicationError::UnboundHandle {
                category: "collectable",
            })
    }

    fn player_id(&self, player: PlayerHandle) -> Result<PlayerId, ReplicationError> {
        self.registry
            .players
            .id_of(player)
            .map(|id| PlayerId(id as u8))
            .ok_or(ReplicationError::UnboundHandle { category: "player" })
    }
}

impl<W: WorldView> ReplicationSession for HostSession<W> {
    fn is_host(&self) -> bool {
        true
    }

    fn notify_want_add_player(&mut self, _x: i64, _y: i64) -> Result<(), ReplicationError> {
        error!("extra local avatars are not supported yet");
        Ok(())
    }

    fn notify_state_changed(&mut self) -> Result<(), ReplicationError> {
        let state = self
            .world
            .player_state(self.local_player)
            .ok_or(ReplicationError::UnknownPlayer(PlayerId(0)))?;
        self.broadcast(&Message::PlayerChangeState {
            player: PlayerId(0),
            state,
        });
        Ok(())
    }

    fn notify_direction_changed(&mut self) -> Result<(), ReplicationError> {
        let direction = self
            .world
            .player_direction(self.local_player)
            .ok_or(ReplicationError::UnknownPlayer(PlayerId(0)))?;
        self.broadcast(&Message::PlayerHorizontalDir {
            player: PlayerId(0),
            direction,
        });
        Ok(())
    }

    fn notify_damage_taken(&mut self, damage: i8) -> Result<(), ReplicationError> {
        self.broadcast(&Message::PlayerTakeDamage {
            player: PlayerId(0),
            damage,
        });
        Ok(())
    }

    fn notify_healed(&mut self, new_hp: u8) -> Result<(), ReplicationError> {
        self.broadcast(&Message::PlayerHeal {
            player: PlayerId(0),
            new_hp,
        });
        Ok(())
    }

    fn notify_ground_added(&mut self, ground: GroundHandle) -> Result<(), ReplicationError> {
        self.announce_ground(ground)?;
        Ok(())
    }

    fn notify_ground_moved(&mut self, ground: GroundHandle) -> Result<(), ReplicationError> {
        let id = self.ground_id(ground)?;
        let spawn = self
            .world
            .ground_spawn(ground)
            .ok_or(ReplicationError::UnknownGround(id))?;
        self.broadcast(&Message::GroundSetPos {
            ground: id,
            x: spawn.x,
            y: spawn.y,
        });
        Ok(())
    }

    fn notify_ground_removed(&mut self, ground: GroundHandle) -> Result<(), ReplicationError> {
        let id = self.ground_id(ground)?;
        self.registry.grounds.unbind(id.0);
        self.broadcast(&Message::RemoveGround { ground: id });
        Ok(())
    }

    fn notify_enemy_added(&mut self, enemy: EnemyHandle) -> Result<(), ReplicationError> {
        let id = EnemyId(self.registry.enemies.allocate());
        self.registry.enemies.bind(id.0, enemy);
        let message = self.describe_enemy(id)?;
        self.broadcast(&message);
        Ok(())
    }

    fn notify_enemy_state_changed(&mut self, enemy: EnemyHandle) -> Result<(), ReplicationError> {
        let id = self.enemy_id(enemy)?;
        let state = self
            .world
            .enemy_state(enemy)
            .ok_or(ReplicationError::UnknownEnemy(id))?;
        self.broadcast(&Message::EnemyChangeState { enemy: id, state });
        Ok(())
    }

    fn notify_enemy_direction_changed(
        &mut self,
        enemy: EnemyHandle,
    ) -> Result<(), ReplicationError> {
        let id = self.enemy_id(enemy)?;
        let direction = self
            .world
            .enemy_direction(enemy)
            .ok_or(ReplicationError::UnknownEnemy(id))?;
        self.broadcast(&Message::EnemyHorizontalDir {
            enemy: id,
            direction,
        });
        Ok(())
    }

    fn notify_enemy_died(&mut self, enemy: EnemyHandle) -> Result<(), ReplicationError> {
        let id = self.enemy_id(enemy)?;
        self.broadcast(&Message::EnemyDie { enemy: id });
        Ok(())
    }

    fn notify_enemy_removed(&mut self, enemy: EnemyHandle) -> Result<(), ReplicationError> {
        let id = self.enemy_id(enemy)?;
        self.registry.enemies.unbind(id.0);
        self.broadcast(&Message::RemoveEnemy { enemy: id });
        Ok(())
    }

    fn notify_collectable_added(
        &mut self,
        collectable: CollectableHandle,
    ) -> Result<(), ReplicationError> {
        let id = CollectableId(self.registry.collectables.allocate());
        self.registry.collectables.bind(id.0, collectable);
        let message = self.describe_collectable(id)?;
        self.broadcast(&message);
        Ok(())
    }

    fn notify_collectable_collected(
        &mut self,
        collectable: CollectableHandle,
        player: PlayerHandle,
    ) -> Result<(), ReplicationError> {
        let id = self.collectable_id(collectable)?;
        let player = self.player_id(player)?;
        self.registry.collectables.unbind(id.0);
        self.broadcast(&Message::CollectableCollected {
            collectable: id,
            player,
        });
        Ok(())
    }

    fn notify_collectable_removed(
        &mut self,
        collectable: CollectableHandle,
    ) -> Result<(), ReplicationError> {
        let id = self.collectable_id(collectable)?;
        self.registry.collectables.unbind(id.0);
        self.broadcast(&Message::RemoveCollectable { collectable: id });
        Ok(())
    }

    fn notify_race_setup(&mut self, distance: u16) -> Result<(), ReplicationError> {
        self.world.set_race_distance(distance);
        self.broadcast(&Message::SetupRace { distance });
        Ok(())
    }

    fn notify_winner(
        &mut self,
        player: PlayerHandle,
        time_ms: u32,
    ) -> Result<(), ReplicationError> {
        let id = self.player_id(player)?;
        self.world.record_winner(id, time_ms);
        info!(%id, time = %crate::router::format_race_time(time_ms), "race won");
        self.broadcast(&Message::DeclareWinner {
            player: id,
            time_ms,
        });
        Ok(())
    }
}
