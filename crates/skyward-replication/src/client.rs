//! Participant session.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use skyward_net::{ConnectPolicy, Connection, FrameConfig};
use skyward_protocol::{
    CONNECT_ATTEMPTS, CONNECT_TIMEOUT_MS, DEFAULT_TCP_PORT, MIN_BROADCAST_INTERVAL_MS, Message,
    PlayerId,
};
use skyward_world::{
    CollectableHandle, EnemyHandle, GroundHandle, PlayerHandle, START_POSITION, WorldView,
};
use tracing::{debug, error, info};

use crate::error::ReplicationError;
use crate::registry::EntityRegistry;
use crate::router::apply_as_client;
use crate::session::ReplicationSession;

/// Client-side session settings.
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    pub server_addr: SocketAddr,
    pub connect: ConnectPolicy,
    /// Minimum delay between own-position updates to the host.
    pub send_interval: Duration,
    pub frame: FrameConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_TCP_PORT)),
            connect: ConnectPolicy {
                timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
                attempts: CONNECT_ATTEMPTS,
            },
            send_interval: Duration::from_millis(MIN_BROADCAST_INTERVAL_MS),
            frame: FrameConfig::default(),
        }
    }
}

/// The participant end of a session.
///
/// Mirrors whatever the host announces and reports back the locally
/// controlled avatar. Until `AcceptAddPlayer` arrives the avatar has no
/// wire id, so nothing about it is sent.
pub struct ClientSession<W: WorldView> {
    world: W,
    registry: EntityRegistry,
    conn: Connection,
    local_player: PlayerHandle,
    local_id: Option<PlayerId>,
    last_update: Instant,
    config: ClientConfig,
}

impl<W: WorldView> ClientSession<W> {
    /// Spawn the local avatar and dial the host. Connecting blocks, bounded
    /// by the configured per-attempt timeout and attempt count; every
    /// operation afterwards is non-blocking.
    pub fn connect(mut world: W, config: ClientConfig) -> Result<Self, ReplicationError> {
        let conn = Connection::connect(config.server_addr, config.connect, config.frame)?;
        let local_player = world.spawn_player(START_POSITION.0, START_POSITION.1);
        info!(addr = %config.server_addr, "connected to host");

        Ok(Self {
            world,
            registry: EntityRegistry::new(),
            conn,
            local_player,
            local_id: None,
            last_update: Instant::now(),
            config,
        })
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

    /// The id the host assigned to the local avatar, once accepted.
    pub fn local_id(&self) -> Option<PlayerId> {
        self.local_id
    }

    /// Run one client tick: push the own-position update if due, flush
    /// outbound, then drain and apply whatever the host sent.
    ///
    /// A transport-level disconnect is fatal: the host is gone and the
    /// session cannot continue. The error is handed to the caller, which
    /// decides how to leave the match.
    pub fn tick(&mut self) -> Result<(), ReplicationError> {
        if let Some(id) = self.local_id
            && self.last_update.elapsed() >= self.config.send_interval
            && let Some((x, y)) = self.world.player_position(self.local_player)
        {
            self.queue(&Message::PlayerSetPos { player: id, x, y })?;
            self.last_update = Instant::now();
        }

        self.conn.flush()?;

        for payload in self.conn.poll_frames()? {
            let message = match Message::decode(&payload) {
                Ok(message) => message,
                Err(err) => {
                    error!(%err, "undecodable message from host, dropping");
                    continue;
                }
            };
            if let Message::AcceptAddPlayer { player } = &message {
                self.local_id = Some(*player);
            }
            apply_as_client(
                &message,
                self.local_player,
                &mut self.world,
                &mut self.registry,
            )?;
        }
        Ok(())
    }

    fn queue(&mut self, message: &Message) -> Result<(), ReplicationError> {
        self.conn.queue_frame(&message.encode())?;
        Ok(())
    }

    /// Id of the local avatar, or a debug log if the host has not answered
    /// the join yet (updates before that have nothing to talk about).
    fn assigned_id(&self) -> Option<PlayerId> {
        if self.local_id.is_none() {
            debug!("no id assigned yet, notification skipped");
        }
        self.local_id
    }
}

impl<W: WorldView> ReplicationSession for ClientSession<W> {
    fn is_host(&self) -> bool {
        false
    }

    fn notify_want_add_player(&mut self, x: i64, y: i64) -> Result<(), ReplicationError> {
        self.queue(&Message::WantAddPlayer { x, y })
    }

    fn notify_state_changed(&mut self) -> Result<(), ReplicationError> {
        let Some(id) = self.assigned_id() else {
            return Ok(());
        };
        let state = self
            .world
            .player_state(self.local_player)
            .ok_or(ReplicationError::UnknownPlayer(id))?;
        self.queue(&Message::PlayerChangeState { player: id, state })
    }

    fn notify_direction_changed(&mut self) -> Result<(), ReplicationError> {
        let Some(id) = self.assigned_id() else {
            return Ok(());
        };
        let direction = self
            .world
            .player_direction(self.local_player)
            .ok_or(ReplicationError::UnknownPlayer(id))?;
        self.queue(&Message::PlayerHorizontalDir {
            player: id,
            direction,
        })
    }

    fn notify_damage_taken(&mut self, damage: i8) -> Result<(), ReplicationError> {
        let Some(id) = self.assigned_id() else {
            return Ok(());
        };
        self.queue(&Message::PlayerTakeDamage { player: id, damage })
    }

    fn notify_healed(&mut self, new_hp: u8) -> Result<(), ReplicationError> {
        let Some(id) = self.assigned_id() else {
            return Ok(());
        };
        self.queue(&Message::PlayerHeal { player: id, new_hp })
    }

    fn notify_ground_added(&mut self, _ground: GroundHandle) -> Result<(), ReplicationError> {
        self.reject_host_only("AddGround")
    }

    fn notify_ground_moved(&mut self, _ground: GroundHandle) -> Result<(), ReplicationError> {
        self.reject_host_only("GroundSetPos")
    }

    fn notify_ground_removed(&mut self, _ground: GroundHandle) -> Result<(), ReplicationError> {
        self.reject_host_only("RemoveGround")
    }

    fn notify_enemy_added(&mut self, _enemy: EnemyHandle) -> Result<(), ReplicationError> {
        self.reject_host_only("AddEnemy")
    }

    fn notify_enemy_state_changed(&mut self, _enemy: EnemyHandle) -> Result<(), ReplicationError> {
        self.reject_host_only("EnemyChangeState")
    }

    fn notify_enemy_direction_changed(
        &mut self,
        _enemy: EnemyHandle,
    ) -> Result<(), ReplicationError> {
        self.reject_host_only("EnemyHorizontalDir")
    }

    fn notify_enemy_died(&mut self, _enemy: EnemyHandle) -> Result<(), ReplicationError> {
        self.reject_host_only("EnemyDie")
    }

    fn notify_enemy_removed(&mut self, _enemy: EnemyHandle) -> Result<(), ReplicationError> {
        self.reject_host_only("RemoveEnemy")
    }

    fn notify_collectable_added(
        &mut self,
        _collectable: CollectableHandle,
    ) -> Result<(), ReplicationError> {
        self.reject_host_only("AddCollectable")
    }

    fn notify_collectable_collected(
        &mut self,
        _collectable: CollectableHandle,
        _player: PlayerHandle,
    ) -> Result<(), ReplicationError> {
        self.reject_host_only("CollectableCollected")
    }

    fn notify_collectable_removed(
        &mut self,
        _collectable: CollectableHandle,
    ) -> Result<(), ReplicationError> {
        self.reject_host_only("RemoveCollectable")
    }

    fn notify_race_setup(&mut self, _distance: u16) -> Result<(), ReplicationError> {
        self.reject_host_only("SetupRace")
    }

    fn notify_winner(
        &mut self,
        _player: PlayerHandle,
        _time_ms: u32,
    ) -> Result<(), ReplicationError> {
        self.reject_host_only("DeclareWinner")
    }
}

impl<W: WorldView> ClientSession<W> {
    fn reject_host_only(&self, kind: &str) -> Result<(), ReplicationError> {
        error!(kind, "only the host may originate this, ignored");
        Ok(())
    }
}
