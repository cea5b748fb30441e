//! Runnable Skyward session.
//!
//! `skyward-demo host` serves a small demo level; `skyward-demo join
//! <address>` mirrors it. Both run the same fixed-cadence tick loop the
//! replication layer is built for.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use skyward_config::{CliArgs, Config, Role};
use skyward_net::{ConnectPolicy, FrameConfig};
use skyward_protocol::{CollectableKind, EnemyKind, GroundClass};
use skyward_replication::{
    ClientConfig, ClientSession, HostConfig, HostSession, ReplicationError, ReplicationSession,
};
use skyward_world::{GroundSpawn, World, WorldView};
use tracing::{error, info};

const TICK: Duration = Duration::from_millis(16);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(&args);

    skyward_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );

    match args.role {
        Role::Host => run_host(&config),
        Role::Join { .. } => run_client(&config),
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skyward")
}

fn run_host(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr: SocketAddr = format!(
        "{}:{}",
        config.network.bind_address, config.network.tcp_port
    )
    .parse()?;

    let mut session = HostSession::start(
        World::new(),
        HostConfig {
            bind_addr,
            broadcast_interval: Duration::from_millis(config.network.broadcast_interval_ms),
            max_peers: config.network.max_peers,
            frame: FrameConfig::default(),
        },
    )?;
    build_demo_level(&mut session)?;
    info!(addr = %session.local_addr()?, "hosting session");

    loop {
        session.tick()?;
        std::thread::sleep(TICK);
    }
}

/// A floor, a hazard strip, a patrolling walker and a coin: just enough
/// entities that a joiner can watch every category arrive.
fn build_demo_level(session: &mut HostSession<World>) -> Result<(), ReplicationError> {
    let floor = session.world_mut().spawn_ground(GroundSpawn {
        x: 0,
        y: 840,
        width: 3000,
        height: 60,
        class: GroundClass::Solid,
    });
    session.notify_ground_added(floor)?;

    let hazard = session.world_mut().spawn_ground(GroundSpawn {
        x: 1200,
        y: 840,
        width: 200,
        height: 60,
        class: GroundClass::Bad,
    });
    session.notify_ground_added(hazard)?;

    let walker = session.world_mut().spawn_enemy(EnemyKind::Walker, 600, 800);
    session.notify_enemy_added(walker)?;

    let coin = session
        .world_mut()
        .spawn_collectable(CollectableKind::Coin, 400, 800);
    session.notify_collectable_added(coin)?;
    Ok(())
}

fn run_client(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = (
        config.network.server_address.as_str(),
        config.network.tcp_port,
    )
        .to_socket_addrs()?
        .next()
        .ok_or("server address did not resolve")?;

    let mut session = ClientSession::connect(
        World::new(),
        ClientConfig {
            server_addr,
            connect: ConnectPolicy {
                timeout: Duration::from_millis(config.network.connect_timeout_ms),
                attempts: config.network.connect_attempts,
            },
            send_interval: Duration::from_millis(config.network.broadcast_interval_ms),
            frame: FrameConfig::default(),
        },
    )?;

    loop {
        if let Err(err) = session.tick() {
            error!(%err, "session ended");
            return Err(err.into());
        }
        std::thread::sleep(TICK);
    }
}
