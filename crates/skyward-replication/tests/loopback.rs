//! End-to-end session tests over loopback sockets.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use skyward_net::{ConnectPolicy, Connection, FrameConfig, TransportError};
use skyward_protocol::{
    ActorState, CollectableKind, EnemyKind, GroundClass, GroundId, Message, PlayerId,
    SPAWN_HEALTH,
};
use skyward_replication::{
    ClientConfig, ClientSession, HostConfig, HostSession, ReplicationError, ReplicationSession,
};
use skyward_world::{GroundSpawn, World, WorldView};

fn start_host() -> HostSession<World> {
    HostSession::start(
        World::new(),
        HostConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            broadcast_interval: Duration::from_millis(5),
            ..HostConfig::default()
        },
    )
    .unwrap()
}

fn client_config(addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        server_addr: addr,
        connect: ConnectPolicy {
            timeout: Duration::from_millis(500),
            attempts: 3,
        },
        send_interval: Duration::from_millis(5),
        frame: FrameConfig::default(),
    }
}

fn join(host: &HostSession<World>) -> ClientSession<World> {
    let addr = host.local_addr().unwrap();
    ClientSession::connect(World::new(), client_config(addr)).unwrap()
}

/// Run a few rounds of host and client ticks so queued traffic settles.
fn pump(host: &mut HostSession<World>, clients: &mut [&mut ClientSession<World>]) {
    for _ in 0..40 {
        host.tick().unwrap();
        for client in clients.iter_mut() {
            client.tick().unwrap();
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn demo_level(host: &mut HostSession<World>) {
    let solid = host.world_mut().spawn_ground(GroundSpawn {
        x: 0,
        y: 800,
        width: 2000,
        height: 40,
        class: GroundClass::Solid,
    });
    host.notify_ground_added(solid).unwrap();

    let portal = host.world_mut().spawn_ground(GroundSpawn {
        x: 500,
        y: 760,
        width: 40,
        height: 80,
        class: GroundClass::Portal {
            dest_x: 1500,
            dest_y: 700,
        },
    });
    host.notify_ground_added(portal).unwrap();

    let walker = host.world_mut().spawn_enemy(EnemyKind::Walker, 300, 760);
    host.notify_enemy_added(walker).unwrap();

    let coin = host
        .world_mut()
        .spawn_collectable(CollectableKind::Coin, 420, 740);
    host.notify_collectable_added(coin).unwrap();
}

#[test]
fn bootstrap_delivers_the_whole_session_state() {
    let mut host = start_host();
    demo_level(&mut host);

    let mut client = join(&host);
    pump(&mut host, &mut [&mut client]);

    assert_eq!(client.local_id(), Some(PlayerId(1)));
    // Own avatar plus the host's.
    assert_eq!(client.world().player_count(), 2);
    assert_eq!(client.world().ground_count(), 2);
    assert_eq!(client.world().enemy_count(), 1);
    assert_eq!(client.world().collectable_count(), 1);

    // Kind-specific ground payload survives the trip.
    let portal = client.registry().ground(GroundId(1)).unwrap();
    let spawn = client.world().ground_spawn(portal).unwrap();
    assert_eq!(
        spawn.class,
        GroundClass::Portal {
            dest_x: 1500,
            dest_y: 700
        }
    );
}

#[test]
fn second_joiner_sees_every_avatar_and_is_announced_to_the_first() {
    let mut host = start_host();
    let mut first = join(&host);
    pump(&mut host, &mut [&mut first]);

    let mut second = join(&host);
    pump(&mut host, &mut [&mut first, &mut second]);

    assert_eq!(second.local_id(), Some(PlayerId(2)));
    // Second sees host, first and itself; first learned about second.
    assert_eq!(second.world().player_count(), 3);
    assert_eq!(first.world().player_count(), 3);
    assert_eq!(host.peer_count(), 2);
}

#[test]
fn damage_reported_by_a_client_reaches_everyone() {
    let mut host = start_host();
    let mut reporter = join(&host);
    let mut observer = join(&host);
    pump(&mut host, &mut [&mut reporter, &mut observer]);

    let avatar = reporter.local_player();
    reporter.world_mut().damage_player(avatar, 1);
    reporter.notify_damage_taken(1).unwrap();
    pump(&mut host, &mut [&mut reporter, &mut observer]);

    let reporter_id = reporter.local_id().unwrap();
    let on_host = host.registry().player(reporter_id).unwrap();
    assert_eq!(host.world().player_health(on_host), Some(SPAWN_HEALTH - 1));

    let on_observer = observer.registry().player(reporter_id).unwrap();
    assert_eq!(
        observer.world().player_health(on_observer),
        Some(SPAWN_HEALTH - 1)
    );
}

#[test]
fn relayed_updates_skip_the_originator() {
    let mut host = HostSession::start(
        World::new(),
        HostConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            // Long enough that no periodic broadcast fires mid-test.
            broadcast_interval: Duration::from_secs(60),
            ..HostConfig::default()
        },
    )
    .unwrap();
    let addr = host.local_addr().unwrap();

    let policy = ConnectPolicy {
        timeout: Duration::from_millis(500),
        attempts: 3,
    };
    let mut sender = Connection::connect(addr, policy, FrameConfig::default()).unwrap();
    let mut bystander = Connection::connect(addr, policy, FrameConfig::default()).unwrap();

    let mut settle = |host: &mut HostSession<World>| {
        for _ in 0..40 {
            host.tick().unwrap();
            std::thread::sleep(Duration::from_millis(2));
        }
    };
    settle(&mut host);

    // Swallow the bootstrap traffic on both raw connections.
    let drain = |conn: &mut Connection| -> Vec<Message> {
        let mut messages = Vec::new();
        for _ in 0..20 {
            for payload in conn.poll_frames().unwrap() {
                messages.push(Message::decode(&payload).unwrap());
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        messages
    };
    drain(&mut sender);
    drain(&mut bystander);

    let update = Message::PlayerHorizontalDir {
        player: PlayerId(1),
        direction: -1,
    };
    sender.queue_frame(&update.encode()).unwrap();
    sender.flush().unwrap();
    settle(&mut host);

    // Host applied it to its world...
    let handle = host.registry().player(PlayerId(1)).unwrap();
    assert_eq!(host.world().player_direction(handle), Some(-1));

    // ...the other participant got the relay, the originator did not.
    let to_bystander = drain(&mut bystander);
    assert!(to_bystander.contains(&update));
    let to_sender = drain(&mut sender);
    assert!(!to_sender.contains(&update));
}

#[test]
fn ground_ids_are_reused_smallest_first() {
    let mut host = start_host();
    let mut handles = Vec::new();
    for i in 0..3 {
        let handle = host.world_mut().spawn_ground(GroundSpawn {
            x: i * 100,
            y: 800,
            width: 80,
            height: 20,
            class: GroundClass::Solid,
        });
        host.notify_ground_added(handle).unwrap();
        handles.push(handle);
    }

    host.notify_ground_removed(handles[1]).unwrap();
    host.world_mut().despawn_ground(handles[1]);

    let replacement = host.world_mut().spawn_ground(GroundSpawn {
        x: 900,
        y: 800,
        width: 80,
        height: 20,
        class: GroundClass::Bad,
    });
    host.notify_ground_added(replacement).unwrap();

    // With {0, 2} live the freed id 1 is reused.
    assert_eq!(host.registry().ground(GroundId(1)).unwrap(), replacement);
}

#[test]
fn departed_player_ids_are_reused() {
    let mut host = start_host();
    let mut first = join(&host);
    pump(&mut host, &mut [&mut first]);
    assert_eq!(first.local_id(), Some(PlayerId(1)));

    drop(first);
    for _ in 0..100 {
        host.tick().unwrap();
        if host.peer_count() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(host.peer_count(), 0);
    // Registry and world both forget the avatar.
    assert!(host.registry().player(PlayerId(1)).is_err());
    assert_eq!(host.world().player_count(), 1);

    let mut replacement = join(&host);
    pump(&mut host, &mut [&mut replacement]);
    assert_eq!(replacement.local_id(), Some(PlayerId(1)));
}

#[test]
fn client_sees_host_shutdown_as_fatal() {
    let mut host = start_host();
    let mut client = join(&host);
    pump(&mut host, &mut [&mut client]);

    drop(host);

    let mut outcome = None;
    for _ in 0..100 {
        match client.tick() {
            Ok(()) => std::thread::sleep(Duration::from_millis(2)),
            Err(err) => {
                outcome = Some(err);
                break;
            }
        }
    }
    assert!(matches!(
        outcome,
        Some(ReplicationError::Transport(TransportError::Disconnected))
    ));
}

#[test]
fn late_connections_are_refused_once_joins_close() {
    let mut host = start_host();
    host.set_joins_allowed(false);

    // TCP accepts from the backlog, so the dial itself succeeds; the host
    // then drops the connection without a bootstrap.
    let mut late = join(&host);
    let mut outcome = None;
    for _ in 0..100 {
        host.tick().unwrap();
        match late.tick() {
            Ok(()) => std::thread::sleep(Duration::from_millis(2)),
            Err(err) => {
                outcome = Some(err);
                break;
            }
        }
    }
    assert!(matches!(
        outcome,
        Some(ReplicationError::Transport(TransportError::Disconnected))
    ));
    assert_eq!(host.peer_count(), 0);
    assert!(late.local_id().is_none());
}

#[test]
fn a_corrupt_peer_is_dropped_without_ending_the_session() {
    let mut host = start_host();
    let mut healthy = join(&host);
    pump(&mut host, &mut [&mut healthy]);
    assert_eq!(host.peer_count(), 1);

    let mut rogue = std::net::TcpStream::connect(host.local_addr().unwrap()).unwrap();
    for _ in 0..100 {
        host.tick().unwrap();
        if host.peer_count() == 2 {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(host.peer_count(), 2);

    // A length prefix far beyond the frame limit.
    rogue.write_all(&u32::MAX.to_le_bytes()).unwrap();
    rogue.flush().unwrap();

    // Every tick must keep succeeding; only the offender departs.
    for _ in 0..100 {
        host.tick().unwrap();
        if host.peer_count() == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(host.peer_count(), 1);

    // The remaining participant is still served.
    let avatar = host.local_player();
    host.world_mut().set_player_state(avatar, ActorState::Walk);
    host.notify_state_changed().unwrap();
    pump(&mut host, &mut [&mut healthy]);
    let mirror = healthy.registry().player(PlayerId(0)).unwrap();
    assert_eq!(healthy.world().player_state(mirror), Some(ActorState::Walk));
}

#[test]
fn updates_apply_in_send_order() {
    let mut host = start_host();
    let mut client = join(&host);
    pump(&mut host, &mut [&mut client]);

    let avatar = host.local_player();
    host.world_mut().set_player_state(avatar, ActorState::Walk);
    host.notify_state_changed().unwrap();
    host.world_mut().set_player_state(avatar, ActorState::Jump);
    host.notify_state_changed().unwrap();
    host.notify_race_setup(1200).unwrap();
    host.notify_winner(avatar, 95_000).unwrap();
    pump(&mut host, &mut [&mut client]);

    let mirror = client.registry().player(PlayerId(0)).unwrap();
    assert_eq!(client.world().player_state(mirror), Some(ActorState::Jump));
    assert_eq!(client.world().race_distance(), 0);
    assert_eq!(client.world().last_winner(), Some((PlayerId(0), 95_000)));
}
