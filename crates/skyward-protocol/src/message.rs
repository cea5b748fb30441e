//! The replication message set and its binary codec.

use tracing::debug;

use crate::ids::{CollectableId, EnemyId, GroundId, PlayerId};
use crate::kinds::{ActorState, BuyableKind, CollectableKind, EnemyKind, GroundClass, GroundKind};
use crate::wire::{Reader, Writer};

/// Errors produced while decoding a message payload.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The payload was empty; there is not even a tag byte.
    #[error("empty payload, missing tag byte")]
    Empty,

    /// The tag byte does not name any known message kind.
    #[error("unknown message tag {0}")]
    UnknownTag(u8),

    /// The payload ended before the named field could be read.
    #[error("message truncated while reading field `{field}`")]
    Truncated { field: &'static str },

    /// A kind/state byte holds a value outside its enum.
    #[error("invalid {what} value {value}")]
    InvalidValue { what: &'static str, value: u8 },
}

/// A single replication message.
///
/// The set is closed: both sides must agree on exactly these kinds and
/// layouts. Tags run in declaration order from 0 (`WantAddPlayer`) to 21
/// (`DeclareWinner`); all multi-byte scalars travel big-endian.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Client asks the host to spawn an additional avatar. Reserved for a
    /// local-multiplayer feature that was never finished; hosts reject it.
    WantAddPlayer { x: i64, y: i64 },
    /// Host announces an avatar, either during bootstrap or when a new
    /// participant joins.
    AddPlayer {
        player: PlayerId,
        x: i64,
        y: i64,
        state: ActorState,
        direction: i8,
    },
    /// First message of the bootstrap: tells the new participant which id
    /// its locally-controlled avatar was assigned.
    AcceptAddPlayer { player: PlayerId },
    PlayerSetPos { player: PlayerId, x: i64, y: i64 },
    PlayerChangeState { player: PlayerId, state: ActorState },
    PlayerHorizontalDir { player: PlayerId, direction: i8 },
    PlayerTakeDamage { player: PlayerId, damage: i8 },
    PlayerHeal { player: PlayerId, new_hp: u8 },
    /// Host announces a terrain block. Portals and buyable buttons carry
    /// kind-specific trailing fields inside `class`.
    AddGround {
        ground: GroundId,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        class: GroundClass,
    },
    GroundSetPos { ground: GroundId, x: i64, y: i64 },
    RemoveGround { ground: GroundId },
    AddEnemy {
        enemy: EnemyId,
        x: i64,
        y: i64,
        state: ActorState,
        direction: i8,
        kind: EnemyKind,
    },
    EnemySetPos { enemy: EnemyId, x: i64, y: i64 },
    EnemyChangeState { enemy: EnemyId, state: ActorState },
    EnemyHorizontalDir { enemy: EnemyId, direction: i8 },
    EnemyDie { enemy: EnemyId },
    RemoveEnemy { enemy: EnemyId },
    AddCollectable {
        collectable: CollectableId,
        x: i64,
        y: i64,
        kind: CollectableKind,
    },
    /// Host credits a collectable to the player that picked it up.
    CollectableCollected {
        collectable: CollectableId,
        player: PlayerId,
    },
    RemoveCollectable { collectable: CollectableId },
    SetupRace { distance: u16 },
    DeclareWinner { player: PlayerId, time_ms: u32 },
}

impl Message {
    /// Wire tag of this message kind.
    pub fn tag(&self) -> u8 {
        match self {
            Self::WantAddPlayer { .. } => 0,
            Self::AddPlayer { .. } => 1,
            Self::AcceptAddPlayer { .. } => 2,
            Self::PlayerSetPos { .. } => 3,
            Self::PlayerChangeState { .. } => 4,
            Self::PlayerHorizontalDir { .. } => 5,
            Self::PlayerTakeDamage { .. } => 6,
            Self::PlayerHeal { .. } => 7,
            Self::AddGround { .. } => 8,
            Self::GroundSetPos { .. } => 9,
            Self::RemoveGround { .. } => 10,
            Self::AddEnemy { .. } => 11,
            Self::EnemySetPos { .. } => 12,
            Self::EnemyChangeState { .. } => 13,
            Self::EnemyHorizontalDir { .. } => 14,
            Self::EnemyDie { .. } => 15,
            Self::RemoveEnemy { .. } => 16,
            Self::AddCollectable { .. } => 17,
            Self::CollectableCollected { .. } => 18,
            Self::RemoveCollectable { .. } => 19,
            Self::SetupRace { .. } => 20,
            Self::DeclareWinner { .. } => 21,
        }
    }

    /// Human-readable kind name for log lines.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::WantAddPlayer { .. } => "WantAddPlayer",
            Self::AddPlayer { .. } => "AddPlayer",
            Self::AcceptAddPlayer { .. } => "AcceptAddPlayer",
            Self::PlayerSetPos { .. } => "PlayerSetPos",
            Self::PlayerChangeState { .. } => "PlayerChangeState",
            Self::PlayerHorizontalDir { .. } => "PlayerHorizontalDir",
            Self::PlayerTakeDamage { .. } => "PlayerTakeDamage",
            Self::PlayerHeal { .. } => "PlayerHeal",
            Self::AddGround { .. } => "AddGround",
            Self::GroundSetPos { .. } => "GroundSetPos",
            Self::RemoveGround { .. } => "RemoveGround",
            Self::AddEnemy { .. } => "AddEnemy",
            Self::EnemySetPos { .. } => "EnemySetPos",
            Self::EnemyChangeState { .. } => "EnemyChangeState",
            Self::EnemyHorizontalDir { .. } => "EnemyHorizontalDir",
            Self::EnemyDie { .. } => "EnemyDie",
            Self::RemoveEnemy { .. } => "RemoveEnemy",
            Self::AddCollectable { .. } => "AddCollectable",
            Self::CollectableCollected { .. } => "CollectableCollected",
            Self::RemoveCollectable { .. } => "RemoveCollectable",
            Self::SetupRace { .. } => "SetupRace",
            Self::DeclareWinner { .. } => "DeclareWinner",
        }
    }

    /// Encode into the tag-plus-fields byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new(self.tag());
        match self {
            Self::WantAddPlayer { x, y } => {
                w.i64(*x);
                w.i64(*y);
            }
            Self::AddPlayer {
                player,
                x,
                y,
                state,
                direction,
            } => {
                w.u8(player.0);
                w.i64(*x);
                w.i64(*y);
                w.u8(*state as u8);
                w.i8(*direction);
            }
            Self::AcceptAddPlayer { player } => {
                w.u8(player.0);
            }
            Self::PlayerSetPos { player, x, y } => {
                w.u8(player.0);
                w.i64(*x);
                w.i64(*y);
            }
            Self::PlayerChangeState { player, state } => {
                w.u8(player.0);
                w.u8(*state as u8);
            }
            Self::PlayerHorizontalDir { player, direction } => {
                w.u8(player.0);
                w.i8(*direction);
            }
            Self::PlayerTakeDamage { player, damage } => {
                w.u8(player.0);
                w.i8(*damage);
            }
            Self::PlayerHeal { player, new_hp } => {
                w.u8(player.0);
                w.u8(*new_hp);
            }
            Self::AddGround {
                ground,
                x,
                y,
                width,
                height,
                class,
            } => {
                w.u32(ground.0);
                w.i64(*x);
                w.i64(*y);
                w.u32(*width);
                w.u32(*height);
                w.u8(class.kind() as u8);
                match class {
                    GroundClass::Portal { dest_x, dest_y } => {
                        w.i64(*dest_x);
                        w.i64(*dest_y);
                    }
                    GroundClass::BuyableButton { item } => {
                        w.u8(*item as u8);
                    }
                    _ => {}
                }
            }
            Self::GroundSetPos { ground, x, y } => {
                w.u32(ground.0);
                w.i64(*x);
                w.i64(*y);
            }
            Self::RemoveGround { ground } => {
                w.u32(ground.0);
            }
            Self::AddEnemy {
                enemy,
                x,
                y,
                state,
                direction,
                kind,
            } => {
                w.u32(enemy.0);
                w.i64(*x);
                w.i64(*y);
                w.u8(*state as u8);
                w.i8(*direction);
                w.u8(*kind as u8);
            }
            Self::EnemySetPos { enemy, x, y } => {
                w.u32(enemy.0);
                w.i64(*x);
                w.i64(*y);
            }
            Self::EnemyChangeState { enemy, state } => {
                w.u32(enemy.0);
                w.u8(*state as u8);
            }
            Self::EnemyHorizontalDir { enemy, direction } => {
                w.u32(enemy.0);
                w.i8(*direction);
            }
            Self::EnemyDie { enemy } => {
                w.u32(enemy.0);
            }
            Self::RemoveEnemy { enemy } => {
                w.u32(enemy.0);
            }
            Self::AddCollectable {
                collectable,
                x,
                y,
                kind,
            } => {
                w.u32(collectable.0);
                w.i64(*x);
                w.i64(*y);
                w.u8(*kind as u8);
            }
            Self::CollectableCollected {
                collectable,
                player,
            } => {
                w.u32(collectable.0);
                w.u8(player.0);
            }
            Self::RemoveCollectable { collectable } => {
                w.u32(collectable.0);
            }
            Self::SetupRace { distance } => {
                w.u16(*distance);
            }
            Self::DeclareWinner { player, time_ms } => {
                w.u8(player.0);
                w.u32(*time_ms);
            }
        }
        w.finish()
    }

    /// Decode a payload produced by [`Message::encode`].
    ///
    /// Unconsumed trailing bytes are tolerated: the frame boundary
    /// re-synchronizes the stream, so the mismatch is logged and the
    /// message returned anyway.
    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let (&tag, rest) = payload.split_first().ok_or(WireError::Empty)?;
        let mut r = Reader::new(rest);

        let message = match tag {
            0 => Self::WantAddPlayer {
                x: r.i64("pos_x")?,
                y: r.i64("pos_y")?,
            },
            1 => Self::AddPlayer {
                player: PlayerId(r.u8("player_id")?),
                x: r.i64("pos_x")?,
                y: r.i64("pos_y")?,
                state: read_state(&mut r)?,
                direction: r.i8("direction")?,
            },
            2 => Self::AcceptAddPlayer {
                player: PlayerId(r.u8("player_id")?),
            },
            3 => Self::PlayerSetPos {
                player: PlayerId(r.u8("player_id")?),
                x: r.i64("pos_x")?,
                y: r.i64("pos_y")?,
            },
            4 => Self::PlayerChangeState {
                player: PlayerId(r.u8("player_id")?),
                state: read_state(&mut r)?,
            },
            5 => Self::PlayerHorizontalDir {
                player: PlayerId(r.u8("player_id")?),
                direction: r.i8("direction")?,
            },
            6 => Self::PlayerTakeDamage {
                player: PlayerId(r.u8("player_id")?),
                damage: r.i8("damage")?,
            },
            7 => Self::PlayerHeal {
                player: PlayerId(r.u8("player_id")?),
                new_hp: r.u8("new_hp")?,
            },
            8 => {
                let ground = GroundId(r.u32("ground_id")?);
                let x = r.i64("pos_x")?;
                let y = r.i64("pos_y")?;
                let width = r.u32("width")?;
                let height = r.u32("height")?;
                let kind_byte = r.u8("ground_kind")?;
                let kind = GroundKind::from_u8(kind_byte).ok_or(WireError::InvalidValue {
                    what: "ground kind",
                    value: kind_byte,
                })?;
                let class = match kind {
                    GroundKind::Solid => GroundClass::Solid,
                    GroundKind::Bad => GroundClass::Bad,
                    GroundKind::Portal => GroundClass::Portal {
                        dest_x: r.i64("portal_dest_x")?,
                        dest_y: r.i64("portal_dest_y")?,
                    },
                    GroundKind::NetworkButton => GroundClass::NetworkButton,
                    GroundKind::StartButton => GroundClass::StartButton,
                    GroundKind::BuyableButton => {
                        let item_byte = r.u8("buyable_kind")?;
                        let item =
                            BuyableKind::from_u8(item_byte).ok_or(WireError::InvalidValue {
                                what: "buyable kind",
                                value: item_byte,
                            })?;
                        GroundClass::BuyableButton { item }
                    }
                    GroundKind::EnemyBorder => GroundClass::EnemyBorder,
                };
                Self::AddGround {
                    ground,
                    x,
                    y,
                    width,
                    height,
                    class,
                }
            }
            9 => Self::GroundSetPos {
                ground: GroundId(r.u32("ground_id")?),
                x: r.i64("pos_x")?,
                y: r.i64("pos_y")?,
            },
            10 => Self::RemoveGround {
                ground: GroundId(r.u32("ground_id")?),
            },
            11 => {
                let enemy = EnemyId(r.u32("enemy_id")?);
                let x = r.i64("pos_x")?;
                let y = r.i64("pos_y")?;
                let state = read_state(&mut r)?;
                let direction = r.i8("direction")?;
                let kind_byte = r.u8("enemy_kind")?;
                let kind = EnemyKind::from_u8(kind_byte).ok_or(WireError::InvalidValue {
                    what: "enemy kind",
                    value: kind_byte,
                })?;
                Self::AddEnemy {
                    enemy,
                    x,
                    y,
                    state,
                    direction,
                    kind,
                }
            }
            12 => Self::EnemySetPos {
                enemy: EnemyId(r.u32("enemy_id")?),
                x: r.i64("pos_x")?,
                y: r.i64("pos_y")?,
            },
            13 => Self::EnemyChangeState {
                enemy: EnemyId(r.u32("enemy_id")?),
                state: read_state(&mut r)?,
            },
            14 => Self::EnemyHorizontalDir {
                enemy: EnemyId(r.u32("enemy_id")?),
                direction: r.i8("direction")?,
            },
            15 => Self::EnemyDie {
                enemy: EnemyId(r.u32("enemy_id")?),
            },
            16 => Self::RemoveEnemy {
                enemy: EnemyId(r.u32("enemy_id")?),
            },
            17 => {
                let collectable = CollectableId(r.u32("collectable_id")?);
                let x = r.i64("pos_x")?;
                let y = r.i64("pos_y")?;
                let kind_byte = r.u8("collectable_kind")?;
                let kind = CollectableKind::from_u8(kind_byte).ok_or(WireError::InvalidValue {
                    what: "collectable kind",
                    value: kind_byte,
                })?;
                Self::AddCollectable {
                    collectable,
                    x,
                    y,
                    kind,
                }
            }
            18 => Self::CollectableCollected {
                collectable: CollectableId(r.u32("collectable_id")?),
                player: PlayerId(r.u8("player_id")?),
            },
            19 => Self::RemoveCollectable {
                collectable: CollectableId(r.u32("collectable_id")?),
            },
            20 => Self::SetupRace {
                distance: r.u16("distance")?,
            },
            21 => Self::DeclareWinner {
                player: PlayerId(r.u8("player_id")?),
                time_ms: r.u32("time_ms")?,
            },
            other => return Err(WireError::UnknownTag(other)),
        };

        if r.remaining() > 0 {
            debug!(
                kind = message.kind_name(),
                trailing = r.remaining(),
                "payload not fully consumed, peer may speak a newer revision"
            );
        }

        Ok(message)
    }
}

fn read_state(r: &mut Reader<'_>) -> Result<ActorState, WireError> {
    let byte = r.u8("state")?;
    ActorState::from_u8(byte).ok_or(WireError::InvalidValue {
        what: "actor state",
        value: byte,
    })
}
