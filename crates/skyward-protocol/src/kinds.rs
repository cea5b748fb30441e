//! Closed enums for the kind and state bytes carried on the wire.

/// Animation/behavior state of an avatar or enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActorState {
    #[default]
    Idle = 0,
    Walk = 1,
    Jump = 2,
    Shoot = 3,
    Die = 4,
    Dead = 5,
}

impl ActorState {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Walk),
            2 => Some(Self::Jump),
            3 => Some(Self::Shoot),
            4 => Some(Self::Die),
            5 => Some(Self::Dead),
            _ => None,
        }
    }
}

/// Terrain block category, as carried in the `AddGround` kind byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroundKind {
    Solid = 0,
    Bad = 1,
    Portal = 2,
    NetworkButton = 3,
    StartButton = 4,
    BuyableButton = 5,
    EnemyBorder = 6,
}

impl GroundKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Solid),
            1 => Some(Self::Bad),
            2 => Some(Self::Portal),
            3 => Some(Self::NetworkButton),
            4 => Some(Self::StartButton),
            5 => Some(Self::BuyableButton),
            6 => Some(Self::EnemyBorder),
            _ => None,
        }
    }
}

/// Terrain block category together with its kind-specific payload.
///
/// Portals carry a teleport destination and buyable buttons carry the item
/// they sell; those fields travel as trailing bytes of `AddGround` and only
/// exist for their kind, so the payload lives inside the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundClass {
    Solid,
    Bad,
    Portal { dest_x: i64, dest_y: i64 },
    NetworkButton,
    StartButton,
    BuyableButton { item: BuyableKind },
    EnemyBorder,
}

impl GroundClass {
    /// The kind byte written to the wire for this class.
    pub fn kind(&self) -> GroundKind {
        match self {
            Self::Solid => GroundKind::Solid,
            Self::Bad => GroundKind::Bad,
            Self::Portal { .. } => GroundKind::Portal,
            Self::NetworkButton => GroundKind::NetworkButton,
            Self::StartButton => GroundKind::StartButton,
            Self::BuyableButton { .. } => GroundKind::BuyableButton,
            Self::EnemyBorder => GroundKind::EnemyBorder,
        }
    }
}

/// Enemy species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Shooter = 0,
    Walker = 1,
}

impl EnemyKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Shooter),
            1 => Some(Self::Walker),
            _ => None,
        }
    }

    /// Whether enemies of this species move on their own. Only moving
    /// enemies are included in the host's periodic position broadcast.
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Walker)
    }
}

/// Collectable item species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectableKind {
    Coin = 0,
    Heart = 1,
}

impl CollectableKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Coin),
            1 => Some(Self::Heart),
            _ => None,
        }
    }
}

/// Item sold by a buyable-button ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuyableKind {
    JumpBoost = 0,
    Immortality = 1,
}

impl BuyableKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::JumpBoost),
            1 => Some(Self::Immortality),
            _ => None,
        }
    }
}
