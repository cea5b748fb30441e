//! Wire identifier to local handle bindings.

use std::collections::HashMap;
use std::hash::Hash;

use skyward_protocol::{CollectableId, EnemyId, GroundId, PlayerId};
use skyward_world::{CollectableHandle, EnemyHandle, GroundHandle, PlayerHandle};

use crate::error::ReplicationError;

/// Bidirectional map between wire identifiers and local handles for one
/// entity category.
///
/// Identifiers index a dense slot vector directly, which the host's
/// smallest-free allocation keeps compact; the reverse direction (handle to
/// id, needed when local gameplay announces a change) goes through a side
/// table.
#[derive(Debug)]
pub struct IdMap<H> {
    slots: Vec<Option<H>>,
    ids: HashMap<H, u32>,
}

impl<H> Default for IdMap<H> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            ids: HashMap::new(),
        }
    }
}

impl<H: Copy + Eq + Hash> IdMap<H> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Smallest identifier not currently bound.
    pub fn allocate(&self) -> u32 {
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.is_none() {
                return index as u32;
            }
        }
        self.slots.len() as u32
    }

    /// Bind `id` to `handle`, replacing any previous binding of either.
    pub fn bind(&mut self, id: u32, handle: H) {
        let index = id as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        if let Some(previous) = self.slots[index] {
            self.ids.remove(&previous);
        }
        self.slots[index] = Some(handle);
        self.ids.insert(handle, id);
    }

    /// Drop the binding for `id`, returning the handle it pointed at.
    pub fn unbind(&mut self, id: u32) -> Option<H> {
        let handle = self.slots.get_mut(id as usize)?.take()?;
        self.ids.remove(&handle);
        Some(handle)
    }

    pub fn get(&self, id: u32) -> Option<H> {
        *self.slots.get(id as usize)?
    }

    pub fn id_of(&self, handle: H) -> Option<u32> {
        self.ids.get(&handle).copied()
    }

    /// Bindings in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, H)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|handle| (index as u32, handle)))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// The four per-category binding tables of a session.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    pub players: IdMap<PlayerHandle>,
    pub grounds: IdMap<GroundHandle>,
    pub enemies: IdMap<EnemyHandle>,
    pub collectables: IdMap<CollectableHandle>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest free avatar identifier. Avatar ids travel as a single byte.
    pub fn allocate_player_id(&self) -> Result<PlayerId, ReplicationError> {
        let id = self.players.allocate();
        if id > u8::MAX as u32 {
            return Err(ReplicationError::PlayerIdsExhausted);
        }
        Ok(PlayerId(id as u8))
    }

    pub fn player(&self, id: PlayerId) -> Result<PlayerHandle, ReplicationError> {
        self.players
            .get(id.0 as u32)
            .ok_or(ReplicationError::UnknownPlayer(id))
    }

    pub fn ground(&self, id: GroundId) -> Result<GroundHandle, ReplicationError> {
        self.grounds
            .get(id.0)
            .ok_or(ReplicationError::UnknownGround(id))
    }

    pub fn enemy(&self, id: EnemyId) -> Result<EnemyHandle, ReplicationError> {
        self.enemies
            .get(id.0)
            .ok_or(ReplicationError::UnknownEnemy(id))
    }

    pub fn collectable(&self, id: CollectableId) -> Result<CollectableHandle, ReplicationError> {
        self.collectables
            .get(id.0)
            .ok_or(ReplicationError::UnknownCollectable(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_reuses_the_smallest_freed_id() {
        let mut map = IdMap::new();
        map.bind(0, GroundHandle(100));
        map.bind(1, GroundHandle(101));
        map.bind(2, GroundHandle(102));

        // With {0, 2} live, the next allocation must be 1.
        map.unbind(1);
        assert_eq!(map.allocate(), 1);

        map.bind(1, GroundHandle(103));
        assert_eq!(map.allocate(), 3);
    }

    #[test]
    fn bindings_resolve_both_ways() {
        let mut map = IdMap::new();
        map.bind(7, EnemyHandle(3));
        assert_eq!(map.get(7), Some(EnemyHandle(3)));
        assert_eq!(map.id_of(EnemyHandle(3)), Some(7));
        assert_eq!(map.get(6), None);
        assert_eq!(map.id_of(EnemyHandle(9)), None);
    }

    #[test]
    fn unbind_clears_both_directions() {
        let mut map = IdMap::new();
        map.bind(4, CollectableHandle(8));
        assert_eq!(map.unbind(4), Some(CollectableHandle(8)));
        assert_eq!(map.get(4), None);
        assert_eq!(map.id_of(CollectableHandle(8)), None);
        assert_eq!(map.unbind(4), None);
    }

    #[test]
    fn iter_is_ordered_by_id() {
        let mut map = IdMap::new();
        map.bind(5, PlayerHandle(50));
        map.bind(1, PlayerHandle(10));
        map.bind(3, PlayerHandle(30));
        let ids: Vec<u32> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn registry_resolves_or_reports_the_missing_id() {
        let mut registry = EntityRegistry::new();
        registry.players.bind(0, PlayerHandle(0));
        assert!(registry.player(PlayerId(0)).is_ok());
        assert!(matches!(
            registry.player(PlayerId(1)),
            Err(ReplicationError::UnknownPlayer(PlayerId(1)))
        ));
        assert!(matches!(
            registry.ground(GroundId(9)),
            Err(ReplicationError::UnknownGround(GroundId(9)))
        ));
    }

    #[test]
    fn player_ids_start_at_zero() {
        let registry = EntityRegistry::new();
        assert_eq!(registry.allocate_player_id().unwrap(), PlayerId(0));
    }
}
