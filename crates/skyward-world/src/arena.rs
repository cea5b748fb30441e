//! Dense slot storage with smallest-free-slot reuse.

/// A `Vec`-backed arena. Slots are addressed by `u32` index; removal leaves
/// a hole that the next insert fills, so indices stay small and stable.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Insert into the lowest free slot, growing only when full.
    pub fn insert(&mut self, value: T) -> u32 {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(value);
                return index as u32;
            }
        }
        self.slots.push(Some(value));
        (self.slots.len() - 1) as u32
    }

    pub fn remove(&mut self, index: u32) -> Option<T> {
        self.slots.get_mut(index as usize)?.take()
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize)?.as_mut()
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index as u32, value)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
