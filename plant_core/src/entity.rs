//! Entity handles and their allocator.
//!
//! An entity is nothing but a generation-checked index. Slots freed by
//! `destroy` are recycled with a bumped generation, so a stale handle can
//! never be mistaken for the entity that reused its slot.

use serde::{Deserialize, Serialize};

/// Opaque handle into the component store.
///
/// Ordering is by index, then generation; storages iterate in this order,
/// which keeps every pass deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out entity handles and tracks which are alive.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct EntityAllocator {
    /// Current generation per slot
    generations: Vec<u32>,

    /// Liveness per slot
    alive: Vec<bool>,

    /// Freed slots awaiting reuse (LIFO)
    free: Vec<u32>,
}

impl EntityAllocator {
    pub fn allocate(&mut self) -> Entity {
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.alive[slot] = true;
            return Entity {
                index,
                generation: self.generations[slot],
            };
        }

        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.alive.push(true);
        Entity {
            index,
            generation: 0,
        }
    }

    /// Frees the entity's slot. Returns false for a stale or dead handle.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.index as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index as usize;
        slot < self.alive.len()
            && self.alive[slot]
            && self.generations[slot] == entity.generation
    }

    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|alive| **alive).count()
    }

    /// Iterates live handles in index order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(slot, _)| Entity {
                index: slot as u32,
                generation: self.generations[slot],
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential_indices() {
        let mut alloc = EntityAllocator::default();
        let a = alloc.allocate();
        let b = alloc.allocate();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(alloc.live_count(), 2);
    }

    #[test]
    fn test_freed_slot_reused_with_new_generation() {
        let mut alloc = EntityAllocator::default();
        let a = alloc.allocate();
        assert!(alloc.free(a));

        let b = alloc.allocate();
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());

        // Stale handle stays dead even though the slot is live again
        assert!(!alloc.is_alive(a));
        assert!(alloc.is_alive(b));
    }

    #[test]
    fn test_double_free_rejected() {
        let mut alloc = EntityAllocator::default();
        let a = alloc.allocate();
        assert!(alloc.free(a));
        assert!(!alloc.free(a));
        assert_eq!(alloc.live_count(), 0);
    }
}
