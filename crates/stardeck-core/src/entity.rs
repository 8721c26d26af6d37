//! Generational entity identities.
//!
//! An `EntityId` pairs a slot index with the generation the slot had when the
//! id was handed out, so ids held by external collaborators go stale instead
//! of silently pointing at a recycled entity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index as a `usize`, for indexing component columns.
    #[inline]
    pub fn slot(&self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}g{}", self.index, self.generation)
    }
}

/// Hands out entity ids and recycles freed slots with a bumped generation.
#[derive(Debug)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    free_indices: Vec<u32>,
    next_index: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_indices: Vec::new(),
            next_index: 0,
        }
    }

    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free_indices.pop() {
            let generation = self.generations[index as usize];
            EntityId::new(index, generation)
        } else {
            let index = self.next_index;
            self.next_index += 1;
            self.generations.push(0);
            EntityId::new(index, 0)
        }
    }

    /// Free a slot. Returns false if the id was already stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if self.is_alive(id) {
            self.generations[id.slot()] += 1;
            self.free_indices.push(id.index);
            true
        } else {
            false
        }
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.generations
            .get(id.slot())
            .is_some_and(|&generation| generation == id.generation)
    }

    /// Number of slots ever handed out (live or free).
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_deallocate() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        assert_eq!(e0.index, 0);
        assert_eq!(e0.generation, 0);
        assert!(alloc.is_alive(e0));

        assert!(alloc.deallocate(e0));
        assert!(!alloc.is_alive(e0));
        assert!(!alloc.deallocate(e0), "double free must be rejected");

        let e0_reuse = alloc.allocate();
        assert_eq!(e0_reuse.index, 0);
        assert_eq!(e0_reuse.generation, 1);
        assert!(alloc.is_alive(e0_reuse));
        assert!(!alloc.is_alive(e0));
    }

    #[test]
    fn sequential_allocation() {
        let mut alloc = EntityAllocator::new();
        let ids: Vec<_> = (0..3).map(|_| alloc.allocate()).collect();
        assert_eq!(
            ids.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(alloc.capacity(), 3);
    }
}
