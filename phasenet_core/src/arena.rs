//! Tombstoning arena with a dense live list.
//!
//! Slots are never reused. A parallel `live` vector holds the ids of all
//! present entries so that counting and uniform random selection are O(1);
//! removal swap-removes from `live` and patches the moved entry's position.

use crate::ids::ArenaId;

struct Slot<T> {
    value: Option<T>,
    /// Position of this slot inside `live` while occupied
    live_pos: usize,
}

pub(crate) struct Arena<I: ArenaId, T> {
    slots: Vec<Slot<T>>,
    live: Vec<I>,
}

impl<I: ArenaId, T> Arena<I, T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: Vec::new(),
        }
    }
    
    /// Id the next insertion will receive.
    pub fn next_id(&self) -> I {
        I::from_slot(self.slots.len())
    }
    
    pub fn insert(&mut self, value: T) -> I {
        let id = self.next_id();
        self.slots.push(Slot {
            value: Some(value),
            live_pos: self.live.len(),
        });
        self.live.push(id);
        id
    }
    
    pub fn remove(&mut self, id: I) -> Option<T> {
        let slot = self.slots.get_mut(id.slot())?;
        let value = slot.value.take()?;
        let pos = slot.live_pos;
        
        self.live.swap_remove(pos);
        if let Some(&moved) = self.live.get(pos) {
            self.slots[moved.slot()].live_pos = pos;
        }
        Some(value)
    }
    
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.slot()).and_then(|s| s.value.as_ref())
    }
    
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.slot()).and_then(|s| s.value.as_mut())
    }
    
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }
    
    pub fn len(&self) -> usize {
        self.live.len()
    }
    
    /// Live ids in arena-internal order (not insertion order after removals).
    pub fn ids(&self) -> &[I] {
        &self.live
    }
    
    /// Live entry at a dense position, used for O(1) random picks.
    pub fn nth(&self, pos: usize) -> Option<I> {
        self.live.get(pos).copied()
    }
    
    /// Iterates live entries in slot (creation) order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|v| (I::from_slot(i), v)))
    }
    
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.value = None;
        }
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::VertexId;
    
    #[test]
    fn test_arena_insert_remove() {
        let mut arena: Arena<VertexId, &str> = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        let c = arena.insert("c");
        
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.len(), 2);
        assert!(!arena.contains(a));
        
        // c was swapped into a's live position and must still resolve
        assert_eq!(arena.get(c), Some(&"c"));
        assert_eq!(arena.remove(c), Some("c"));
        assert_eq!(arena.ids(), &[b]);
    }
    
    #[test]
    fn test_arena_ids_never_reused() {
        let mut arena: Arena<VertexId, u8> = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let b = arena.insert(2);
        assert_ne!(a, b);
        assert_eq!(arena.get(a), None);
    }
    
    #[test]
    fn test_arena_iter_in_creation_order() {
        let mut arena: Arena<VertexId, u8> = Arena::new();
        let ids: Vec<_> = (0..5).map(|i| arena.insert(i)).collect();
        arena.remove(ids[1]);
        let seen: Vec<u8> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(seen, vec![0, 2, 3, 4]);
    }
}
