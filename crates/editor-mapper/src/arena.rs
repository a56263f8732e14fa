//! Generational slot arena backing [`ModelTree`](crate::ModelTree) and
//! [`ViewTree`](crate::ViewTree).
//!
//! Handles stay valid until their slot is freed. A freed slot bumps its generation, so a handle
//! kept past destruction of its node resolves to nothing instead of aliasing a newer node.

use std::fmt;

/// Slot index plus the generation the slot had when the handle was issued.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct RawId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Index of the next fresh slot.
///
/// # Panics
///
/// Panics once the arena outgrows `u32` indices, since handles would otherwise alias.
fn slot_index(len: usize) -> u32 {
    u32::try_from(len).expect("arena exceeded u32::MAX slots")
}

pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> RawId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return RawId {
                index,
                generation: slot.generation,
            };
        }

        let index = slot_index(self.slots.len());
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        RawId {
            index,
            generation: 0,
        }
    }

    pub(crate) fn remove(&mut self, id: RawId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, id: RawId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: RawId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub(crate) fn contains(&self, id: RawId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
