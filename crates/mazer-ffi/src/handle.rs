//! Slot+generation table behind [`GridHandle`](crate::GridHandle).
//!
//! A handle that outlived its grid carries a stale generation and resolves
//! to `None`, so hosts can never reach a destroyed grid through it.
//! Generations start at 1: no live handle ever encodes to 0, which hosts
//! use as the null sentinel.

/// Upper 32 bits = slot index, lower 32 bits = generation.
fn encode(slot: u32, generation: u32) -> u64 {
    (u64::from(slot) << 32) | u64::from(generation)
}

fn decode(handle: u64) -> (u32, u32) {
    ((handle >> 32) as u32, handle as u32)
}

const FIRST_GENERATION: u32 = 1;

struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

pub(crate) struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> HandleTable<T> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Insert a value and return its (non-zero) handle.
    ///
    /// `None` once all 2^32 slots are in use or retired.
    pub fn insert(&mut self, value: T) -> Option<u64> {
        let handle = if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.data = Some(value);
            encode(slot_idx, slot.generation)
        } else {
            let slot_idx = u32::try_from(self.slots.len()).ok()?;
            self.slots.push(Slot {
                generation: FIRST_GENERATION,
                data: Some(value),
            });
            encode(slot_idx, FIRST_GENERATION)
        };
        self.live += 1;
        Some(handle)
    }

    pub fn get(&self, handle: u64) -> Option<&T> {
        let (slot_idx, generation) = decode(handle);
        let slot = self.slots.get(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_ref()
    }

    /// Remove the value behind a handle. Stale handles return `None`.
    ///
    /// A slot whose generation would wrap is retired instead of recycled,
    /// so a handle from an earlier epoch can never match it again.
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        let (slot_idx, generation) = decode(handle);
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.data.take()?;
        self.live -= 1;
        match slot.generation.checked_add(1) {
            Some(next) => {
                slot.generation = next;
                self.free_list.push(slot_idx);
            }
            // Retired: generation 0 is never issued, so nothing matches.
            None => slot.generation = 0,
        }
        Some(value)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Remove every live entry, returning the values.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.live);
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.data.take() {
                out.push(value);
                match slot.generation.checked_add(1) {
                    Some(next) => {
                        slot.generation = next;
                        self.free_list.push(idx as u32);
                    }
                    None => slot.generation = 0,
                }
            }
        }
        self.live = 0;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn insert_get_round_trip() {
        let mut table = HandleTable::new();
        let h = table.insert(42i32).unwrap();
        assert_eq!(table.get(h), Some(&42));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_returns_value() {
        let mut table = HandleTable::new();
        let h = table.insert(99i32).unwrap();
        assert_eq!(table.remove(h), Some(99));
        assert_eq!(table.get(h), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn double_remove_returns_none() {
        let mut table = HandleTable::new();
        let h = table.insert(1i32).unwrap();
        assert_eq!(table.remove(h), Some(1));
        assert_eq!(table.remove(h), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn free_list_reuses_slots_with_new_generation() {
        let mut table = HandleTable::new();
        let h1 = table.insert(1i32).unwrap();
        table.remove(h1);
        let h2 = table.insert(2i32).unwrap();
        let (slot1, gen1) = decode(h1);
        let (slot2, gen2) = decode(h2);
        assert_eq!(slot1, slot2);
        assert_eq!(gen2, gen1 + 1);
        assert_eq!(table.get(h2), Some(&2));
        assert_eq!(table.get(h1), None);
    }

    #[test]
    fn zero_never_resolves() {
        let mut table = HandleTable::new();
        let h = table.insert(7i32).unwrap();
        assert_ne!(h, 0);
        assert_eq!(table.get(0), None);
        assert_eq!(table.remove(0), None);
    }

    #[test]
    fn invalid_handle_returns_none() {
        let table: HandleTable<i32> = HandleTable::new();
        assert_eq!(table.get(encode(999, FIRST_GENERATION)), None);
    }

    #[test]
    fn generation_exhaustion_retires_slot() {
        let mut table = HandleTable::new();
        let h = table.insert(1i32).unwrap();
        table.remove(h);

        table.slots[0].generation = u32::MAX;
        let h2 = table.insert(2i32).unwrap();
        assert_eq!(decode(h2), (0, u32::MAX));

        table.remove(h2);
        assert_eq!(table.slots[0].generation, 0);
        assert!(!table.free_list.contains(&0));
        assert_eq!(table.get(encode(0, 0)), None);

        let h3 = table.insert(3i32).unwrap();
        assert_ne!(decode(h3).0, 0);
    }

    #[test]
    fn drain_empties_and_invalidates() {
        let mut table = HandleTable::new();
        let a = table.insert('a').unwrap();
        let b = table.insert('b').unwrap();
        let mut drained = table.drain();
        drained.sort();
        assert_eq!(drained, vec!['a', 'b']);
        assert_eq!(table.len(), 0);
        assert_eq!(table.get(a), None);
        assert_eq!(table.get(b), None);
    }

    proptest! {
        #[test]
        fn handles_are_never_zero(ops in proptest::collection::vec(any::<bool>(), 1..200)) {
            let mut table = HandleTable::new();
            let mut live = Vec::new();
            for insert in ops {
                if insert || live.is_empty() {
                    let h = table.insert(()).unwrap();
                    prop_assert_ne!(h, 0);
                    live.push(h);
                } else {
                    let h = live.swap_remove(0);
                    prop_assert!(table.remove(h).is_some());
                }
                prop_assert_eq!(table.len(), live.len());
            }
        }
    }
}
