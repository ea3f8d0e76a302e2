use super::{DeadId, Id};

/// Free-list based recyclable id allocator.
///
/// Every integer in `[0, max_id]` is either live (not on the free list) or
/// free (on the free list, exactly once). The free list never holds a value
/// greater than `max_id`.
///
/// Removing the highest live id shrinks `max_id` instead of growing the free
/// list, so stack-like allocate/release patterns never accumulate free
/// entries.
#[derive(Debug, Clone)]
pub struct UnorderedIdTable {
    max_id: Id,
    free_ids: Vec<Id>,
}

impl UnorderedIdTable {
    /// Creates a table with ids `[0, capacity)` initially free.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "id table capacity must be > 0");

        Self {
            max_id: capacity - 1,
            // Reversed so that pop() hands out ids in ascending order.
            free_ids: (0..capacity).rev().collect(),
        }
    }

    /// Allocates an id. Never fails: once the free list is exhausted the
    /// table grows logically by incrementing `max_id`.
    pub fn new_id(&mut self) -> Id {
        match self.free_ids.pop() {
            Some(id) => id,
            None => {
                self.max_id += 1;
                self.max_id
            }
        }
    }

    /// Releases a live id back to the table.
    ///
    /// If `id` is the current `max_id` (and nonzero) the table shrinks
    /// instead of pushing onto the free list.
    pub fn remove(&mut self, id: Id) -> Result<(), DeadId> {
        if !self.contains(id) {
            return Err(DeadId(id));
        }

        if id == self.max_id && id != 0 {
            self.max_id -= 1;
        } else {
            self.free_ids.push(id);
        }

        Ok(())
    }

    /// Returns whether `id` is currently live.
    ///
    /// The free list scan is linear; tables are expected to stay small
    /// (tens of resources, not thousands).
    pub fn contains(&self, id: Id) -> bool {
        id <= self.max_id && !self.free_ids.contains(&id)
    }

    /// Highest id the table has handed out (live or free).
    pub fn max_id(&self) -> Id {
        self.max_id
    }

    /// Number of ids currently on the free list.
    pub fn free_len(&self) -> usize {
        self.free_ids.len()
    }

    /// Number of currently live ids.
    pub fn live_len(&self) -> usize {
        self.max_id as usize + 1 - self.free_ids.len()
    }

    /// Iterates the live ids in ascending numeric order.
    pub fn live_ids(&self) -> impl Iterator<Item = Id> + '_ {
        (0..=self.max_id).filter(|&id| !self.free_ids.contains(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_has_all_ids_free() {
        let table = UnorderedIdTable::new(10);
        assert_eq!(table.free_len(), 10);
        assert_eq!(table.live_len(), 0);
    }

    #[test]
    fn new_id_hands_out_ascending_ids() {
        let mut table = UnorderedIdTable::new(10);
        assert_eq!(table.new_id(), 0);
        assert_eq!(table.new_id(), 1);
        assert_eq!(table.new_id(), 2);
        assert_eq!(table.free_len(), 7);
    }

    #[test]
    fn contains_tracks_live_ids_only() {
        let mut table = UnorderedIdTable::new(10);
        let id0 = table.new_id();
        let id1 = table.new_id();
        let id2 = table.new_id();
        let id3 = table.new_id();

        table.remove(id2).unwrap();

        assert!(table.contains(id0));
        assert!(table.contains(id1));
        assert!(!table.contains(id2));
        assert!(table.contains(id3));
    }

    #[test]
    fn removing_max_id_shrinks_instead_of_leaking() {
        let mut table = UnorderedIdTable::new(10);
        // Drain the initial free list so max_id is the live frontier.
        let ids: Vec<_> = (0..10).map(|_| table.new_id()).collect();
        assert_eq!(ids[9], 9);
        assert_eq!(table.free_len(), 0);

        table.remove(9).unwrap();
        assert_eq!(table.free_len(), 0);
        assert_eq!(table.max_id(), 8);

        // The shrunk id comes back on the next allocation.
        assert_eq!(table.new_id(), 9);
    }

    #[test]
    fn removed_id_is_recycled() {
        let mut table = UnorderedIdTable::new(3);
        let a = table.new_id();
        let _b = table.new_id();
        let _c = table.new_id();

        table.remove(a).unwrap();
        assert!(!table.contains(a));
        assert_eq!(table.new_id(), a);
        assert!(table.contains(a));
    }

    #[test]
    fn most_recently_released_id_is_reissued_first() {
        let mut table = UnorderedIdTable::new(10);
        table.new_id();
        table.new_id();
        table.new_id();

        table.remove(2).unwrap();
        assert_eq!(table.new_id(), 2);
    }

    #[test]
    fn remove_of_dead_id_is_an_error() {
        let mut table = UnorderedIdTable::new(4);
        assert_eq!(table.remove(2), Err(DeadId(2)));

        let id = table.new_id();
        table.remove(id).unwrap();
        assert_eq!(table.remove(id), Err(DeadId(id)));
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut table = UnorderedIdTable::new(1);
        assert_eq!(table.new_id(), 0);
        assert_eq!(table.new_id(), 1);
        assert_eq!(table.new_id(), 2);
        assert!(table.contains(2));
        assert_eq!(table.max_id(), 2);
    }

    #[test]
    fn no_two_live_ids_collide() {
        let mut table = UnorderedIdTable::new(2);
        let mut live = Vec::new();

        for round in 0..4 {
            for _ in 0..4 {
                let id = table.new_id();
                assert!(!live.contains(&id), "id {id} issued twice");
                live.push(id);
            }
            // Release every other id between rounds.
            live.retain(|&id| {
                if id % 2 == round % 2 {
                    table.remove(id).unwrap();
                    false
                } else {
                    true
                }
            });
        }

        for &id in &live {
            assert!(table.contains(id));
        }
    }
}
