use crate::id::{DeadId, Id, OrderedIdTable, UnorderedIdTable};

/// Owning slot container mapping recyclable ids to values.
///
/// A single pool replaces the pair of manually synchronized descriptor/impl
/// arrays of classic C engine layouts: the id table and the slot storage grow
/// together, so an id is live exactly when its slot holds a value.
#[derive(Debug)]
pub struct Pool<T> {
    ids: UnorderedIdTable,
    slots: Vec<Option<T>>,
}

impl<T> Pool<T> {
    pub fn new(capacity: u32) -> Self {
        Self {
            ids: UnorderedIdTable::new(capacity),
            slots: Vec::new(),
        }
    }

    /// Allocates an id and stores `value` in its slot.
    pub fn insert(&mut self, value: T) -> Id {
        let id = self.ids.new_id();
        self.cover(id);
        self.slots[id as usize] = Some(value);
        id
    }

    /// Removes a live id, returning its value.
    pub fn remove(&mut self, id: Id) -> Result<T, DeadId> {
        self.ids.remove(id)?;
        Ok(self.slots[id as usize]
            .take()
            .expect("live id had an empty slot"))
    }

    pub fn get(&self, id: Id) -> Result<&T, DeadId> {
        if !self.ids.contains(id) {
            return Err(DeadId(id));
        }
        Ok(self.slots[id as usize]
            .as_ref()
            .expect("live id had an empty slot"))
    }

    pub fn get_mut(&mut self, id: Id) -> Result<&mut T, DeadId> {
        if !self.ids.contains(id) {
            return Err(DeadId(id));
        }
        Ok(self.slots[id as usize]
            .as_mut()
            .expect("live id had an empty slot"))
    }

    /// Swaps the values stored for two live ids. The ids themselves keep
    /// their identity; only the payloads trade places.
    pub fn swap(&mut self, a: Id, b: Id) -> Result<(), DeadId> {
        if !self.ids.contains(a) {
            return Err(DeadId(a));
        }
        if !self.ids.contains(b) {
            return Err(DeadId(b));
        }
        self.slots.swap(a as usize, b as usize);
        Ok(())
    }

    pub fn contains(&self, id: Id) -> bool {
        self.ids.contains(id)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.ids.live_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live ids in ascending numeric order.
    pub fn live_ids(&self) -> Vec<Id> {
        self.ids.live_ids().collect()
    }

    fn cover(&mut self, id: Id) {
        let needed = id as usize + 1;
        if self.slots.len() < needed {
            self.slots.resize_with(needed, || None);
        }
    }
}

/// [`Pool`] variant keyed by an [`OrderedIdTable`]: live ids additionally
/// carry a stable insertion order, which the frame loop uses as draw order.
#[derive(Debug)]
pub struct OrderedPool<T> {
    ids: OrderedIdTable,
    slots: Vec<Option<T>>,
}

impl<T> OrderedPool<T> {
    pub fn new(capacity: u32) -> Self {
        Self {
            ids: OrderedIdTable::new(capacity),
            slots: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> Id {
        let id = self.ids.insert();
        let needed = id as usize + 1;
        if self.slots.len() < needed {
            self.slots.resize_with(needed, || None);
        }
        self.slots[id as usize] = Some(value);
        id
    }

    pub fn remove(&mut self, id: Id) -> Result<T, DeadId> {
        self.ids.remove(id)?;
        Ok(self.slots[id as usize]
            .take()
            .expect("live id had an empty slot"))
    }

    pub fn get(&self, id: Id) -> Result<&T, DeadId> {
        if !self.ids.contains(id) {
            return Err(DeadId(id));
        }
        Ok(self.slots[id as usize]
            .as_ref()
            .expect("live id had an empty slot"))
    }

    pub fn get_mut(&mut self, id: Id) -> Result<&mut T, DeadId> {
        if !self.ids.contains(id) {
            return Err(DeadId(id));
        }
        Ok(self.slots[id as usize]
            .as_mut()
            .expect("live id had an empty slot"))
    }

    pub fn contains(&self, id: Id) -> bool {
        self.ids.contains(id)
    }

    /// Live ids in insertion order. This is the submission order contract.
    pub fn ordered_ids(&self) -> &[Id] {
        self.ids.orders()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_round_trip() {
        let mut pool = Pool::new(4);
        let id = pool.insert("alpha");
        assert_eq!(*pool.get(id).unwrap(), "alpha");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn remove_returns_value_and_kills_id() {
        let mut pool = Pool::new(4);
        let id = pool.insert(7u32);
        assert_eq!(pool.remove(id).unwrap(), 7);
        assert!(!pool.contains(id));
        assert!(pool.get(id).is_err());
    }

    #[test]
    fn recycled_slot_holds_new_value() {
        let mut pool = Pool::new(2);
        let a = pool.insert(1u32);
        pool.remove(a).unwrap();
        let b = pool.insert(2u32);
        assert_eq!(*pool.get(b).unwrap(), 2);
    }

    #[test]
    fn swap_exchanges_payloads_not_ids() {
        let mut pool = Pool::new(4);
        let a = pool.insert("a");
        let b = pool.insert("b");

        pool.swap(a, b).unwrap();
        assert_eq!(*pool.get(a).unwrap(), "b");
        assert_eq!(*pool.get(b).unwrap(), "a");
    }

    #[test]
    fn ordered_pool_preserves_insertion_order() {
        let mut pool = OrderedPool::new(4);
        let a = pool.insert("a");
        let b = pool.insert("b");
        let c = pool.insert("c");

        pool.remove(b).unwrap();
        let d = pool.insert("d");

        assert_eq!(pool.ordered_ids(), &[a, c, d]);
    }
}
