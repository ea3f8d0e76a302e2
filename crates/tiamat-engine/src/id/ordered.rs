use super::{DeadId, Id, IndexMap, UnorderedIdTable};

/// Id allocator that additionally tracks a dense, insertion-stable sequence
/// of the live ids.
///
/// `orders()` holds exactly the live ids in the order they were inserted
/// relative to each other; removal shift-compacts the sequence. Underlying
/// ids are recycled, so the sequence is not sorted numerically. The render
/// pass registry uses it as the total draw-order contract.
#[derive(Debug, Clone)]
pub struct OrderedIdTable {
    ids: UnorderedIdTable,
    orders: Vec<Id>,
    /// Reverse `id -> position in orders` map, kept exact across compaction.
    id_to_order: IndexMap,
}

impl OrderedIdTable {
    /// Creates a table with ids `[0, capacity)` initially free.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: u32) -> Self {
        Self {
            ids: UnorderedIdTable::new(capacity),
            orders: Vec::with_capacity(capacity as usize),
            id_to_order: IndexMap::new(capacity as usize),
        }
    }

    /// Allocates an id and appends it to the live order.
    pub fn insert(&mut self) -> Id {
        let id = self.ids.new_id();
        self.id_to_order.insert(id, self.orders.len() as u32);
        self.orders.push(id);
        id
    }

    /// Removes a live id, compacting the order sequence.
    ///
    /// Every id that shifts down gets its recorded position updated, so
    /// `order_of` stays exact after any removal pattern.
    pub fn remove(&mut self, id: Id) -> Result<(), DeadId> {
        let position = self.id_to_order.get(id).ok_or(DeadId(id))? as usize;

        self.ids.remove(id)?;
        self.id_to_order.remove(id);
        self.orders.remove(position);

        for (new_position, &shifted) in self.orders.iter().enumerate().skip(position) {
            self.id_to_order.insert(shifted, new_position as u32);
        }

        Ok(())
    }

    pub fn contains(&self, id: Id) -> bool {
        self.ids.contains(id)
    }

    /// Live ids in insertion order.
    pub fn orders(&self) -> &[Id] {
        &self.orders
    }

    /// Position of `id` within the live order, if live.
    pub fn order_of(&self, id: Id) -> Option<u32> {
        self.id_to_order.get(id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_has_empty_order() {
        let table = OrderedIdTable::new(10);
        assert!(table.is_empty());
    }

    #[test]
    fn insert_appends_to_order() {
        let mut table = OrderedIdTable::new(10);
        let a = table.insert();
        let b = table.insert();

        assert_eq!(table.orders(), &[a, b]);
        assert_eq!(table.order_of(a), Some(0));
        assert_eq!(table.order_of(b), Some(1));
    }

    #[test]
    fn remove_compacts_and_keeps_relative_order() {
        let mut table = OrderedIdTable::new(10);
        let a = table.insert();
        let b = table.insert();
        let c = table.insert();

        table.remove(b).unwrap();
        assert_eq!(table.orders(), &[a, c]);
        assert_eq!(table.order_of(c), Some(1));

        let d = table.insert();
        assert_eq!(table.orders(), &[a, c, d]);
    }

    #[test]
    fn recycled_id_goes_to_the_back_of_the_order() {
        let mut table = OrderedIdTable::new(10);
        let a = table.insert();
        let b = table.insert();
        let c = table.insert();

        table.remove(a).unwrap();
        let d = table.insert();

        // d may reuse a's numeric value but must still draw last.
        assert_eq!(table.orders(), &[b, c, d]);
        assert_eq!(table.order_of(d), Some(2));
    }

    #[test]
    fn remove_of_dead_id_is_an_error() {
        let mut table = OrderedIdTable::new(10);
        let a = table.insert();
        table.remove(a).unwrap();
        assert_eq!(table.remove(a), Err(DeadId(a)));
    }

    #[test]
    fn reverse_map_survives_interleaved_churn() {
        let mut table = OrderedIdTable::new(4);
        let mut live = Vec::new();

        for _ in 0..8 {
            live.push(table.insert());
            live.push(table.insert());
            let victim = live.remove(0);
            table.remove(victim).unwrap();
        }

        assert_eq!(table.orders(), live.as_slice());
        for (position, &id) in live.iter().enumerate() {
            assert_eq!(table.order_of(id), Some(position as u32));
        }
    }
}
