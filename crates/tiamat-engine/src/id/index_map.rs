use super::Id;

// Sentinel keys for bucket states. Ids are resource handles and stay far
// below this range in practice.
const EMPTY: Id = Id::MAX;
const TOMBSTONE: Id = Id::MAX - 1;

const LOAD_FACTOR_LIMIT: f32 = 0.7;

/// Open-addressing `Id -> u32` table with linear probing and tombstones.
///
/// Used where the engine needs O(1) existence/index lookups keyed by a
/// recyclable id, most notably the ordered id table's reverse `id -> order`
/// mapping.
#[derive(Debug, Clone)]
pub struct IndexMap {
    keys: Vec<Id>,
    values: Vec<u32>,
    len: usize,
}

impl IndexMap {
    /// Creates a map with room for roughly `capacity` entries before the
    /// first rehash.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(4);
        Self {
            keys: vec![EMPTY; capacity],
            values: vec![0; capacity],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts or replaces the value for `key`.
    pub fn insert(&mut self, key: Id, value: u32) {
        debug_assert!(key < TOMBSTONE, "id is reserved as a bucket sentinel");

        if (self.len + 1) as f32 / self.keys.len() as f32 >= LOAD_FACTOR_LIMIT {
            self.grow();
        }

        let capacity = self.keys.len();
        let start = key as usize % capacity;
        let mut first_free = None;

        for probe in 0..capacity {
            let i = (start + probe) % capacity;
            match self.keys[i] {
                k if k == key => {
                    self.values[i] = value;
                    return;
                }
                EMPTY => {
                    let slot = first_free.unwrap_or(i);
                    self.keys[slot] = key;
                    self.values[slot] = value;
                    self.len += 1;
                    return;
                }
                TOMBSTONE => {
                    if first_free.is_none() {
                        first_free = Some(i);
                    }
                }
                _ => {}
            }
        }

        // Full probe without an empty bucket: every slot is live or a
        // tombstone. The load factor limit keeps this unreachable, but a
        // tombstone slot is still a valid insertion point.
        let slot = first_free.expect("index map probe found no usable bucket");
        self.keys[slot] = key;
        self.values[slot] = value;
        self.len += 1;
    }

    /// Looks up the value stored for `key`.
    pub fn get(&self, key: Id) -> Option<u32> {
        self.bucket_of(key).map(|i| self.values[i])
    }

    pub fn contains(&self, key: Id) -> bool {
        self.bucket_of(key).is_some()
    }

    /// Removes `key`, returning its value. The bucket becomes a tombstone so
    /// later probes keep walking past it.
    pub fn remove(&mut self, key: Id) -> Option<u32> {
        let i = self.bucket_of(key)?;
        self.keys[i] = TOMBSTONE;
        self.len -= 1;
        Some(self.values[i])
    }

    fn bucket_of(&self, key: Id) -> Option<usize> {
        let capacity = self.keys.len();
        let start = key as usize % capacity;

        for probe in 0..capacity {
            let i = (start + probe) % capacity;
            match self.keys[i] {
                k if k == key => return Some(i),
                EMPTY => return None,
                _ => {}
            }
        }

        None
    }

    fn grow(&mut self) {
        let new_capacity = self.keys.len() * 2;
        let old_keys = std::mem::replace(&mut self.keys, vec![EMPTY; new_capacity]);
        let old_values = std::mem::replace(&mut self.values, vec![0; new_capacity]);
        self.len = 0;

        for (key, value) in old_keys.into_iter().zip(old_values) {
            if key != EMPTY && key != TOMBSTONE {
                self.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let mut map = IndexMap::new(8);
        map.insert(3, 30);
        map.insert(11, 110);

        assert_eq!(map.get(3), Some(30));
        assert_eq!(map.get(11), Some(110));
        assert_eq!(map.get(7), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn insert_replaces_existing_value() {
        let mut map = IndexMap::new(8);
        map.insert(5, 1);
        map.insert(5, 2);

        assert_eq!(map.get(5), Some(2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn remove_leaves_probe_chain_intact() {
        let mut map = IndexMap::new(8);
        // 1 and 9 collide at bucket 1 with capacity 8; 9 probes past 1.
        map.insert(1, 10);
        map.insert(9, 90);

        assert_eq!(map.remove(1), Some(10));
        assert_eq!(map.get(9), Some(90));
        assert_eq!(map.get(1), None);
    }

    #[test]
    fn remove_of_missing_key_is_none() {
        let mut map = IndexMap::new(8);
        assert_eq!(map.remove(4), None);
    }

    #[test]
    fn grows_past_load_factor() {
        let mut map = IndexMap::new(4);
        for key in 0..64 {
            map.insert(key, key * 10);
        }

        assert_eq!(map.len(), 64);
        for key in 0..64 {
            assert_eq!(map.get(key), Some(key * 10));
        }
    }

    #[test]
    fn reuses_tombstones() {
        let mut map = IndexMap::new(8);
        for round in 0..100 {
            map.insert(round % 4, round);
            map.remove(round % 4);
        }
        assert!(map.is_empty());
    }
}
