//! Structural interning table.

use std::collections::HashMap;
use std::hash::Hash;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An append-only table that assigns each distinct value a stable id.
///
/// Ids start at 1 and are never reused or renumbered within a file
/// lifetime. Interning the same value twice returns the same id;
/// lookup by id is O(1).
///
/// Serialization writes the values in id order; deserialization rebuilds
/// the reverse index and rejects artifacts containing duplicate values,
/// since those could never have been produced by this table.
#[derive(Debug, Clone)]
pub struct IndexedTable<V> {
    values: Vec<V>,
    index: HashMap<V, u32>,
}

impl<V: Clone + Eq + Hash> IndexedTable<V> {
    pub fn new() -> Self {
        IndexedTable {
            values: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the id for `value`, inserting it if not yet present.
    pub fn intern(&mut self, value: V) -> u32 {
        if let Some(&id) = self.index.get(&value) {
            return id;
        }
        self.values.push(value.clone());
        let id = self.values.len() as u32;
        self.index.insert(value, id);
        id
    }

    pub fn get(&self, id: u32) -> Option<&V> {
        if id == 0 {
            return None;
        }
        self.values.get((id - 1) as usize)
    }

    /// The id previously assigned to `value`, if any.
    pub fn lookup(&self, value: &V) -> Option<u32> {
        self.index.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &V)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u32 + 1, v))
    }
}

impl<V: Clone + Eq + Hash> Default for IndexedTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Serialize> Serialize for IndexedTable<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl<'de, V> Deserialize<'de> for IndexedTable<V>
where
    V: Deserialize<'de> + Clone + Eq + Hash,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<V>::deserialize(deserializer)?;
        let mut table = IndexedTable::new();
        for (pos, value) in values.into_iter().enumerate() {
            let id = table.intern(value);
            if id as usize != pos + 1 {
                return Err(D::Error::custom(format!(
                    "duplicate table value at position {} (already id {})",
                    pos + 1,
                    id
                )));
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_dedups_and_ids_start_at_one() {
        let mut table = IndexedTable::new();
        let a = table.intern("alpha".to_string());
        let b = table.intern("beta".to_string());
        let a2 = table.intern("alpha".to_string());
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(a2, a);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn get_by_id_returns_the_interned_value() {
        let mut table = IndexedTable::new();
        let id = table.intern(42u64);
        assert_eq!(table.get(id), Some(&42));
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(99), None);
    }

    #[test]
    fn lookup_finds_existing_values_only() {
        let mut table = IndexedTable::new();
        table.intern("x".to_string());
        assert_eq!(table.lookup(&"x".to_string()), Some(1));
        assert_eq!(table.lookup(&"y".to_string()), None);
    }

    #[test]
    fn ids_are_stable_across_interleaved_interning() {
        let mut table = IndexedTable::new();
        let ids: Vec<u32> = (0..100).map(|i| table.intern(i % 10)).collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(*id, (i % 10) as u32 + 1);
        }
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn serde_round_trip_preserves_ids() {
        let mut table = IndexedTable::new();
        table.intern("p".to_string());
        table.intern("q".to_string());
        table.intern("r".to_string());
        let json = serde_json::to_string(&table).unwrap();
        let back: IndexedTable<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(2), Some(&"q".to_string()));
        assert_eq!(back.lookup(&"r".to_string()), Some(3));
    }

    #[test]
    fn deserializing_duplicate_values_is_a_schema_error() {
        let err = serde_json::from_str::<IndexedTable<String>>(r#"["a","b","a"]"#).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
