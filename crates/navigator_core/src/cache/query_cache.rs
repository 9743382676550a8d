//! Query cache keyed by table and optional row id.

use crate::repo::Table;
use log::debug;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Identity of one cached read.
///
/// `QueryKey::list(table)` is the whole-table list; `QueryKey::item` is a
/// single row read by id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey {
    pub table: Table,
    pub id: Option<String>,
}

impl QueryKey {
    pub fn list(table: Table) -> Self {
        Self { table, id: None }
    }

    pub fn item(table: Table, id: impl ToString) -> Self {
        Self {
            table,
            id: Some(id.to_string()),
        }
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{id}", self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// Read-through cache holding values of one shape.
#[derive(Debug, Clone)]
pub struct QueryCache<V> {
    entries: BTreeMap<QueryKey, V>,
    generations: BTreeMap<Table, u64>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            generations: BTreeMap::new(),
        }
    }
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its
    /// successful result.
    pub fn get_or_fetch<E>(
        &mut self,
        key: QueryKey,
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.entries.get(&key) {
            debug!("event=cache_read module=cache status=hit key={key}");
            return Ok(value.clone());
        }

        debug!("event=cache_read module=cache status=miss key={key}");
        let value = fetch()?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    /// Cached value without fetching.
    pub fn peek(&self, key: &QueryKey) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn is_cached(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drops every key of `table` and returns the new generation.
    pub fn invalidate(&mut self, table: Table) -> u64 {
        self.entries.retain(|key, _| key.table != table);
        let generation = self.generations.entry(table).or_insert(0);
        *generation += 1;
        debug!(
            "event=cache_invalidate module=cache status=ok table={table} generation={generation}"
        );
        *generation
    }

    /// Number of invalidations seen for `table`.
    pub fn generation(&self, table: Table) -> u64 {
        self.generations.get(&table).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryCache, QueryKey};
    use crate::repo::Table;
    use std::cell::Cell;

    #[test]
    fn second_read_is_served_from_cache() {
        let mut cache = QueryCache::<Vec<u32>>::new();
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            Ok::<_, String>(vec![1, 2])
        };

        assert_eq!(cache.get_or_fetch(QueryKey::list(Table::Domains), fetch).unwrap(), [1, 2]);
        assert_eq!(cache.get_or_fetch(QueryKey::list(Table::Domains), fetch).unwrap(), [1, 2]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn invalidate_drops_list_and_items_of_one_table_only() {
        let mut cache = QueryCache::<Vec<u32>>::new();
        let ok = |value: u32| move || Ok::<_, String>(vec![value]);
        cache.get_or_fetch(QueryKey::list(Table::Domains), ok(1)).unwrap();
        cache.get_or_fetch(QueryKey::item(Table::Domains, "a"), ok(2)).unwrap();
        cache.get_or_fetch(QueryKey::list(Table::Perspectives), ok(3)).unwrap();

        assert_eq!(cache.invalidate(Table::Domains), 1);

        assert!(!cache.is_cached(&QueryKey::list(Table::Domains)));
        assert!(!cache.is_cached(&QueryKey::item(Table::Domains, "a")));
        assert!(cache.is_cached(&QueryKey::list(Table::Perspectives)));
        assert_eq!(cache.generation(Table::Domains), 1);
        assert_eq!(cache.generation(Table::Perspectives), 0);
    }

    #[test]
    fn failed_fetch_is_not_cached() {
        let mut cache = QueryCache::<Vec<u32>>::new();
        let err = cache
            .get_or_fetch(QueryKey::list(Table::Users), || Err("offline".to_string()))
            .unwrap_err();
        assert_eq!(err, "offline");
        assert!(cache.is_empty());

        let value = cache
            .get_or_fetch(QueryKey::list(Table::Users), || Ok::<_, String>(vec![7]))
            .unwrap();
        assert_eq!(value, [7]);
    }
}
