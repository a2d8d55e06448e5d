//! Lock-guarded entity collection shared by the repositories
//!
//! Each repository owns one `Collection`: a `HashMap` behind a single
//! `RwLock`, optionally backed by a JSON snapshot file and optionally fronted
//! by a [`ReadCache`] for lookups by id.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, AccountId, Category, CategoryId, Operation, OperationId};

use super::cache::{CacheStats, ReadCache};
use super::file_io::{read_json, write_json_atomic};

/// An entity stored by identifier
pub trait Keyed {
    type Key: Copy + Eq + Hash + std::fmt::Display + Send + Sync + 'static;

    const ENTITY: &'static str;

    fn key(&self) -> Self::Key;
}

impl Keyed for Account {
    type Key = AccountId;
    const ENTITY: &'static str = "Account";

    fn key(&self) -> AccountId {
        self.id
    }
}

impl Keyed for Category {
    type Key = CategoryId;
    const ENTITY: &'static str = "Category";

    fn key(&self) -> CategoryId {
        self.id
    }
}

impl Keyed for Operation {
    type Key = OperationId;
    const ENTITY: &'static str = "Operation";

    fn key(&self) -> OperationId {
        self.id
    }
}

pub(crate) struct Collection<V: Keyed> {
    path: Option<PathBuf>,
    data: RwLock<HashMap<V::Key, V>>,
    cache: Option<ReadCache<V>>,
}

impl<V> Collection<V>
where
    V: Keyed + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub(crate) fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            cache: None,
        }
    }

    /// Answer lookups by id from a cache whose entries live for `ttl`
    pub(crate) fn enable_cache(&mut self, ttl: Duration) {
        self.cache = Some(ReadCache::new(ttl));
    }

    pub(crate) fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ReadCache::stats)
    }

    fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    fn cache_put(&self, item: &V) {
        if let Some(cache) = &self.cache {
            cache.put(item);
        }
    }

    /// Replace the contents with the snapshot on disk
    pub(crate) fn load(&self) -> LedgerResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let items: Vec<V> = read_json(path)?;

        let mut data = self.write()?;
        data.clear();
        data.extend(items.into_iter().map(|item| (item.key(), item)));
        self.invalidate_cache();
        Ok(())
    }

    /// Write the contents to disk; a no-op for in-memory collections
    pub(crate) fn save(&self) -> LedgerResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let items: Vec<V> = self.read()?.values().cloned().collect();
        write_json_atomic(path, &items)
    }

    pub(crate) fn get(&self, key: V::Key) -> LedgerResult<Option<V>> {
        let Some(cache) = &self.cache else {
            return Ok(self.read()?.get(&key).cloned());
        };
        if let Some(item) = cache.get(&key) {
            return Ok(Some(item));
        }

        // Filled under the read lock so a concurrent write cannot be overtaken
        let data = self.read()?;
        let item = data.get(&key).cloned();
        if let Some(item) = &item {
            cache.put(item);
        }
        Ok(item)
    }

    pub(crate) fn values(&self) -> LedgerResult<Vec<V>> {
        Ok(self.read()?.values().cloned().collect())
    }

    pub(crate) fn filter(&self, predicate: impl Fn(&V) -> bool) -> LedgerResult<Vec<V>> {
        Ok(self
            .read()?
            .values()
            .filter(|item| predicate(item))
            .cloned()
            .collect())
    }

    pub(crate) fn find(&self, predicate: impl Fn(&V) -> bool) -> LedgerResult<Option<V>> {
        Ok(self.read()?.values().find(|item| predicate(item)).cloned())
    }

    pub(crate) fn insert(&self, item: V) -> LedgerResult<()> {
        let mut data = self.write()?;
        let key = item.key();
        if data.contains_key(&key) {
            return Err(LedgerError::Duplicate {
                entity_type: V::ENTITY,
                identifier: key.to_string(),
            });
        }
        self.cache_put(&item);
        data.insert(key, item);
        Ok(())
    }

    /// Replace an existing item; fails with not-found if the key is absent
    pub(crate) fn update(&self, item: V) -> LedgerResult<()> {
        let mut data = self.write()?;
        match data.get_mut(&item.key()) {
            Some(slot) => {
                self.cache_put(&item);
                *slot = item;
                Ok(())
            }
            None => Err(LedgerError::NotFound {
                entity_type: V::ENTITY,
                identifier: item.key().to_string(),
            }),
        }
    }

    pub(crate) fn delete(&self, key: V::Key) -> LedgerResult<Option<V>> {
        let mut data = self.write()?;
        let removed = data.remove(&key);
        if let Some(cache) = &self.cache {
            cache.forget(&key);
        }
        Ok(removed)
    }

    pub(crate) fn count(&self) -> LedgerResult<usize> {
        Ok(self.read()?.len())
    }

    pub(crate) fn clear(&self) -> LedgerResult<()> {
        let mut data = self.write()?;
        data.clear();
        self.invalidate_cache();
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> LedgerResult<HashMap<V::Key, V>> {
        Ok(self.read()?.clone())
    }

    pub(crate) fn restore(&self, snapshot: HashMap<V::Key, V>) -> LedgerResult<()> {
        let mut data = self.write()?;
        *data = snapshot;
        self.invalidate_cache();
        Ok(())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, HashMap<V::Key, V>>> {
        self.data
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, HashMap<V::Key, V>>> {
        self.data
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}
