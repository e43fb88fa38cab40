//! In-memory record store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::{Key, RecordStore};
use crate::dynamodb::{Item, Table};
use crate::error::{Error, Result};

type Collection = BTreeMap<Key, Item>;

/// In-memory storage backend.
///
/// Collections are created on first write and keyed by table name. Items are kept
/// ordered by key, so queries return items in sort key order like DynamoDB does.
/// Data is not persisted and is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    chunk_log: Arc<Mutex<Vec<usize>>>,
    failing_chunk: Option<usize>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the chunk write with this zero-based index (counted over the store's
    /// lifetime) fail without writing anything.
    pub fn with_failing_chunk(mut self, index: usize) -> Self {
        self.failing_chunk = Some(index);
        self
    }

    /// Sizes of every chunk write attempted so far, in order.
    pub async fn chunk_sizes(&self) -> Vec<usize> {
        self.chunk_log.lock().await.clone()
    }

    fn require_key(table: &Table, item: &Item, operation: &'static str) -> Result<Key> {
        table.key_of(item).ok_or_else(|| Error::StoreUnavailable {
            operation,
            table: table.name().to_string(),
            key: None,
            message: "item is missing its key attributes".to_string(),
        })
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn put(&self, table: &Table, item: Item) -> Result<()> {
        let key = Self::require_key(table, &item, "PutItem")?;
        let mut collections = self.collections.write().await;
        collections
            .entry(table.name().to_string())
            .or_default()
            .insert(key, item);
        Ok(())
    }

    async fn query(&self, table: &Table, partition: &str) -> Result<Vec<Item>> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(table.name()) else {
            return Ok(Vec::new());
        };

        let start = Key::new(partition, None::<String>);
        Ok(collection
            .range(start..)
            .take_while(|(key, _)| key.partition == partition)
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn update(&self, table: &Table, key: &Key, updates: Item) -> Result<()> {
        if updates.attributes.is_empty() {
            return Err(Error::validation("update names no attributes"));
        }

        let mut collections = self.collections.write().await;
        let collection = collections.entry(table.name().to_string()).or_default();
        let item = collection.entry(key.clone()).or_insert_with(|| {
            debug!("Update of missing key '{key}' creates a sparse item");
            table.key_item(key)
        });
        item.merge(updates);
        Ok(())
    }

    async fn delete(&self, table: &Table, key: &Key) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(collection) = collections.get_mut(table.name()) {
            collection.remove(key);
        }
        Ok(())
    }

    async fn write_chunk(&self, table: &Table, items: Vec<Item>) -> Result<()> {
        let attempt = {
            let mut log = self.chunk_log.lock().await;
            log.push(items.len());
            log.len() - 1
        };

        if self.failing_chunk == Some(attempt) {
            return Err(Error::StoreUnavailable {
                operation: "BatchWriteItem",
                table: table.name().to_string(),
                key: None,
                message: format!("injected failure on chunk {attempt}"),
            });
        }

        let keyed = items
            .into_iter()
            .map(|item| Self::require_key(table, &item, "BatchWriteItem").map(|key| (key, item)))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        if let Some((key, _)) = keyed.iter().find(|(key, _)| !seen.insert(key)) {
            return Err(Error::StoreUnavailable {
                operation: "BatchWriteItem",
                table: table.name().to_string(),
                key: Some(key.to_string()),
                message: "provided list of item keys contains duplicates".to_string(),
            });
        }

        let mut collections = self.collections.write().await;
        collections
            .entry(table.name().to_string())
            .or_default()
            .extend(keyed);
        Ok(())
    }
}
