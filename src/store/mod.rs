//! # Record Store
//!
//! Generic keyed storage over the budget collections. Every collection is
//! addressed by a partition key and, for record tables, a sort key; callers never
//! see pagination and never get a "not found" error.
//!
//! Two backends implement [`RecordStore`]:
//!
//! - [`crate::dynamodb::DynamoDb`], talking to Amazon DynamoDB.
//! - [`InMemoryStore`], a process-local store used by tests and local runs.
//!
//! Batch writes are chunked by the trait itself (see [`RecordStore::batch_put`]),
//! so both backends share the same chunking and partial-failure reporting.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use std::fmt;
use tracing::{error, info};

use crate::dynamodb::{Item, Table};
use crate::error::{Error, Result};

/// Most put requests DynamoDB accepts in one `BatchWriteItem` call.
pub const BATCH_WRITE_LIMIT: usize = 25;

/// Full primary key of one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub partition: String,
    pub sort: Option<String>,
}

impl Key {
    pub fn new<S: Into<String>>(partition: impl Into<String>, sort: Option<S>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.map(Into::into),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sort {
            Some(sort) => write!(f, "{}/{}", self.partition, sort),
            None => write!(f, "{}", self.partition),
        }
    }
}

/// What a successful [`RecordStore::batch_put`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub chunks: usize,
    pub items: usize,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes one item, replacing any item with the same key.
    async fn put(&self, table: &Table, item: Item) -> Result<()>;

    /// Returns every item in one partition, all pages concatenated, in sort key order.
    async fn query(&self, table: &Table, partition: &str) -> Result<Vec<Item>>;

    /// Sets the attributes named in `updates` on the item at `key`.
    ///
    /// A missing item is created holding only the key and the updated attributes.
    async fn update(&self, table: &Table, key: &Key, updates: Item) -> Result<()>;

    /// Removes the item at `key`. Removing a missing item succeeds.
    async fn delete(&self, table: &Table, key: &Key) -> Result<()>;

    /// Writes up to [`BATCH_WRITE_LIMIT`] items in a single backend request.
    async fn write_chunk(&self, table: &Table, items: Vec<Item>) -> Result<()>;

    /// Writes `items` in sequential chunks of at most [`BATCH_WRITE_LIMIT`].
    ///
    /// Not atomic. The first failing chunk stops the batch with
    /// [`Error::PartialBatchFailure`], which reports how many chunks and items
    /// were committed before it; nothing is rolled back.
    async fn batch_put(&self, table: &Table, items: Vec<Item>) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let mut remaining = items.into_iter().peekable();

        while remaining.peek().is_some() {
            let chunk: Vec<Item> = remaining.by_ref().take(BATCH_WRITE_LIMIT).collect();
            let len = chunk.len();

            if let Err(e) = self.write_chunk(table, chunk).await {
                error!(
                    "Batch write to '{}' failed at chunk {} ({} items already committed): {}",
                    table.name(),
                    summary.chunks,
                    summary.items,
                    e
                );
                return Err(Error::PartialBatchFailure {
                    table: table.name().to_string(),
                    committed_chunks: summary.chunks,
                    committed_items: summary.items,
                    message: e.to_string(),
                });
            }

            summary.chunks += 1;
            summary.items += len;
        }

        info!(
            "Batch of {} items written to '{}' in {} chunk(s)",
            summary.items,
            table.name(),
            summary.chunks
        );
        Ok(summary)
    }
}
