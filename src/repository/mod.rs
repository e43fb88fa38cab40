//! Typed repositories over the record store.
//!
//! One generic [`Repository`] serves all three record types; [`BudgetRecord`]
//! supplies what differs between them (table, key fields, updatable attributes).
//! Every record lives in the partition `<userId>#<month>` under its item name.

mod users;

pub use users::UserRepository;

use serde::{de::DeserializeOwned, Serialize};
use std::collections::hash_map::{Entry, HashMap};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

use crate::dynamodb::{Item, Table, Tables};
use crate::error::{Error, Result};
use crate::models::{
    BudgetItem, ExpenseItem, IncomeItem, BUDGET_ITEM_VALUE, EXPENSE_ITEM_VALUE, EXPENSE_TAGS,
    INCOME_ITEM_VALUE, USER_MONTH,
};
use crate::store::{BatchSummary, Key, RecordStore};

/// Composite partition key of a user's records for one month.
///
/// Plain concatenation: ids or months containing `#` can collide.
pub fn partition_key(user_id: &str, month: &str) -> String {
    format!("{user_id}#{month}")
}

pub trait BudgetRecord: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The change an update applies.
    type Update: Send;

    fn table(tables: &Tables) -> &Table;

    fn user_id(&self) -> &str;

    fn month(&self) -> &str;

    fn name(&self) -> &str;

    /// Restores `userId`/`month` on a record decoded from a sparse item.
    fn fill_owner(&mut self, user_id: &str, month: &str);

    /// Attributes to `SET` for an update; nothing else on the item is touched.
    fn update_attributes(update: Self::Update) -> Item;
}

/// New value and tags for an expense update. Both are always written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseUpdate {
    pub value: f64,
    pub tags: Vec<String>,
}

impl BudgetRecord for IncomeItem {
    type Update = f64;

    fn table(tables: &Tables) -> &Table {
        &tables.income
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn month(&self) -> &str {
        &self.month
    }

    fn name(&self) -> &str {
        &self.income_item_name
    }

    fn fill_owner(&mut self, user_id: &str, month: &str) {
        fill_if_empty(&mut self.user_id, user_id);
        fill_if_empty(&mut self.month, month);
    }

    fn update_attributes(value: f64) -> Item {
        Item::new().set_number(INCOME_ITEM_VALUE, value)
    }
}

impl BudgetRecord for BudgetItem {
    type Update = f64;

    fn table(tables: &Tables) -> &Table {
        &tables.budget
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn month(&self) -> &str {
        &self.month
    }

    fn name(&self) -> &str {
        &self.budget_item_name
    }

    fn fill_owner(&mut self, user_id: &str, month: &str) {
        fill_if_empty(&mut self.user_id, user_id);
        fill_if_empty(&mut self.month, month);
    }

    fn update_attributes(value: f64) -> Item {
        Item::new().set_number(BUDGET_ITEM_VALUE, value)
    }
}

impl BudgetRecord for ExpenseItem {
    type Update = ExpenseUpdate;

    fn table(tables: &Tables) -> &Table {
        &tables.expenses
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn month(&self) -> &str {
        &self.month
    }

    fn name(&self) -> &str {
        &self.expense_item_name
    }

    fn fill_owner(&mut self, user_id: &str, month: &str) {
        fill_if_empty(&mut self.user_id, user_id);
        fill_if_empty(&mut self.month, month);
    }

    fn update_attributes(update: ExpenseUpdate) -> Item {
        Item::new()
            .set_number(EXPENSE_ITEM_VALUE, update.value)
            .set_string_list(EXPENSE_TAGS, update.tags)
    }
}

fn fill_if_empty(field: &mut String, value: &str) {
    if field.is_empty() {
        *field = value.to_string();
    }
}

/// Repository for one record type, sharing an injected store handle.
pub struct Repository<T> {
    store: Arc<dyn RecordStore>,
    table: Table,
    _record: PhantomData<fn() -> T>,
}

pub type IncomeRepository = Repository<IncomeItem>;
pub type BudgetRepository = Repository<BudgetItem>;
pub type ExpenseRepository = Repository<ExpenseItem>;

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            table: self.table.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: BudgetRecord> Repository<T> {
    pub fn new(store: Arc<dyn RecordStore>, tables: &Tables) -> Self {
        Self {
            store,
            table: T::table(tables).clone(),
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    fn key(&self, user_id: &str, month: &str, name: &str) -> Key {
        Key::new(partition_key(user_id, month), Some(name))
    }

    /// Marshals a record and stamps the derived partition key onto it.
    fn to_item(&self, record: &T) -> Result<Item> {
        let item = Item::from_record(record).map_err(|e| Error::Marshal {
            table: self.table.name().to_string(),
            message: e.to_string(),
        })?;
        self.require_finite(
            item.set_string(USER_MONTH, partition_key(record.user_id(), record.month())),
        )
    }

    /// DynamoDB has no representation for NaN or infinities.
    fn require_finite(&self, item: Item) -> Result<Item> {
        if let Some(name) = item.non_finite_number() {
            return Err(Error::Marshal {
                table: self.table.name().to_string(),
                message: format!("attribute '{name}' is not a finite number"),
            });
        }
        Ok(item)
    }

    /// Stores a record, replacing any record with the same user, month and name.
    ///
    /// The key fields are expected to be validated by the caller.
    pub async fn add(&self, record: &T) -> Result<()> {
        let item = self.to_item(record)?;
        self.store.put(&self.table, item).await?;
        info!(
            "Added '{}' for {}#{} to '{}'",
            record.name(),
            record.user_id(),
            record.month(),
            self.table.name()
        );
        Ok(())
    }

    /// All records of a user for a month, in the order the store returns them.
    pub async fn get_all(&self, user_id: &str, month: &str) -> Result<Vec<T>> {
        let items = self
            .store
            .query(&self.table, &partition_key(user_id, month))
            .await?;

        items
            .iter()
            .map(|item| {
                let mut record: T = item.to_record().map_err(|e| Error::Unmarshal {
                    table: self.table.name().to_string(),
                    message: e.to_string(),
                })?;
                record.fill_owner(user_id, month);
                Ok(record)
            })
            .collect()
    }

    /// Applies `update` to one record. Updating a missing record creates a sparse one.
    pub async fn update(
        &self,
        user_id: &str,
        month: &str,
        name: &str,
        update: T::Update,
    ) -> Result<()> {
        let key = self.key(user_id, month, name);
        let updates = self.require_finite(T::update_attributes(update))?;
        self.store.update(&self.table, &key, updates).await?;
        info!("Updated '{key}' in '{}'", self.table.name());
        Ok(())
    }

    /// Removes one record; removing a missing record succeeds.
    pub async fn delete(&self, user_id: &str, month: &str, name: &str) -> Result<()> {
        let key = self.key(user_id, month, name);
        self.store.delete(&self.table, &key).await?;
        info!("Deleted '{key}' from '{}'", self.table.name());
        Ok(())
    }
}

impl Repository<ExpenseItem> {
    /// Stores many expenses, possibly for several users and months, in chunked
    /// batch writes. See [`RecordStore::batch_put`] for failure semantics.
    ///
    /// A batch request may not name a key twice, so expenses sharing a user, month
    /// and name collapse to the last of them, as sequential adds would.
    pub async fn add_batch(&self, records: &[ExpenseItem]) -> Result<BatchSummary> {
        let mut items: Vec<Item> = Vec::with_capacity(records.len());
        let mut positions: HashMap<Key, usize> = HashMap::new();

        for record in records {
            let item = self.to_item(record)?;
            let key = self.key(&record.user_id, &record.month, &record.expense_item_name);
            match positions.entry(key) {
                Entry::Occupied(slot) => {
                    debug!("Expense '{}' repeated in batch; keeping the later one", slot.key());
                    items[*slot.get()] = item;
                }
                Entry::Vacant(slot) => {
                    slot.insert(items.len());
                    items.push(item);
                }
            }
        }

        self.store.batch_put(&self.table, items).await
    }
}
