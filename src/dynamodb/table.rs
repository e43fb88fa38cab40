use crate::dynamodb::Item;
use crate::models::{
    BUDGET_ITEM_NAME, EXPENSE_ITEM_NAME, INCOME_ITEM_NAME, USER_MONTH, USER_NAME,
};
use crate::store::Key;

/// DynamoDB table configuration.
///
/// A table (collection) is identified by its name and addressed by a partition
/// key attribute plus an optional sort key attribute. All key attributes in this
/// system are strings.
///
/// # Example
///
/// ```
/// use budget_store::dynamodb::Table;
///
/// let table = Table::new("Income", "userId#month", Some("incomeItemName"));
/// assert_eq!(table.sort_key(), Some("incomeItemName"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    partition_key: &'static str,
    sort_key: Option<&'static str>,
}

impl Table {
    /// Creates a new `Table` instance.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the DynamoDB table.
    /// * `partition_key` - The name of the partition key attribute.
    /// * `sort_key` - The name of the sort key attribute, if any.
    pub fn new(
        name: impl Into<String>,
        partition_key: &'static str,
        sort_key: Option<&'static str>,
    ) -> Self {
        Self {
            name: name.into(),
            partition_key,
            sort_key,
        }
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the partition key of the table.
    pub fn partition_key(&self) -> &'static str {
        self.partition_key
    }

    /// Returns the sort key of the table, if any.
    pub fn sort_key(&self) -> Option<&'static str> {
        self.sort_key
    }

    /// Builds the key-only item DynamoDB expects for `GetItem`/`UpdateItem`/`DeleteItem`.
    pub fn key_item(&self, key: &Key) -> Item {
        let item = Item::new().set_string(self.partition_key, key.partition.as_str());
        match (self.sort_key, &key.sort) {
            (Some(attr), Some(sort)) => item.set_string(attr, sort.as_str()),
            _ => item,
        }
    }

    /// Extracts the primary key of a full item, if the key attributes are present.
    pub fn key_of(&self, item: &Item) -> Option<Key> {
        let partition = item.get_string(self.partition_key)?.clone();
        let sort = match self.sort_key {
            Some(attr) => Some(item.get_string(attr)?.clone()),
            None => None,
        };
        Some(Key { partition, sort })
    }
}

/// The four collections of the budget system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub users: Table,
    pub income: Table,
    pub budget: Table,
    pub expenses: Table,
}

impl Tables {
    pub fn new(
        users: impl Into<String>,
        income: impl Into<String>,
        budget: impl Into<String>,
        expenses: impl Into<String>,
    ) -> Self {
        Self {
            users: Table::new(users, USER_NAME, None),
            income: Table::new(income, USER_MONTH, Some(INCOME_ITEM_NAME)),
            budget: Table::new(budget, USER_MONTH, Some(BUDGET_ITEM_NAME)),
            expenses: Table::new(expenses, USER_MONTH, Some(EXPENSE_ITEM_NAME)),
        }
    }

    pub fn all(&self) -> [&Table; 4] {
        [&self.users, &self.income, &self.budget, &self.expenses]
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::new("Users", "Income", "Budget", "Expenses")
    }
}
