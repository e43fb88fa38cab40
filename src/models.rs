//! Budget records as stored and as exchanged with clients.
//!
//! Field names serialize in camelCase, which is both the JSON shape clients send
//! and the attribute names in the store.

use serde::{Deserialize, Serialize};

/// Derived partition key attribute of the record tables.
pub const USER_MONTH: &str = "userId#month";
/// Hash key of the Users table.
pub const USER_NAME: &str = "userName";

pub const INCOME_ITEM_NAME: &str = "incomeItemName";
pub const INCOME_ITEM_VALUE: &str = "incomeItemValue";
pub const BUDGET_ITEM_NAME: &str = "budgetItemName";
pub const BUDGET_ITEM_VALUE: &str = "budgetItemValue";
pub const EXPENSE_ITEM_NAME: &str = "expenseItemName";
pub const EXPENSE_ITEM_VALUE: &str = "expenseItemValue";
pub const EXPENSE_TAGS: &str = "expenseTags";

// `userId` and `month` default to empty so that sparse items created by an
// update of a missing key still decode; the repository fills them back in.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeItem {
    #[serde(default)]
    pub user_id: String,
    pub income_item_name: String,
    #[serde(default)]
    pub month: String,
    pub income_item_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub month: String,
    pub budget_item_name: String,
    pub budget_item_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItem {
    #[serde(default)]
    pub user_id: String,
    pub expense_item_name: String,
    #[serde(default)]
    pub month: String,
    #[serde(rename = "expenseItemValue")]
    pub expense_value: f64,
    #[serde(default)]
    pub expense_tags: Vec<String>,
}

/// Maps a user name to the id its records are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_name: String,
    pub user_id: String,
}
