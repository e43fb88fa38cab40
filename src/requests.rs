//! Request shapes accepted at the service boundary, and their validation.
//!
//! Repositories trust their inputs; everything that reaches them from a client
//! passes through here first.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{BudgetItem, ExpenseItem, IncomeItem};

/// Decodes a JSON request body; malformed bodies are validation errors.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::validation(format!("invalid request body: {e}")))
}

/// Key fields must be present and must not contain the `#` the partition key is
/// joined with.
fn require_key_field(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(format!("missing required field: {field}")));
    }
    if value.contains('#') {
        return Err(Error::validation(format!("{field} must not contain '#'")));
    }
    Ok(())
}

pub fn validate_income(item: &IncomeItem) -> Result<()> {
    require_key_field("userId", &item.user_id)?;
    require_key_field("month", &item.month)?;
    require_key_field("incomeItemName", &item.income_item_name)
}

pub fn validate_budget(item: &BudgetItem) -> Result<()> {
    require_key_field("userId", &item.user_id)?;
    require_key_field("month", &item.month)?;
    require_key_field("budgetItemName", &item.budget_item_name)
}

pub fn validate_expense(item: &ExpenseItem) -> Result<()> {
    require_key_field("userId", &item.user_id)?;
    require_key_field("month", &item.month)?;
    require_key_field("expenseItemName", &item.expense_item_name)
}

/// Body of a multi-expense add.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddExpensesRequest {
    pub expenses: Vec<ExpenseItem>,
}

impl AddExpensesRequest {
    pub fn validate(&self) -> Result<()> {
        if self.expenses.is_empty() {
            return Err(Error::validation("no expense items provided"));
        }
        self.expenses.iter().try_for_each(validate_expense)
    }
}

/// `userId`/`month` selector of a list request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub month: String,
}

impl ListQuery {
    pub fn validate(&self) -> Result<()> {
        require_key_field("userId", &self.user_id)?;
        require_key_field("month", &self.month)
    }
}

/// Address of one record, as given in an update or delete request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPath {
    pub user_id: String,
    pub month: String,
    pub name: String,
}

impl ItemPath {
    pub fn new(
        user_id: impl Into<String>,
        month: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            month: month.into(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_key_field("userId", &self.user_id)?;
        require_key_field("month", &self.month)?;
        require_key_field("itemName", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValueRequest {
    pub new_value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub new_value: f64,
    #[serde(default)]
    pub new_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn income(user: &str, month: &str, name: &str) -> IncomeItem {
        IncomeItem {
            user_id: user.to_string(),
            income_item_name: name.to_string(),
            month: month.to_string(),
            income_item_value: 1.0,
        }
    }

    #[test]
    fn test_income_validation() {
        assert!(validate_income(&income("u1", "2024-01", "salary")).is_ok());

        let err = validate_income(&income("", "2024-01", "salary")).unwrap_err();
        assert_eq!(
            err,
            Error::Validation("missing required field: userId".to_string())
        );
        assert!(validate_income(&income("u1", "", "salary")).is_err());
        assert!(validate_income(&income("u1", "2024-01", "")).is_err());
    }

    #[test]
    fn test_separator_is_rejected() {
        let err = validate_income(&income("u#1", "2024-01", "salary")).unwrap_err();
        assert_eq!(
            err,
            Error::Validation("userId must not contain '#'".to_string())
        );
        assert!(ItemPath::new("u1", "2024#01", "rent").validate().is_err());
    }

    #[test]
    fn test_add_expenses_request() {
        let request: AddExpensesRequest = decode(
            r#"{"expenses":[
                {"userId":"u1","month":"2024-01","expenseItemName":"rent","expenseItemValue":900},
                {"userId":"u1","month":"2024-01","expenseItemName":"gym","expenseItemValue":40,"expenseTags":["health"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(request.expenses.len(), 2);
        request.validate().unwrap();

        let empty: AddExpensesRequest = decode(r#"{"expenses":[]}"#).unwrap();
        assert_eq!(
            empty.validate().unwrap_err(),
            Error::Validation("no expense items provided".to_string())
        );

        let missing_name: AddExpensesRequest = decode(
            r#"{"expenses":[{"userId":"u1","month":"2024-01","expenseItemName":"","expenseItemValue":1}]}"#,
        )
        .unwrap();
        assert!(missing_name.validate().is_err());
    }

    #[test]
    fn test_list_query_requires_both_fields() {
        let query: ListQuery = decode(r#"{"userId":"u1"}"#).unwrap();
        assert_eq!(
            query.validate().unwrap_err(),
            Error::Validation("missing required field: month".to_string())
        );
    }

    #[test]
    fn test_update_requests() {
        let value: UpdateValueRequest = decode(r#"{"newValue":5500}"#).unwrap();
        assert_eq!(value.new_value, 5500.0);

        let expense: UpdateExpenseRequest =
            decode(r#"{"newValue":12.5,"newTags":["a","b"]}"#).unwrap();
        assert_eq!(expense.new_tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_malformed_body_is_client_error() {
        let err = decode::<UpdateValueRequest>("{not json").unwrap_err();
        assert!(err.is_client_error());
        let err = decode::<LoginRequest>(r#"{"username":"alice"}"#).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_register_request() {
        let request: RegisterRequest =
            decode(r#"{"username":"alice","password":"pw","email":"a@example.com"}"#).unwrap();
        assert_eq!(request.email, "a@example.com");
    }
}
