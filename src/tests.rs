//! Integration tests against a live DynamoDB.
//!
//! These tests cover the repositories end to end on the DynamoDB backend:
//! - Table provisioning
//! - Add / get_all / update / delete of income records
//! - Expense batch writes spanning more than one chunk
//! - Update of a missing key (sparse item) and idempotent delete
//!
//! # Setup
//!
//! They need AWS credentials in the environment or a `.env` file:
//!
//! ```text
//! AWS_ACCESS_KEY_ID=your_access_key
//! AWS_SECRET_ACCESS_KEY=your_secret_key
//! AWS_REGION=your_preferred_region
//! ```
//!
//! For DynamoDB Local, use dummy credentials and set:
//!
//! ```text
//! AWS_ENDPOINT_URL=http://localhost:8000
//! ```
//!
//! Tables are prefixed with `test-` and created on first use.
//!
//! # Running Tests
//!
//! They are ignored by default:
//!
//! ```text
//! cargo test -- --ignored
//! ```
//!
//! Note: These tests may incur AWS charges if run against a real DynamoDB instance.

use crate::dynamodb::{DynamoDb, Tables};
use crate::models::{ExpenseItem, IncomeItem};
use crate::repository::{ExpenseRepository, ExpenseUpdate, IncomeRepository};
use crate::store::{BatchSummary, RecordStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

fn test_tables() -> Tables {
    Tables::new("test-Users", "test-Income", "test-Budget", "test-Expenses")
}

#[instrument]
async fn setup() -> Result<(Arc<dyn RecordStore>, Tables)> {
    dotenv::dotenv().ok();
    let sdk_config = aws_config::load_from_env().await;
    let ddb = DynamoDb::new(&sdk_config);
    let tables = test_tables();

    for table in tables.all() {
        if ddb.create_table_if_not_exists(table).await?.is_some() {
            ddb.wait_until_active(table.name()).await?;
        }
    }
    info!("Test tables ready");

    Ok((Arc::new(ddb), tables))
}

/// Unique per run so reruns never see stale items.
fn test_user() -> String {
    format!("test-{}", Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires DynamoDB"]
async fn test_income_lifecycle() -> Result<()> {
    let (store, tables) = setup().await?;
    let repo = IncomeRepository::new(store, &tables);
    let user = test_user();

    let salary = IncomeItem {
        user_id: user.clone(),
        income_item_name: "salary".to_string(),
        month: "2024-01".to_string(),
        income_item_value: 5000.0,
    };
    repo.add(&salary).await?;
    assert_eq!(repo.get_all(&user, "2024-01").await?, vec![salary.clone()]);

    repo.update(&user, "2024-01", "salary", 5500.0).await?;
    let items = repo.get_all(&user, "2024-01").await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].income_item_value, 5500.0);
    assert_eq!(items[0].month, "2024-01");
    assert_eq!(items[0].user_id, user);

    repo.delete(&user, "2024-01", "salary").await?;
    repo.delete(&user, "2024-01", "salary").await?;
    assert!(repo.get_all(&user, "2024-01").await?.is_empty());
    Ok(())
}

#[tokio::test]
#[ignore = "requires DynamoDB"]
async fn test_expense_batch_and_sparse_update() -> Result<()> {
    let (store, tables) = setup().await?;
    let repo = ExpenseRepository::new(store, &tables);
    let user = test_user();

    let expenses: Vec<ExpenseItem> = (0..40)
        .map(|i| ExpenseItem {
            user_id: user.clone(),
            expense_item_name: format!("item-{i:02}"),
            month: "2024-03".to_string(),
            expense_value: i as f64,
            expense_tags: vec!["test".to_string()],
        })
        .collect();

    let summary = repo.add_batch(&expenses).await?;
    assert_eq!(summary, BatchSummary { chunks: 2, items: 40 });
    assert_eq!(repo.get_all(&user, "2024-03").await?, expenses);

    repo.update(
        &user,
        "2024-04",
        "ghost",
        ExpenseUpdate {
            value: 1.0,
            tags: vec![],
        },
    )
    .await?;
    let sparse = repo.get_all(&user, "2024-04").await?;
    assert_eq!(sparse.len(), 1);
    assert_eq!(sparse[0].user_id, user);

    for expense in &expenses {
        repo.delete(&user, "2024-03", &expense.expense_item_name).await?;
    }
    repo.delete(&user, "2024-04", "ghost").await?;
    Ok(())
}
