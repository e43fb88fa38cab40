//! # DynamoDB Module
//!
//! The DynamoDB backend of the record store, plus the item and table types both
//! backends share.
//!
//! ## Components
//!
//! - `DynamoDb`: the SDK client wrapper implementing `RecordStore`, plus table provisioning.
//! - `Item`: a record as a map of attribute names to DynamoDB values.
//! - `Table` / `Tables`: table names and key attributes of the budget collections.
//!
//! ## Usage
//!
//! Credentials and region come from the standard AWS environment:
//!
//! - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`
//! - `AWS_SESSION_TOKEN` for temporary credentials
//! - `AWS_ENDPOINT_URL` for a custom endpoint (e.g., DynamoDB Local)
//!
//! ## Example
//!
//! ```no_run
//! use budget_store::dynamodb::{DynamoDb, Tables};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = aws_config::load_from_env().await;
//!     let ddb = DynamoDb::new(&config);
//!
//!     for table in Tables::default().all() {
//!         if ddb.create_table_if_not_exists(table).await?.is_some() {
//!             ddb.wait_until_active(table.name()).await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod item;
mod table;

pub use client::DynamoDb;
pub use item::Item;
pub use table::{Table, Tables};
