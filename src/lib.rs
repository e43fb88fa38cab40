//! Storage layer of a personal budget tracker.
//!
//! Income, budget and expense records are filed per user and month in DynamoDB
//! tables partitioned by `<userId>#<month>` and sorted by item name. The
//! [`repository`] module exposes typed add/list/update/delete operations on top of
//! a [`store::RecordStore`], which is either DynamoDB or an in-memory store.

pub mod accounts;
pub mod auth;
pub mod config;
pub mod console;
pub mod dynamodb;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod requests;
pub mod store;
mod utils;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
