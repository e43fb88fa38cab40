use std::sync::Arc;
use tracing::info;

use crate::dynamodb::{Item, Table, Tables};
use crate::error::{Error, Result};
use crate::models::UserRecord;
use crate::store::RecordStore;

/// User name to user id lookups over the hash-only Users table.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn RecordStore>,
    table: Table,
}

impl UserRepository {
    pub fn new(store: Arc<dyn RecordStore>, tables: &Tables) -> Self {
        Self {
            store,
            table: tables.users.clone(),
        }
    }

    /// Stores (or replaces) the mapping for `user.user_name`.
    pub async fn create(&self, user: &UserRecord) -> Result<()> {
        let item = Item::from_record(user).map_err(|e| Error::Marshal {
            table: self.table.name().to_string(),
            message: e.to_string(),
        })?;
        self.store.put(&self.table, item).await?;
        info!("Stored user '{}'", user.user_name);
        Ok(())
    }

    pub async fn find_user_id(&self, user_name: &str) -> Result<Option<String>> {
        let items = self.store.query(&self.table, user_name).await?;
        let Some(item) = items.first() else {
            return Ok(None);
        };
        let user: UserRecord = item.to_record().map_err(|e| Error::Unmarshal {
            table: self.table.name().to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(user.user_id))
    }
}
