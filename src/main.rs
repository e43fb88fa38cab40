use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use budget_store::config::{Config, StoreBackend};
use budget_store::console::Console;
use budget_store::dynamodb::{DynamoDb, Tables};
use budget_store::logging;
use budget_store::repository::{BudgetRepository, ExpenseRepository, IncomeRepository};
use budget_store::store::{InMemoryStore, RecordStore};

/// Creates any missing table and waits for new ones to become active.
async fn provision_tables(ddb: &DynamoDb, tables: &Tables) -> Result<()> {
    for table in tables.all() {
        if let Some(output) = ddb.create_table_if_not_exists(table).await? {
            if let Some(description) = output.table_description() {
                info!("Table status: {:?}", description.table_status());
            }
            ddb.wait_until_active(table.name()).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    logging::init_logging(config.log_level)?;

    let store: Arc<dyn RecordStore> = match config.backend {
        StoreBackend::DynamoDb => {
            let sdk_config = aws_config::load_from_env().await;
            let ddb = DynamoDb::new(&sdk_config);
            ddb.check_auth().await?;
            provision_tables(&ddb, &config.tables).await?;
            Arc::new(ddb)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; records are lost on exit");
            Arc::new(InMemoryStore::new())
        }
    };

    let console = Console::new(
        IncomeRepository::new(Arc::clone(&store), &config.tables),
        BudgetRepository::new(Arc::clone(&store), &config.tables),
        ExpenseRepository::new(store, &config.tables),
    );
    console.run().await
}
