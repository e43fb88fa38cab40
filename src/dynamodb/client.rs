use anyhow::{anyhow, Result as AnyResult};
use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::DisplayErrorContext,
    operation::{create_table::CreateTableOutput, describe_table::DescribeTableOutput},
    types::{
        AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType, PutRequest,
        ScalarAttributeType, TableStatus, WriteRequest,
    },
    Client,
};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::dynamodb::{Item, Table};
use crate::error::{Error, Result};
use crate::store::{Key, RecordStore, BATCH_WRITE_LIMIT};
use crate::utils::retry_with_backoff;

/// DynamoDB-backed [`RecordStore`].
///
/// Wraps one SDK [`Client`], which is cheap to clone and safe to share between
/// concurrent requests; build it once at startup and inject it wherever a store
/// is needed.
///
/// Record operations map one to one onto DynamoDB calls:
///
/// - **put** → `PutItem` (full replacement)
/// - **query** → `Query` on the partition key, following `LastEvaluatedKey`
/// - **update** → `UpdateItem` with a `SET` expression (creates the item if missing)
/// - **delete** → `DeleteItem` (idempotent)
/// - **write_chunk** → `BatchWriteItem` with at most 25 put requests
///
/// Every SDK failure becomes [`Error::StoreUnavailable`] carrying the operation,
/// table and key. Nothing is retried.
///
/// The table management methods (`check_auth`, `create_table_if_not_exists`,
/// `wait_until_active`) are administrative and return `anyhow` errors.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    client: Client,
}

fn unavailable<E>(
    operation: &'static str,
    table: &Table,
    key: Option<&Key>,
) -> impl FnOnce(E) -> Error
where
    E: std::error::Error,
{
    let table = table.name().to_string();
    let key = key.map(ToString::to_string);
    move |e| {
        let message = DisplayErrorContext(&e).to_string();
        error!("{operation} on '{table}' failed: {message}");
        Error::StoreUnavailable {
            operation,
            table,
            key,
            message,
        }
    }
}

impl DynamoDb {
    /// Creates a new `DynamoDb` instance.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    /// Verifies authentication by attempting to list tables.
    pub async fn check_auth(&self) -> AnyResult<()> {
        self.client.list_tables().send().await.map_err(|e| {
            error!("Authentication failed: {}", DisplayErrorContext(&e));
            anyhow!("Authentication failed")
        })?;
        info!("Authentication successful");
        Ok(())
    }

    // --- Table Operations ---

    /// Creates a table with on-demand billing if it doesn't exist.
    ///
    /// All key attributes are strings.
    pub async fn create_table_if_not_exists(
        &self,
        table: &Table,
    ) -> AnyResult<Option<CreateTableOutput>> {
        if self.table_exists(table.name()).await? {
            info!("Table '{}' exists", table.name());
            return Ok(None);
        }

        let mut attribute_definitions = vec![AttributeDefinition::builder()
            .attribute_name(table.partition_key())
            .attribute_type(ScalarAttributeType::S)
            .build()?];

        let mut key_schema = vec![KeySchemaElement::builder()
            .attribute_name(table.partition_key())
            .key_type(KeyType::Hash)
            .build()?];

        if let Some(sort_key) = table.sort_key() {
            attribute_definitions.push(
                AttributeDefinition::builder()
                    .attribute_name(sort_key)
                    .attribute_type(ScalarAttributeType::S)
                    .build()?,
            );
            key_schema.push(
                KeySchemaElement::builder()
                    .attribute_name(sort_key)
                    .key_type(KeyType::Range)
                    .build()?,
            );
        }

        let output = self
            .client
            .create_table()
            .table_name(table.name())
            .billing_mode(BillingMode::PayPerRequest)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .send()
            .await?;
        info!("Table '{}' created", table.name());
        Ok(Some(output))
    }

    /// Checks if a table exists.
    pub async fn table_exists(&self, table_name: &str) -> AnyResult<bool> {
        let mut start = None;
        loop {
            let response = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start)
                .send()
                .await?;
            if response.table_names().iter().any(|t| t == table_name) {
                return Ok(true);
            }
            start = response.last_evaluated_table_name;
            if start.is_none() {
                return Ok(false);
            }
        }
    }

    /// Retrieves table description.
    pub async fn describe_table(&self, table_name: &str) -> AnyResult<DescribeTableOutput> {
        self.client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(Into::into)
    }

    /// Polls the table with Fibonacci backoff until its status is `ACTIVE`.
    pub async fn wait_until_active(&self, table_name: &str) -> AnyResult<()> {
        retry_with_backoff(
            move || self.ensure_active(table_name),
            Duration::from_secs(1),
            8,
        )
        .await?;
        info!("Table '{table_name}' is active");
        Ok(())
    }

    async fn ensure_active(&self, table_name: &str) -> AnyResult<()> {
        let description = self.describe_table(table_name).await?;
        match description.table().and_then(|t| t.table_status()) {
            Some(TableStatus::Active) => Ok(()),
            status => Err(anyhow!("table '{table_name}' status is {status:?}")),
        }
    }

    /// One `Query` page of a partition, starting after `start`.
    async fn query_page(
        &self,
        table: &Table,
        partition: &str,
        start: Option<LastKey>,
    ) -> Result<(Vec<Item>, Option<LastKey>)> {
        let response = self
            .client
            .query()
            .table_name(table.name())
            .key_condition_expression("#pk = :pkval")
            .expression_attribute_names("#pk", table.partition_key())
            .expression_attribute_values(":pkval", AttributeValue::S(partition.to_string()))
            .set_exclusive_start_key(start)
            .send()
            .await
            .map_err(unavailable(
                "Query",
                table,
                Some(&Key::new(partition, None::<String>)),
            ))?;

        let items = response
            .items
            .unwrap_or_default()
            .into_iter()
            .map(Item::from)
            .collect();
        Ok((items, response.last_evaluated_key))
    }
}

type LastKey = HashMap<String, AttributeValue>;

/// Fetches pages until one comes back without a `LastEvaluatedKey`, passing each
/// page's key as the start of the next.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Item>>
where
    F: FnMut(Option<LastKey>) -> Fut,
    Fut: Future<Output = Result<(Vec<Item>, Option<LastKey>)>>,
{
    let mut items = Vec::new();
    let mut start = None;

    loop {
        let (page, last_evaluated_key) = fetch_page(start).await?;
        items.extend(page);

        match last_evaluated_key {
            Some(key) if !key.is_empty() => start = Some(key),
            _ => break,
        }
    }

    Ok(items)
}

/// A `SET` update expression with `#attrN`/`:valN` placeholders.
#[derive(Debug, PartialEq)]
struct UpdateExpression {
    expression: String,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl UpdateExpression {
    /// Placeholders are numbered in attribute name order.
    fn set(updates: Item) -> Result<Self> {
        if updates.attributes.is_empty() {
            return Err(Error::validation("update names no attributes"));
        }

        let mut attributes: Vec<_> = updates.attributes.into_iter().collect();
        attributes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut assignments = Vec::with_capacity(attributes.len());
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        for (i, (attr_name, attr_value)) in attributes.into_iter().enumerate() {
            let placeholder = format!("#attr{}", i);
            let value_placeholder = format!(":val{}", i);

            assignments.push(format!("{} = {}", placeholder, value_placeholder));
            names.insert(placeholder, attr_name);
            values.insert(value_placeholder, attr_value);
        }

        Ok(Self {
            expression: format!("SET {}", assignments.join(", ")),
            names,
            values,
        })
    }
}

#[async_trait]
impl RecordStore for DynamoDb {
    async fn put(&self, table: &Table, item: Item) -> Result<()> {
        let key = table.key_of(&item);
        self.client
            .put_item()
            .table_name(table.name())
            .set_item(Some(item.attributes))
            .send()
            .await
            .map_err(unavailable("PutItem", table, key.as_ref()))?;

        debug!("Item added to '{}'", table.name());
        Ok(())
    }

    async fn query(&self, table: &Table, partition: &str) -> Result<Vec<Item>> {
        let items = collect_pages(|start| self.query_page(table, partition, start)).await?;

        debug!(
            "Query on '{}' for '{partition}' returned {} items",
            table.name(),
            items.len()
        );
        Ok(items)
    }

    async fn update(&self, table: &Table, key: &Key, updates: Item) -> Result<()> {
        let expression = UpdateExpression::set(updates)?;

        self.client
            .update_item()
            .table_name(table.name())
            .set_key(Some(table.key_item(key).attributes))
            .update_expression(expression.expression)
            .set_expression_attribute_names(Some(expression.names))
            .set_expression_attribute_values(Some(expression.values))
            .send()
            .await
            .map_err(unavailable("UpdateItem", table, Some(key)))?;

        debug!("Item '{key}' updated in '{}'", table.name());
        Ok(())
    }

    async fn delete(&self, table: &Table, key: &Key) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table.name())
            .set_key(Some(table.key_item(key).attributes))
            .send()
            .await
            .map_err(unavailable("DeleteItem", table, Some(key)))?;

        debug!("Item '{key}' deleted from '{}'", table.name());
        Ok(())
    }

    async fn write_chunk(&self, table: &Table, items: Vec<Item>) -> Result<()> {
        debug_assert!(items.len() <= BATCH_WRITE_LIMIT);

        let requests = items
            .into_iter()
            .map(|item| {
                PutRequest::builder()
                    .set_item(Some(item.attributes))
                    .build()
                    .map(|put| WriteRequest::builder().put_request(put).build())
                    .map_err(|e| Error::Marshal {
                        table: table.name().to_string(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table.name(), requests)
            .send()
            .await
            .map_err(unavailable("BatchWriteItem", table, None))?;

        let unprocessed: usize = output
            .unprocessed_items()
            .map(|tables| tables.values().map(Vec::len).sum())
            .unwrap_or(0);
        if unprocessed > 0 {
            return Err(Error::StoreUnavailable {
                operation: "BatchWriteItem",
                table: table.name().to_string(),
                key: None,
                message: format!("{unprocessed} item(s) left unprocessed"),
            });
        }

        Ok(())
    }
}
