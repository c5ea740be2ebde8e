//! DynamoDB helpers: table paging, attribute updates and batched writes and
//! reads with retry of unprocessed entries.

use std::collections::HashMap;

use crate::{
    batch::{BatchPolicy, BatchResponse, BulkError, BulkResult, partition, submit_batches},
    error::{Error, Result},
    paginate::{Page, Paginator},
    types::dynamodb::{
        AttributeValue, BatchGetItemInput, BatchGetItemOutput, BatchWriteItemInput,
        BatchWriteItemOutput, Item, ItemPage, KeysAndAttributes, QueryInput, ScanInput,
        UpdateItemInput, UpdateItemOutput, WriteRequest,
    },
};

/// Requests per `BatchWriteItem` call.
pub const BATCH_WRITE_LIMIT: usize = 25;
/// Keys per `BatchGetItem` call.
pub const BATCH_GET_LIMIT: usize = 100;

/// The DynamoDB calls the helpers need.
pub trait DynamoDbApi {
    fn query(&self, input: &QueryInput) -> Result<ItemPage>;
    fn scan(&self, input: &ScanInput) -> Result<ItemPage>;
    fn update_item(&self, input: &UpdateItemInput) -> Result<UpdateItemOutput>;
    fn batch_write_item(&self, input: &BatchWriteItemInput) -> Result<BatchWriteItemOutput>;
    fn batch_get_item(&self, input: &BatchGetItemInput) -> Result<BatchGetItemOutput>;
}

/// Every item matching `input`, following `LastEvaluatedKey` across pages.
///
/// `input.exclusive_start_key`, when set, is the first page's start key.
pub fn query_table<'a, C>(
    client: &'a C,
    input: QueryInput,
) -> impl Iterator<Item = Result<Item>> + 'a
where
    C: DynamoDbApi + ?Sized,
{
    let start = input.exclusive_start_key.clone();
    Paginator::starting_at(start, move |cursor: Option<Item>| {
        let mut request = input.clone();
        request.exclusive_start_key = cursor;
        let page = client.query(&request)?;
        Ok(Page::new(page.items, page.last_evaluated_key))
    })
}

/// Every item `input` scans, following `LastEvaluatedKey` across pages.
pub fn scan_table<'a, C>(
    client: &'a C,
    input: ScanInput,
) -> impl Iterator<Item = Result<Item>> + 'a
where
    C: DynamoDbApi + ?Sized,
{
    let start = input.exclusive_start_key.clone();
    Paginator::starting_at(start, move |cursor: Option<Item>| {
        let mut request = input.clone();
        request.exclusive_start_key = cursor;
        let page = client.scan(&request)?;
        Ok(Page::new(page.items, page.last_evaluated_key))
    })
}

/// Sets each attribute in `updates` on the item at `key`.
///
/// Builds `SET a = :val1, b = :val2` with matching expression values, in the
/// order `updates` yields them. Attribute names are used in the expression
/// verbatim, so reserved words need [`UpdateItemInput`] directly.
pub fn update_attributes<C, I, K>(
    client: &C,
    table: &str,
    key: Item,
    updates: I,
) -> Result<UpdateItemOutput>
where
    C: DynamoDbApi + ?Sized,
    I: IntoIterator<Item = (K, AttributeValue)>,
    K: Into<String>,
{
    let (update_expression, values) = set_expression(updates)?;
    client.update_item(&UpdateItemInput {
        table_name: table.to_string(),
        key,
        update_expression,
        expression_attribute_values: Some(values),
        ..UpdateItemInput::default()
    })
}

fn set_expression<I, K>(updates: I) -> Result<(String, Item)>
where
    I: IntoIterator<Item = (K, AttributeValue)>,
    K: Into<String>,
{
    let mut parts = Vec::new();
    let mut values = HashMap::new();
    for (i, (name, value)) in updates.into_iter().enumerate() {
        let placeholder = format!(":val{}", i + 1);
        parts.push(format!("{} = {placeholder}", name.into()));
        values.insert(placeholder, value);
    }
    if parts.is_empty() {
        return Err(Error::invalid_input("no attributes to update"));
    }
    Ok((format!("SET {}", parts.join(", ")), values))
}

/// Writes `requests` to `table` in `BatchWriteItem` calls, resubmitting
/// `UnprocessedItems` per `policy`.
///
/// `acknowledged` holds the requests the service accepted.
pub fn batch_write<C, I>(
    client: &C,
    table: &str,
    requests: I,
    policy: &BatchPolicy,
) -> BulkResult<WriteRequest, WriteRequest>
where
    C: DynamoDbApi + ?Sized,
    I: IntoIterator<Item = WriteRequest>,
{
    if let Err(error) = policy.ensure_batch_size_at_most(BATCH_WRITE_LIMIT, "BatchWriteItem") {
        return Err(BulkError::not_started(error, requests));
    }

    #[cfg(feature = "tracing")]
    let _guard = tracing::info_span!("aws_helpers.dynamodb.batch_write", table).entered();

    let batches = match partition(requests, policy.batch_size()) {
        Ok(batches) => batches,
        Err(error) => return Err(BulkError::not_started(error, [])),
    };
    submit_batches(batches, policy, |pending| {
        let input = BatchWriteItemInput {
            request_items: HashMap::from([(table.to_string(), pending)]),
        };
        let mut output = client.batch_write_item(&input)?;
        let unprocessed = output.unprocessed_items.remove(table).unwrap_or_default();
        let submitted = input.request_items.into_values().flatten();
        Ok(BatchResponse::new(
            without_unprocessed(submitted, &unprocessed),
            unprocessed,
        ))
    })
}

/// Puts every item in `items`.
pub fn put_items<C, I>(
    client: &C,
    table: &str,
    items: I,
    policy: &BatchPolicy,
) -> BulkResult<WriteRequest, WriteRequest>
where
    C: DynamoDbApi + ?Sized,
    I: IntoIterator<Item = Item>,
{
    let requests = items
        .into_iter()
        .map(|item| WriteRequest::PutRequest { item });
    batch_write(client, table, requests, policy)
}

/// Deletes the item at each key in `keys`.
pub fn delete_keys<C, I>(
    client: &C,
    table: &str,
    keys: I,
    policy: &BatchPolicy,
) -> BulkResult<WriteRequest, WriteRequest>
where
    C: DynamoDbApi + ?Sized,
    I: IntoIterator<Item = Item>,
{
    let requests = keys.into_iter().map(|key| WriteRequest::DeleteRequest { key });
    batch_write(client, table, requests, policy)
}

/// Reads the items at `keys` in `BatchGetItem` calls, resubmitting
/// `UnprocessedKeys` per `policy`.
///
/// Found items land in `acknowledged` in the order the service returns them.
/// Keys that match no item are simply absent; `unprocessed` holds only keys
/// the service never got to.
pub fn batch_get_items<C, I>(
    client: &C,
    table: &str,
    keys: I,
    policy: &BatchPolicy,
) -> BulkResult<Item, Item>
where
    C: DynamoDbApi + ?Sized,
    I: IntoIterator<Item = Item>,
{
    if let Err(error) = policy.ensure_batch_size_at_most(BATCH_GET_LIMIT, "BatchGetItem") {
        return Err(BulkError::not_started(error, keys));
    }

    #[cfg(feature = "tracing")]
    let _guard = tracing::info_span!("aws_helpers.dynamodb.batch_get", table).entered();

    let batches = match partition(keys, policy.batch_size()) {
        Ok(batches) => batches,
        Err(error) => return Err(BulkError::not_started(error, [])),
    };
    submit_batches(batches, policy, |pending| {
        let input = BatchGetItemInput {
            request_items: HashMap::from([(
                table.to_string(),
                KeysAndAttributes {
                    keys: pending,
                    ..KeysAndAttributes::default()
                },
            )]),
        };
        let mut output = client.batch_get_item(&input)?;
        let found = output.responses.remove(table).unwrap_or_default();
        let unprocessed = output
            .unprocessed_keys
            .remove(table)
            .map(|k| k.keys)
            .unwrap_or_default();
        Ok(BatchResponse::new(found, unprocessed))
    })
}

/// `submitted` minus one occurrence of each entry of `unprocessed`.
fn without_unprocessed<T: PartialEq>(
    submitted: impl IntoIterator<Item = T>,
    unprocessed: &[T],
) -> Vec<T> {
    let mut remaining = unprocessed.iter().collect::<Vec<_>>();
    submitted
        .into_iter()
        .filter(|item| match remaining.iter().position(|u| *u == item) {
            Some(i) => {
                remaining.swap_remove(i);
                false
            }
            None => true,
        })
        .collect()
}

#[cfg(feature = "client")]
impl DynamoDbApi for crate::client::AwsClient {
    fn query(&self, input: &QueryInput) -> Result<ItemPage> {
        self.call_json(&crate::client::JsonService::DYNAMODB, "Query", input)
    }

    fn scan(&self, input: &ScanInput) -> Result<ItemPage> {
        self.call_json(&crate::client::JsonService::DYNAMODB, "Scan", input)
    }

    fn update_item(&self, input: &UpdateItemInput) -> Result<UpdateItemOutput> {
        self.call_json(&crate::client::JsonService::DYNAMODB, "UpdateItem", input)
    }

    fn batch_write_item(&self, input: &BatchWriteItemInput) -> Result<BatchWriteItemOutput> {
        self.call_json(&crate::client::JsonService::DYNAMODB, "BatchWriteItem", input)
    }

    fn batch_get_item(&self, input: &BatchGetItemInput) -> Result<BatchGetItemOutput> {
        self.call_json(&crate::client::JsonService::DYNAMODB, "BatchGetItem", input)
    }
}
