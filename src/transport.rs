//! Seam between the store façade and the wire client.
//!
//! The façade only ever talks to a [`Transport`]. The production
//! implementation is [`aws_sdk_dynamodb::Client`]; tests use an in-memory
//! table.

#[cfg(test)]
pub(crate) mod memory;

use crate::{
    common::Item,
    error::{Error, Result},
    read::{
        batch_get_item::{BatchGetItemInput, BatchGetItemOutput},
        common::Page,
        get_item::GetItemInput,
        query::QueryInput,
        scan::ScanInput,
    },
    write::{
        batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput, WriteRequestInput},
        delete_item::DeleteItemInput,
        put_item::PutItemInput,
        transact_write_items::{TransactWriteInput, TransactWriteItemsInput},
    },
};

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, operation, types};

/// Low level access to one table.
///
/// Every method receives a fully compiled request: expressions already
/// rendered, placeholders resolved, records converted to attribute maps.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch one item, `None` when the key holds nothing.
    async fn get_item(&self, input: GetItemInput) -> Result<Option<Item>>;

    /// Insert or replace one item.
    async fn put_item(&self, input: PutItemInput) -> Result<()>;

    /// Delete one item. Deleting an absent key succeeds.
    async fn delete_item(&self, input: DeleteItemInput) -> Result<()>;

    /// Read one page of a partition.
    async fn query(&self, input: QueryInput) -> Result<Page>;

    /// Read one page of the whole table.
    async fn scan(&self, input: ScanInput) -> Result<Page>;

    /// Fetch up to 100 items by key.
    async fn batch_get_item(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput>;

    /// Put or delete up to 25 items, without atomicity.
    async fn batch_write_item(&self, input: BatchWriteItemInput) -> Result<BatchWriteItemOutput>;

    /// Apply every item or none of them.
    async fn transact_write_items(&self, input: TransactWriteItemsInput) -> Result<()>;
}

fn conflict(message: Option<&str>) -> Error {
    Error::Conflict(message.unwrap_or("conditional check failed").to_string())
}

#[async_trait]
impl Transport for Client {
    async fn get_item(&self, input: GetItemInput) -> Result<Option<Item>> {
        let builder = self.get_item().set_key(Some(input.key));
        let output = crate::apply_single_read_operation!(builder, input.single_read_input)
            .send()
            .await
            .map_err(Error::transport)?;
        Ok(output.item)
    }

    async fn put_item(&self, input: PutItemInput) -> Result<()> {
        let builder = self.put_item().set_item(Some(input.item));
        crate::apply_write_operation!(builder, input.write_input)
            .send()
            .await
            .map_err(|error| match error.as_service_error() {
                Some(operation::put_item::PutItemError::ConditionalCheckFailedException(failed)) => {
                    conflict(failed.message())
                }
                _ => Error::transport(error),
            })?;
        Ok(())
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<()> {
        let builder = self.delete_item().set_key(Some(input.key));
        crate::apply_write_operation!(builder, input.write_input)
            .send()
            .await
            .map_err(|error| match error.as_service_error() {
                Some(operation::delete_item::DeleteItemError::ConditionalCheckFailedException(
                    failed,
                )) => conflict(failed.message()),
                _ => Error::transport(error),
            })?;
        Ok(())
    }

    async fn query(&self, input: QueryInput) -> Result<Page> {
        let builder = self
            .query()
            .key_condition_expression(input.key_condition_expression)
            .set_scan_index_forward(input.scan_index_forward);
        let output = crate::apply_multiple_read_operation!(builder, input.multiple_read_input)
            .send()
            .await
            .map_err(Error::transport)?;
        Ok(Page {
            items: output.items.unwrap_or_default(),
            count: output.count,
            scanned_count: output.scanned_count,
            last_evaluated_key: output.last_evaluated_key,
        })
    }

    async fn scan(&self, input: ScanInput) -> Result<Page> {
        let builder = self
            .scan()
            .set_segment(input.segment)
            .set_total_segments(input.total_segments);
        let output = crate::apply_multiple_read_operation!(builder, input.multiple_read_input)
            .send()
            .await
            .map_err(Error::transport)?;
        Ok(Page {
            items: output.items.unwrap_or_default(),
            count: output.count,
            scanned_count: output.scanned_count,
            last_evaluated_key: output.last_evaluated_key,
        })
    }

    async fn batch_get_item(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput> {
        let single_read_input = input.single_read_input;
        let keys_and_attributes = types::KeysAndAttributes::builder()
            .set_keys(Some(input.keys))
            .set_consistent_read(single_read_input.consistent_read)
            .set_expression_attribute_names(single_read_input.expression_attribute_names)
            .set_projection_expression(single_read_input.projection_expression)
            .build()
            .map_err(Error::transport)?;
        let table_name = single_read_input.table_name;
        let mut output = self
            .batch_get_item()
            .request_items(table_name.clone(), keys_and_attributes)
            .send()
            .await
            .map_err(Error::transport)?;
        let items = output
            .responses
            .as_mut()
            .and_then(|responses| responses.remove(&table_name))
            .unwrap_or_default();
        let unprocessed_keys = output
            .unprocessed_keys
            .as_ref()
            .and_then(|unprocessed| unprocessed.get(&table_name))
            .map(|keys_and_attributes| keys_and_attributes.keys().to_vec())
            .unwrap_or_default();
        Ok(BatchGetItemOutput {
            items,
            unprocessed_keys,
        })
    }

    async fn batch_write_item(&self, input: BatchWriteItemInput) -> Result<BatchWriteItemOutput> {
        let mut write_requests = Vec::with_capacity(input.requests.len());
        for request in input.requests {
            let write_request = match request {
                WriteRequestInput::Put(item) => types::WriteRequest::builder()
                    .put_request(
                        types::PutRequest::builder()
                            .set_item(Some(item))
                            .build()
                            .map_err(Error::transport)?,
                    )
                    .build(),
                WriteRequestInput::Delete(key) => types::WriteRequest::builder()
                    .delete_request(
                        types::DeleteRequest::builder()
                            .set_key(Some(key))
                            .build()
                            .map_err(Error::transport)?,
                    )
                    .build(),
            };
            write_requests.push(write_request);
        }
        let mut output = self
            .batch_write_item()
            .request_items(input.table_name.clone(), write_requests)
            .send()
            .await
            .map_err(Error::transport)?;
        let unprocessed = output
            .unprocessed_items
            .as_mut()
            .and_then(|unprocessed| unprocessed.remove(&input.table_name))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|write_request| {
                if let Some(put_request) = write_request.put_request {
                    Some(WriteRequestInput::Put(put_request.item))
                } else {
                    write_request
                        .delete_request
                        .map(|delete_request| WriteRequestInput::Delete(delete_request.key))
                }
            })
            .collect();
        Ok(BatchWriteItemOutput { unprocessed })
    }

    async fn transact_write_items(&self, input: TransactWriteItemsInput) -> Result<()> {
        let mut transact_items = Vec::with_capacity(input.items.len());
        for item in input.items {
            let transact_item = match item {
                TransactWriteInput::Put(put_item) => {
                    let builder = types::Put::builder().set_item(Some(put_item.item));
                    let put = crate::apply_write_operation!(builder, put_item.write_input)
                        .build()
                        .map_err(Error::transport)?;
                    types::TransactWriteItem::builder().put(put).build()
                }
                TransactWriteInput::Update(update_item) => {
                    let builder = types::Update::builder()
                        .set_key(Some(update_item.key))
                        .update_expression(update_item.update_expression);
                    let update = crate::apply_write_operation!(builder, update_item.write_input)
                        .build()
                        .map_err(Error::transport)?;
                    types::TransactWriteItem::builder().update(update).build()
                }
                TransactWriteInput::Delete(delete_item) => {
                    let builder = types::Delete::builder().set_key(Some(delete_item.key));
                    let delete = crate::apply_write_operation!(builder, delete_item.write_input)
                        .build()
                        .map_err(Error::transport)?;
                    types::TransactWriteItem::builder().delete(delete).build()
                }
                TransactWriteInput::ConditionCheck { key, write_input } => {
                    let builder = types::ConditionCheck::builder().set_key(Some(key));
                    let condition_check = crate::apply_write_operation!(builder, write_input)
                        .build()
                        .map_err(Error::transport)?;
                    types::TransactWriteItem::builder()
                        .condition_check(condition_check)
                        .build()
                }
            };
            transact_items.push(transact_item);
        }
        self.transact_write_items()
            .set_transact_items(Some(transact_items))
            .send()
            .await
            .map_err(|error| {
                if let Some(
                    operation::transact_write_items::TransactWriteItemsError::TransactionCanceledException(
                        cancelled,
                    ),
                ) = error.as_service_error()
                {
                    let reasons = cancelled
                        .cancellation_reasons()
                        .iter()
                        .map(|reason| reason.code().unwrap_or("None").to_string())
                        .collect();
                    return Error::TransactionAborted { reasons };
                }
                Error::transport(error)
            })?;
        Ok(())
    }
}
