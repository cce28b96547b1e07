use crate::{
    common::{Item, Record, key::PhysicalKey},
    error::{Error, Result},
};

use serde_dynamo::to_item;

/// Maximum number of requests per batch write.
pub const MAX_BATCH_WRITE_REQUESTS: usize = 25;

/// A single request within a batch write operation.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchWriteItemRequest {
    /// Put item request - creates or replaces a physical record.
    PutItem(Record),
    /// Delete item request - removes an item by its physical key.
    DeleteItem(PhysicalKey),
}

/// Compiled request within a batch write.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteRequestInput {
    /// Full item to put.
    Put(Item),
    /// Key of the item to delete.
    Delete(Item),
}

impl TryFrom<BatchWriteItemRequest> for WriteRequestInput {
    type Error = Error;

    fn try_from(write_request: BatchWriteItemRequest) -> Result<Self> {
        let request = match write_request {
            BatchWriteItemRequest::PutItem(record) => {
                PhysicalKey::from_record(&record)?;
                Self::Put(to_item(record)?)
            }
            BatchWriteItemRequest::DeleteItem(key) => Self::Delete((&key).into()),
        };
        Ok(request)
    }
}

/// Compiled batch write against one table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItemInput {
    /// Requests, at most [`MAX_BATCH_WRITE_REQUESTS`].
    pub requests: Vec<WriteRequestInput>,
    /// Target table.
    pub table_name: String,
}

/// Raw result of a batch write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItemOutput {
    /// Requests the store did not process in this round.
    pub unprocessed: Vec<WriteRequestInput>,
}

/// Batch write item operation.
///
/// Best effort: no atomicity across requests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItem {
    /// Puts and deletes, in any mix.
    pub requests: Vec<BatchWriteItemRequest>,
    /// The name of the table to write to.
    pub table_name: String,
}

impl TryFrom<BatchWriteItem> for Vec<BatchWriteItemInput> {
    type Error = Error;

    fn try_from(batch_write_item: BatchWriteItem) -> Result<Self> {
        let mut requests = Vec::with_capacity(batch_write_item.requests.len());
        for request in batch_write_item.requests {
            requests.push(WriteRequestInput::try_from(request)?);
        }
        let inputs = requests
            .chunks(MAX_BATCH_WRITE_REQUESTS)
            .map(|chunk| BatchWriteItemInput {
                requests: chunk.to_vec(),
                table_name: batch_write_item.table_name.clone(),
            })
            .collect();
        Ok(inputs)
    }
}
