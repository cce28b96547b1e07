use crate::{
    common::{Item, key::PhysicalKey},
    read,
};

/// Maximum number of keys per batch get request.
pub const MAX_BATCH_GET_KEYS: usize = 100;

/// Compiled batch get request for a single table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItemInput {
    /// Keys to fetch, at most [`MAX_BATCH_GET_KEYS`].
    pub keys: Vec<Item>,
    /// Read settings shared by every key.
    pub single_read_input: read::common::SingleReadInput,
}

/// Raw result of a batch get.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItemOutput {
    /// Items found, in no particular order.
    pub items: Vec<Item>,
    /// Keys the store did not process in this round.
    pub unprocessed_keys: Vec<Item>,
}

/// Batch get item operation.
///
/// No ordering or atomicity across keys; missing keys are simply absent from the output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItem {
    /// Keys to fetch.
    pub keys: Vec<PhysicalKey>,
    /// Read settings shared by every key.
    pub single_read_args: read::common::SingleReadArgs,
}

impl From<BatchGetItem> for Vec<BatchGetItemInput> {
    fn from(batch_get_item: BatchGetItem) -> Self {
        let single_read_input: read::common::SingleReadInput =
            batch_get_item.single_read_args.into();
        batch_get_item
            .keys
            .chunks(MAX_BATCH_GET_KEYS)
            .map(|chunk| BatchGetItemInput {
                keys: chunk.iter().map(Item::from).collect(),
                single_read_input: single_read_input.clone(),
            })
            .collect()
    }
}
