use crate::{
    common::{Item, Record, key::PhysicalKey},
    error::{Error, Result},
    write,
};

use serde_dynamo::to_item;

/// Compiled put item request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutItemInput {
    /// Full item, key attributes included.
    pub item: Item,
    /// Write settings.
    pub write_input: write::common::WriteInput,
}

/// Put item operation: insert or replace the whole record.
///
/// ```rust
/// use dynamodb_entity::write;
/// use serde_json::json;
///
/// let put_item = write::put_item::PutItem {
///     record: json!({"pk": "USER#1", "sk": "USER#META", "name": "John"})
///         .as_object()
///         .cloned()
///         .unwrap(),
///     write_args: write::common::WriteArgs {
///         table_name: "app".to_string(),
///         ..Default::default()
///     },
/// };
/// let input: write::put_item::PutItemInput = put_item.try_into().unwrap();
/// assert_eq!(input.item.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutItem {
    /// The physical record to store. Must carry both key attributes.
    pub record: Record,
    /// Additional write operation arguments (table name, condition).
    pub write_args: write::common::WriteArgs,
}

impl TryFrom<PutItem> for PutItemInput {
    type Error = Error;

    fn try_from(put_item: PutItem) -> Result<Self> {
        PhysicalKey::from_record(&put_item.record)?;
        let item = to_item(put_item.record)?;
        let write_input: write::common::WriteInput = put_item.write_args.try_into()?;
        Ok(Self { item, write_input })
    }
}
