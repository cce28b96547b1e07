use crate::{
    common::{Item, key::PhysicalKey},
    error::{Error, Result},
    write,
};

/// Compiled delete item request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteItemInput {
    /// Key of the item.
    pub key: Item,
    /// Write settings.
    pub write_input: write::common::WriteInput,
}

/// Delete item operation.
///
/// Deleting a key that holds no item succeeds without effect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteItem {
    /// The physical key of the item to delete.
    pub key: PhysicalKey,
    /// Additional write operation arguments (table name, condition).
    pub write_args: write::common::WriteArgs,
}

impl TryFrom<DeleteItem> for DeleteItemInput {
    type Error = Error;

    fn try_from(delete_item: DeleteItem) -> Result<Self> {
        let write_input: write::common::WriteInput = delete_item.write_args.try_into()?;
        Ok(Self {
            key: (&delete_item.key).into(),
            write_input,
        })
    }
}
