use crate::{
    common::{Item, key::PhysicalKey},
    read,
};

/// Compiled get item request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItemInput {
    /// Key of the item.
    pub key: Item,
    /// Read settings.
    pub single_read_input: read::common::SingleReadInput,
}

/// Get item operation.
///
/// ```rust
/// use dynamodb_entity::{common, read};
///
/// let get_item = read::get_item::GetItem {
///     key: common::key::PhysicalKey::new("USER#1", "USER#META").unwrap(),
///     single_read_args: read::common::SingleReadArgs {
///         table_name: "app".to_string(),
///         ..Default::default()
///     },
/// };
/// let input: read::get_item::GetItemInput = get_item.into();
/// assert_eq!(input.single_read_input.table_name, "app");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItem {
    /// The primary key of the item to retrieve.
    pub key: PhysicalKey,
    /// Additional read operation arguments (table name, consistent read, selection).
    pub single_read_args: read::common::SingleReadArgs,
}

impl From<GetItem> for GetItemInput {
    fn from(get_item: GetItem) -> Self {
        Self {
            key: (&get_item.key).into(),
            single_read_input: get_item.single_read_args.into(),
        }
    }
}
