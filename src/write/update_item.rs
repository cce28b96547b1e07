use crate::{
    common::{self, Item, Record, key},
    error::{Error, Result},
    write,
};

use serde_dynamo::to_attribute_value;
use std::collections;

/// Compiled update item request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateItemInput {
    /// Key of the item.
    pub key: Item,
    /// `SET` expression replacing each updated attribute.
    pub update_expression: String,
    /// Write settings.
    pub write_input: write::common::WriteInput,
}

/// Update item operation: replace individual attributes in place.
///
/// Every field of `updates` becomes one `SET #n = :v` assignment. The key
/// attributes are never assigned. No read happens before the write, so the
/// caller states the full new value of each attribute.
///
/// ```rust
/// use dynamodb_entity::{common, write};
/// use serde_json::json;
///
/// let update_item = write::update_item::UpdateItem {
///     key: common::key::PhysicalKey::new("USER#1", "USER#META").unwrap(),
///     updates: json!({"name": "Jane"}).as_object().cloned().unwrap(),
///     write_args: write::common::WriteArgs {
///         table_name: "app".to_string(),
///         ..Default::default()
///     },
/// };
/// let input: write::update_item::UpdateItemInput = update_item.try_into().unwrap();
/// assert_eq!(input.update_expression, "SET #n0 = :v0");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateItem {
    /// The physical key of the item to update.
    pub key: key::PhysicalKey,
    /// Attributes to replace.
    pub updates: Record,
    /// Additional write operation arguments (table name, condition).
    pub write_args: write::common::WriteArgs,
}

impl TryFrom<UpdateItem> for UpdateItemInput {
    type Error = Error;

    fn try_from(update_item: UpdateItem) -> Result<Self> {
        let mut placeholders = common::Placeholders::new();
        let mut assignments = Vec::with_capacity(update_item.updates.len());
        let mut expression_attribute_names = collections::HashMap::new();
        let mut expression_attribute_values = collections::HashMap::new();
        for (name, value) in update_item.updates {
            if name == key::PARTITION_KEY || name == key::SORT_KEY {
                continue;
            }
            let name_placeholder = placeholders.name();
            let value_placeholder = placeholders.value();
            assignments.push(format!("{name_placeholder} = {value_placeholder}"));
            expression_attribute_names.insert(name_placeholder, name);
            expression_attribute_values.insert(value_placeholder, to_attribute_value(value)?);
        }
        if assignments.is_empty() {
            return Err(Error::InvalidExpression {
                node: "update without attributes".to_string(),
            });
        }
        let set_operation = common::ExpressionInput {
            expression: format!("SET {}", assignments.join(", ")),
            expression_attribute_names,
            expression_attribute_values,
        };
        let mut write_input = update_item.write_args.compile(&mut placeholders)?;
        let update_expression = write_input.merge_expression(set_operation);
        Ok(Self {
            key: (&update_item.key).into(),
            update_expression,
            write_input,
        })
    }
}
