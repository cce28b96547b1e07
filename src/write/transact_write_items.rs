use crate::{
    common::{self, Item, Record, condition::Filter, key::PhysicalKey},
    error::{Error, Result},
    write,
};

/// Maximum number of items in one transaction.
pub const MAX_TRANSACTION_ITEMS: usize = 100;

/// One item of an all-or-nothing transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum TransactionItem {
    /// Insert or replace a physical record.
    Put {
        /// Record carrying both key attributes.
        record: Record,
        /// Optional precondition.
        condition: Option<Filter>,
    },
    /// Replace individual attributes; see [`UpdateItem`](write::update_item::UpdateItem).
    Update {
        /// Target key.
        key: PhysicalKey,
        /// Attributes to replace.
        updates: Record,
        /// Optional precondition.
        condition: Option<Filter>,
    },
    /// Delete a key.
    Delete {
        /// Target key.
        key: PhysicalKey,
        /// Optional precondition.
        condition: Option<Filter>,
    },
    /// Assert a precondition on a key without writing it.
    ConditionCheck {
        /// Target key.
        key: PhysicalKey,
        /// Precondition.
        condition: Filter,
    },
}

/// Compiled transaction item.
#[derive(Clone, Debug, PartialEq)]
pub enum TransactWriteInput {
    /// Compiled put.
    Put(write::put_item::PutItemInput),
    /// Compiled update.
    Update(write::update_item::UpdateItemInput),
    /// Compiled delete.
    Delete(write::delete_item::DeleteItemInput),
    /// Compiled condition check; `write_input.condition_expression` is always set.
    ConditionCheck {
        /// Target key.
        key: Item,
        /// Condition and its substitution tables.
        write_input: write::common::WriteInput,
    },
}

/// Compiled transaction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactWriteItemsInput {
    /// Items in request order.
    pub items: Vec<TransactWriteInput>,
}

/// Transactional write of several items against one table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactWriteItems {
    /// Items in request order.
    pub items: Vec<TransactionItem>,
    /// The name of the table to write to.
    pub table_name: String,
}

impl TryFrom<TransactWriteItems> for TransactWriteItemsInput {
    type Error = Error;

    fn try_from(transact_write_items: TransactWriteItems) -> Result<Self> {
        if transact_write_items.items.len() > MAX_TRANSACTION_ITEMS {
            return Err(Error::InvalidExpression {
                node: format!(
                    "transaction of {} items exceeds {MAX_TRANSACTION_ITEMS}",
                    transact_write_items.items.len()
                ),
            });
        }
        let table_name = transact_write_items.table_name;
        let write_args = |condition| write::common::WriteArgs {
            condition,
            table_name: table_name.clone(),
        };
        let mut items = Vec::with_capacity(transact_write_items.items.len());
        for item in transact_write_items.items {
            let item = match item {
                TransactionItem::Put { record, condition } => {
                    let put_item = write::put_item::PutItem {
                        record,
                        write_args: write_args(condition),
                    };
                    TransactWriteInput::Put(put_item.try_into()?)
                }
                TransactionItem::Update {
                    key,
                    updates,
                    condition,
                } => {
                    let update_item = write::update_item::UpdateItem {
                        key,
                        updates,
                        write_args: write_args(condition),
                    };
                    TransactWriteInput::Update(update_item.try_into()?)
                }
                TransactionItem::Delete { key, condition } => {
                    let delete_item = write::delete_item::DeleteItem {
                        key,
                        write_args: write_args(condition),
                    };
                    TransactWriteInput::Delete(delete_item.try_into()?)
                }
                TransactionItem::ConditionCheck { key, condition } => {
                    let write_input =
                        write_args(Some(condition)).compile(&mut common::Placeholders::new())?;
                    TransactWriteInput::ConditionCheck {
                        key: (&key).into(),
                        write_input,
                    }
                }
            };
            items.push(item);
        }
        Ok(Self { items })
    }
}
