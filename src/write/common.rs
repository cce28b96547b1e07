use crate::{
    common,
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;
use std::collections;

/// Compiled write settings.
///
/// Holds the resolved condition expression and the substitution tables of
/// every expression in the request, ready for the store API.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteInput {
    /// Precondition that must hold for the write to apply.
    pub condition_expression: Option<String>,
    /// Name placeholders of every expression in the request.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholders of every expression in the request.
    pub expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    /// Target table.
    pub table_name: String,
}

impl WriteInput {
    /// Merge an expression operation into this write operation.
    pub(crate) fn merge_expression(&mut self, operation: common::ExpressionInput) -> String {
        operation.merge_into(
            &mut self.expression_attribute_names,
            &mut self.expression_attribute_values,
        )
    }
}

/// Arguments common to all write operations (Put, Update, Delete, ConditionCheck).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteArgs {
    /// Condition that must be true for the operation to succeed.
    ///
    /// If the condition is false the store rejects the write; inside a
    /// transaction this aborts the whole transaction.
    pub condition: Option<common::condition::Filter>,
    /// The name of the table to write to.
    pub table_name: String,
}

impl WriteArgs {
    /// Compile the condition, continuing `placeholders`.
    pub(crate) fn compile(self, placeholders: &mut common::Placeholders) -> Result<WriteInput> {
        let mut write_input = WriteInput {
            table_name: self.table_name,
            ..Default::default()
        };
        if let Some(condition) = self.condition {
            let condition_operation = condition.compile(placeholders)?;
            write_input.condition_expression =
                Some(write_input.merge_expression(condition_operation));
        }
        Ok(write_input)
    }
}

impl TryFrom<WriteArgs> for WriteInput {
    type Error = Error;

    fn try_from(write_args: WriteArgs) -> Result<Self> {
        write_args.compile(&mut common::Placeholders::new())
    }
}

/// apply common write operation settings to a builder
#[macro_export]
macro_rules! apply_write_operation {
    ($builder:expr, $write_operation:expr) => {
        $builder
            .set_condition_expression($write_operation.condition_expression)
            .set_expression_attribute_names($write_operation.expression_attribute_names)
            .set_expression_attribute_values($write_operation.expression_attribute_values)
            .table_name($write_operation.table_name)
    };
}
