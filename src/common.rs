//! Common building blocks shared by the store façade and the entity layer.
//!
//! This module holds the expression compiler context (placeholder allocation and
//! the compiled expression fragments), physical keys, filter conditions,
//! projections and pagination cursors.

/// Condition expressions: filters, sort-key conditions and conditional writes.
pub mod condition;

/// Opaque pagination cursors.
pub mod cursor;

/// Physical keys and key transformers.
pub mod key;

/// Attribute selection for projection expressions.
pub mod selection;

use aws_sdk_dynamodb::types;
use std::collections;

/// In-memory record: a JSON object keyed by attribute name.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Wire attribute map exchanged with the transport.
pub type Item = collections::HashMap<String, types::AttributeValue>;

/// Placeholder allocator scoped to one compiled request.
///
/// Names render as `#n{i}` and values as `:v{i}`. Both counters only move
/// forward, so fragments compiled with the same allocator never collide.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Placeholders {
    names: usize,
    values: usize,
}

impl Placeholders {
    /// Fresh allocator starting at `#n0` / `:v0`.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn name(&mut self) -> String {
        let placeholder = format!("#n{}", self.names);
        self.names += 1;
        placeholder
    }

    pub(crate) fn value(&mut self) -> String {
        let placeholder = format!(":v{}", self.values);
        self.values += 1;
        placeholder
    }
}

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

/// Compiled expression fragment with its substitution tables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionInput {
    /// Expression text, referencing only placeholders.
    pub expression: String,
    /// Name placeholder to real attribute name.
    pub expression_attribute_names: collections::HashMap<String, String>,
    /// Value placeholder to attribute value.
    pub expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    pub(crate) fn merge(operator: &str, items: Vec<Self>) -> Self {
        let mut operation = Self::default();
        for item in items {
            operation
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            operation
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            operation.expression = get_expression(operation.expression, operator, item.expression);
        }
        operation
    }

    pub(crate) fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> String {
        match names {
            Some(existing) => existing.extend(self.expression_attribute_names),
            None => *names = Some(self.expression_attribute_names),
        }
        if !self.expression_attribute_values.is_empty() {
            match values {
                Some(existing) => existing.extend(self.expression_attribute_values),
                None => *values = Some(self.expression_attribute_values),
            }
        }
        self.expression
    }
}
