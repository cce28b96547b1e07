use crate::{
    common::{self, Item, Record},
    error::Result,
};

use std::collections;

/// Compiled single-item read settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SingleReadInput {
    /// Strongly consistent read when `Some(true)`.
    pub consistent_read: Option<bool>,
    /// Name placeholders used by the projection.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Projection expression.
    pub projection_expression: Option<String>,
    /// Target table.
    pub table_name: String,
}

/// Arguments for single-item read operations (GetItem, BatchGetItem).
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct SingleReadArgs {
    /// Whether to use a consistent read.
    ///
    /// `true` for strongly consistent reads, `false` or `None` for eventually consistent reads.
    pub consistent_read: Option<bool>,
    /// Which attributes to retrieve. `None` retrieves every attribute.
    pub selection: Option<common::selection::SelectionMap>,
    /// The name of the table to read from.
    pub table_name: String,
}

impl From<SingleReadArgs> for SingleReadInput {
    fn from(single_read_args: SingleReadArgs) -> Self {
        let (expression_attribute_names, projection_expression) = match single_read_args.selection {
            Some(selection) => {
                let selection_operation = selection.compile(&mut common::Placeholders::new());
                (
                    Some(selection_operation.expression_attribute_names),
                    Some(selection_operation.expression),
                )
            }
            None => (None, None),
        };
        Self {
            consistent_read: single_read_args.consistent_read,
            expression_attribute_names,
            projection_expression,
            table_name: single_read_args.table_name,
        }
    }
}

/// Compiled multiple-item read settings shared by Query and Scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipleReadInput {
    /// Strongly consistent read when `Some(true)`.
    pub consistent_read: Option<bool>,
    /// Continuation key of the previous page.
    pub exclusive_start_key: Option<Item>,
    /// Name placeholders of every expression in the request.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholders of every expression in the request.
    pub expression_attribute_values:
        Option<collections::HashMap<String, aws_sdk_dynamodb::types::AttributeValue>>,
    /// Post-filter expression.
    pub filter_expression: Option<String>,
    /// Secondary index to read instead of the base table.
    pub index_name: Option<String>,
    /// Maximum number of items to evaluate.
    pub limit: Option<i32>,
    /// Projection expression.
    pub projection_expression: Option<String>,
    /// Target table.
    pub table_name: String,
}

/// Arguments for multiple-item read operations (Query, Scan).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipleReadArgs {
    /// Post-filter applied to the items read. It never narrows what is read,
    /// only what is returned.
    pub filter: Option<common::condition::Filter>,
    /// Whether to use a consistent read.
    pub consistent_read: Option<bool>,
    /// Cursor returned by the previous page.
    pub cursor: Option<common::cursor::Cursor>,
    /// The name of a secondary index to read instead of the base table.
    pub index_name: Option<String>,
    /// The maximum number of items to evaluate (not necessarily the number of matching items).
    pub limit: Option<i32>,
    /// Which attributes to retrieve.
    pub selection: Option<common::selection::SelectionMap>,
    /// The name of the table to read from.
    pub table_name: String,
}

impl MultipleReadArgs {
    /// Compile filter and projection, continuing `placeholders` so that a key
    /// condition compiled beforehand keeps its own placeholders.
    pub(crate) fn compile(
        self,
        placeholders: &mut common::Placeholders,
    ) -> Result<MultipleReadInput> {
        let exclusive_start_key = self
            .cursor
            .map(|cursor| cursor.decode())
            .transpose()?;
        let condition_operation = self
            .filter
            .map(|filter| filter.compile(placeholders))
            .transpose()?;
        let selection_operation = self
            .selection
            .map(|selection| selection.compile(placeholders));
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let filter_expression = condition_operation.map(|condition_operation| {
            condition_operation.merge_into(
                &mut expression_attribute_names,
                &mut expression_attribute_values,
            )
        });
        let projection_expression = selection_operation.map(|selection_operation| {
            selection_operation.merge_into(
                &mut expression_attribute_names,
                &mut expression_attribute_values,
            )
        });
        Ok(MultipleReadInput {
            consistent_read: self.consistent_read,
            exclusive_start_key,
            expression_attribute_names,
            expression_attribute_values,
            filter_expression,
            index_name: self.index_name,
            limit: self.limit,
            projection_expression,
            table_name: self.table_name,
        })
    }
}

/// Secondary index and the attribute names of its key.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SecondaryIndex {
    /// Index name.
    pub name: String,
    /// Partition key attribute of the index.
    pub partition_key: String,
    /// Sort key attribute of the index.
    pub sort_key: String,
}

impl SecondaryIndex {
    /// Index `name` keyed by `partition_key` / `sort_key`.
    pub fn new(
        name: impl Into<String>,
        partition_key: impl Into<String>,
        sort_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }
}

/// One page of raw items as returned by the transport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    /// Items in store iteration order.
    pub items: Vec<Item>,
    /// Number of items returned after filtering.
    pub count: i32,
    /// Number of items evaluated before filtering.
    pub scanned_count: i32,
    /// Continuation key when more items remain.
    pub last_evaluated_key: Option<Item>,
}

/// Result of a query or scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    /// Records in store iteration order (reversed for descending queries).
    pub items: Vec<Record>,
    /// Number of records in `items`.
    pub count: usize,
    /// Number of records read before the post-filter, when reported.
    pub scanned_count: Option<usize>,
    /// Whether more records remain after this page.
    pub has_more: bool,
    /// Cursor for the next page, valid only with the same parameters.
    pub cursor: Option<common::cursor::Cursor>,
}

impl QueryResult {
    pub(crate) fn from_page(page: Page) -> Result<Self> {
        let mut items = Vec::with_capacity(page.items.len());
        for item in page.items {
            items.push(serde_dynamo::from_item(item)?);
        }
        let cursor = page
            .last_evaluated_key
            .as_ref()
            .map(common::cursor::Cursor::encode)
            .transpose()?;
        Ok(Self {
            count: items.len(),
            items,
            scanned_count: usize::try_from(page.scanned_count).ok(),
            has_more: cursor.is_some(),
            cursor,
        })
    }

    /// Append the records of a following page.
    pub(crate) fn extend(&mut self, next: Self) {
        self.items.extend(next.items);
        self.count = self.items.len();
        self.scanned_count = match (self.scanned_count, next.scanned_count) {
            (Some(scanned), Some(next_scanned)) => Some(scanned + next_scanned),
            (scanned, next_scanned) => scanned.or(next_scanned),
        };
        self.has_more = next.has_more;
        self.cursor = next.cursor;
    }
}

/// apply common single read operation settings to a builder
#[macro_export]
macro_rules! apply_single_read_operation {
    ($builder:expr, $single_read_operation:expr) => {
        $builder
            .set_consistent_read($single_read_operation.consistent_read)
            .set_expression_attribute_names($single_read_operation.expression_attribute_names)
            .set_projection_expression($single_read_operation.projection_expression)
            .table_name($single_read_operation.table_name)
    };
}

/// apply common multiple read operation settings to a builder
#[macro_export]
macro_rules! apply_multiple_read_operation {
    ($builder:expr, $multiple_read_operation:expr) => {
        $builder
            .set_consistent_read($multiple_read_operation.consistent_read)
            .set_exclusive_start_key($multiple_read_operation.exclusive_start_key)
            .set_expression_attribute_names($multiple_read_operation.expression_attribute_names)
            .set_expression_attribute_values($multiple_read_operation.expression_attribute_values)
            .set_filter_expression($multiple_read_operation.filter_expression)
            .set_index_name($multiple_read_operation.index_name)
            .set_limit($multiple_read_operation.limit)
            .set_projection_expression($multiple_read_operation.projection_expression)
            .table_name($multiple_read_operation.table_name)
    };
}
