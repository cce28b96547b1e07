use crate::{
    common::{
        self,
        condition::{Filter, SortKeyCondition},
        cursor::Cursor,
        key,
        selection::SelectionMap,
    },
    error::{Error, Result},
    read,
};

/// Parameters of a single-partition query.
///
/// Only `partition_key` is required. `filter` is applied after the key
/// condition and never changes which partition is read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryParams {
    /// Partition key value to read.
    pub partition_key: String,
    /// Optional condition on the sort key.
    pub sort_key: Option<SortKeyCondition>,
    /// Optional post-filter.
    pub filter: Option<Filter>,
    /// Maximum number of items to evaluate.
    pub limit: Option<i32>,
    /// Cursor returned by the previous page.
    pub cursor: Option<Cursor>,
    /// Sort order. `None` or `Some(true)` reads ascending.
    pub ascending: Option<bool>,
    /// Secondary index to read instead of the base table.
    pub index: Option<read::common::SecondaryIndex>,
    /// Which attributes to return.
    pub selection: Option<SelectionMap>,
    /// Whether to use a consistent read.
    pub consistent_read: Option<bool>,
}

impl QueryParams {
    /// Query the partition `partition_key`.
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            ..Default::default()
        }
    }
}

/// Compiled query request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryInput {
    /// Partition equality, optionally followed by the sort-key clause.
    pub key_condition_expression: String,
    /// Shared multiple-read settings.
    pub multiple_read_input: read::common::MultipleReadInput,
    /// `Some(false)` reads descending.
    pub scan_index_forward: Option<bool>,
}

/// Query operation.
///
/// ```rust
/// use dynamodb_entity::{common, read};
///
/// let query = read::query::Query {
///     params: read::query::QueryParams {
///         sort_key: Some(common::condition::SortKeyCondition::BeginsWith("ORDER#".to_string())),
///         ..read::query::QueryParams::new("USER#1")
///     },
///     table_name: "app".to_string(),
/// };
/// let input: read::query::QueryInput = query.try_into().unwrap();
/// assert_eq!(input.key_condition_expression, "#n0 = :v0 AND begins_with(#n1, :v1)");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// What to read.
    pub params: QueryParams,
    /// The name of the table to read from.
    pub table_name: String,
}

impl TryFrom<Query> for QueryInput {
    type Error = Error;

    fn try_from(query: Query) -> Result<Self> {
        let params = query.params;
        if params.partition_key.is_empty() {
            return Err(Error::InvalidKey("query requires a partition key value".to_string()));
        }
        let (partition_key_name, sort_key_name, index_name) = match params.index {
            Some(index) => (index.partition_key, index.sort_key, Some(index.name)),
            None => (
                key::PARTITION_KEY.to_string(),
                key::SORT_KEY.to_string(),
                None,
            ),
        };
        let mut placeholders = common::Placeholders::new();
        let key_condition_operation = common::condition::key_condition_expression(
            &partition_key_name,
            params.partition_key,
            params
                .sort_key
                .map(|condition| (sort_key_name.as_str(), condition)),
            &mut placeholders,
        )?;
        let multiple_read_args = read::common::MultipleReadArgs {
            filter: params.filter,
            consistent_read: params.consistent_read,
            cursor: params.cursor,
            index_name,
            limit: params.limit,
            selection: params.selection,
            table_name: query.table_name,
        };
        let mut multiple_read_input = multiple_read_args.compile(&mut placeholders)?;
        let key_condition_expression = key_condition_operation.merge_into(
            &mut multiple_read_input.expression_attribute_names,
            &mut multiple_read_input.expression_attribute_values,
        );
        Ok(Self {
            key_condition_expression,
            multiple_read_input,
            scan_index_forward: params.ascending,
        })
    }
}
