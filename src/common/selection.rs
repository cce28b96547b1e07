use crate::common;

use indexmap::IndexMap;
use std::{collections, hash};

/// Map for selecting attributes in projection expressions.
///
/// Every path segment is replaced by a name placeholder, so reserved words
/// such as `name` or `status` are safe to project.
///
/// ```rust
/// use dynamodb_entity::common::selection;
///
/// let selection = selection::SelectionMap::Leaves(vec![
///     "id".to_string(),
///     "name".to_string(),
/// ]);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectionMap {
    /// Leaf selection - a flat list of attribute names to select.
    Leaves(Vec<String>),
    /// Node selection - nested selection for hierarchical attribute paths.
    Node(IndexMap<String, SelectionMap>),
}

impl hash::Hash for SelectionMap {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Leaves(leaves) => leaves.hash(state),
            Self::Node(map) => map.iter().for_each(|(key, value)| {
                key.hash(state);
                value.hash(state);
            }),
        }
    }
}

impl From<Vec<String>> for SelectionMap {
    fn from(fields: Vec<String>) -> Self {
        Self::Leaves(fields)
    }
}

impl SelectionMap {
    /// Compile into a projection expression using `placeholders`.
    pub fn compile(self, placeholders: &mut common::Placeholders) -> common::ExpressionInput {
        self.get_selection_operation_recursive(&[], placeholders)
    }

    fn get_selection_operation_recursive(
        self,
        path: &[String],
        placeholders: &mut common::Placeholders,
    ) -> common::ExpressionInput {
        let operations: Vec<_> = match self {
            Self::Leaves(leaves) => leaves
                .into_iter()
                .map(|leaf| {
                    let placeholder = placeholders.name();
                    let mut segments = path.to_vec();
                    segments.push(placeholder.clone());
                    common::ExpressionInput {
                        expression: segments.join("."),
                        expression_attribute_names: collections::HashMap::from([(
                            placeholder,
                            leaf,
                        )]),
                        ..Default::default()
                    }
                })
                .collect(),
            Self::Node(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let placeholder = placeholders.name();
                    let mut segments = path.to_vec();
                    segments.push(placeholder.clone());
                    let mut operation =
                        value.get_selection_operation_recursive(&segments, placeholders);
                    operation
                        .expression_attribute_names
                        .insert(placeholder, key);
                    operation
                })
                .collect(),
        };
        common::ExpressionInput::merge(", ", operations)
    }
}
