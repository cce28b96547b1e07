use crate::{
    common,
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::to_attribute_value;
use serde_json::Value;
use std::{collections, fmt, ops};

/// Logical operator for combining conditions.
#[derive(Clone, Debug, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all conditions must be true.
    And,
    /// Logical OR - at least one condition must be true.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Operator applied to a single attribute.
///
/// ```rust
/// use dynamodb_entity::common::condition;
///
/// let eq = condition::Condition::Equals("value".to_string());
/// let gt = condition::Condition::GreaterThan(100);
/// let exists: condition::Condition<String> = condition::Condition::Exists;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition<T> {
    /// Attribute begins with a prefix (string attributes only).
    BeginsWith(String),
    /// Attribute lies between two values, inclusive.
    Between(T, T),
    /// Attribute (string or set) contains a value.
    Contains(T),
    /// Attribute equals a value.
    Equals(T),
    /// Attribute is present.
    Exists,
    /// Attribute is greater than a value.
    GreaterThan(T),
    /// Attribute is greater than or equal to a value.
    GreaterThanOrEqual(T),
    /// Attribute is a member of the given set.
    In(Vec<T>),
    /// Attribute is less than a value.
    LessThan(T),
    /// Attribute is less than or equal to a value.
    LessThanOrEqual(T),
    /// Attribute does not contain a value.
    NotContains(T),
    /// Attribute differs from a value.
    NotEqual(T),
    /// Attribute is absent.
    NotExists,
}

fn bind<T: Serialize>(
    value: T,
    placeholders: &mut common::Placeholders,
    values: &mut collections::HashMap<String, types::AttributeValue>,
) -> Result<String> {
    let value = to_attribute_value(value)?;
    let placeholder = placeholders.value();
    values.insert(placeholder.clone(), value);
    Ok(placeholder)
}

impl<T: Serialize + fmt::Debug> Condition<T> {
    fn get_expression(
        self,
        path: &str,
        placeholders: &mut common::Placeholders,
    ) -> Result<(String, collections::HashMap<String, types::AttributeValue>)> {
        let mut values = collections::HashMap::new();
        let expression = match self {
            Self::BeginsWith(prefix) => {
                let placeholder = bind(prefix, placeholders, &mut values)?;
                format!("begins_with({path}, {placeholder})")
            }
            Self::Between(low, high) => {
                let low = bind(low, placeholders, &mut values)?;
                let high = bind(high, placeholders, &mut values)?;
                format!("{path} BETWEEN {low} AND {high}")
            }
            Self::Contains(value) => {
                let placeholder = bind(value, placeholders, &mut values)?;
                format!("contains({path}, {placeholder})")
            }
            Self::Equals(value) => {
                let placeholder = bind(value, placeholders, &mut values)?;
                format!("{path} = {placeholder}")
            }
            Self::Exists => format!("attribute_exists({path})"),
            Self::GreaterThan(value) => {
                let placeholder = bind(value, placeholders, &mut values)?;
                format!("{path} > {placeholder}")
            }
            Self::GreaterThanOrEqual(value) => {
                let placeholder = bind(value, placeholders, &mut values)?;
                format!("{path} >= {placeholder}")
            }
            Self::In(members) => {
                if members.is_empty() {
                    return Err(Error::invalid_expression(Self::In(members)));
                }
                let mut member_placeholders = Vec::with_capacity(members.len());
                for member in members {
                    member_placeholders.push(bind(member, placeholders, &mut values)?);
                }
                format!("{path} IN ({})", member_placeholders.join(", "))
            }
            Self::LessThan(value) => {
                let placeholder = bind(value, placeholders, &mut values)?;
                format!("{path} < {placeholder}")
            }
            Self::LessThanOrEqual(value) => {
                let placeholder = bind(value, placeholders, &mut values)?;
                format!("{path} <= {placeholder}")
            }
            Self::NotContains(value) => {
                let placeholder = bind(value, placeholders, &mut values)?;
                format!("NOT contains({path}, {placeholder})")
            }
            Self::NotEqual(value) => {
                let placeholder = bind(value, placeholders, &mut values)?;
                format!("{path} <> {placeholder}")
            }
            Self::NotExists => format!("attribute_not_exists({path})"),
        };
        Ok((expression, values))
    }
}

/// Condition applied to one named attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyCondition<T> {
    /// The condition to apply to the attribute.
    pub condition: Condition<T>,
    /// The name of the attribute to apply the condition to.
    pub name: String,
}

impl<T: Serialize + fmt::Debug> KeyCondition<T> {
    pub(crate) fn compile(
        self,
        placeholders: &mut common::Placeholders,
    ) -> Result<common::ExpressionInput> {
        let name_placeholder = placeholders.name();
        let (expression, expression_attribute_values) =
            self.condition.get_expression(&name_placeholder, placeholders)?;
        Ok(common::ExpressionInput {
            expression,
            expression_attribute_names: collections::HashMap::from([(name_placeholder, self.name)]),
            expression_attribute_values,
        })
    }
}

/// Composable predicate tree used as a post-filter or a write precondition.
///
/// ```rust
/// use dynamodb_entity::common::{self, condition::Filter};
/// use serde_json::json;
///
/// let filter = Filter::and(vec![
///     Filter::eq("role", json!("admin")),
///     Filter::ne("status", json!("inactive")),
/// ]);
/// let compiled = filter.compile(&mut common::Placeholders::new()).unwrap();
/// assert_eq!(compiled.expression, "(#n0 = :v0 AND #n1 <> :v1)");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Filter<T = Value> {
    /// Single attribute condition.
    Leaf(KeyCondition<T>),
    /// Every child must hold. Needs at least one child.
    And(Vec<Filter<T>>),
    /// At least one child must hold. Needs at least one child.
    Or(Vec<Filter<T>>),
    /// Negation of the child.
    Not(Box<Filter<T>>),
}

impl<T> Filter<T> {
    /// Leaf with an arbitrary condition.
    pub fn attribute(name: impl Into<String>, condition: Condition<T>) -> Self {
        Self::Leaf(KeyCondition {
            condition,
            name: name.into(),
        })
    }

    /// `name = value`.
    pub fn eq(name: impl Into<String>, value: T) -> Self {
        Self::attribute(name, Condition::Equals(value))
    }

    /// `name <> value`.
    pub fn ne(name: impl Into<String>, value: T) -> Self {
        Self::attribute(name, Condition::NotEqual(value))
    }

    /// `attribute_exists(name)`.
    pub fn exists(name: impl Into<String>) -> Self {
        Self::attribute(name, Condition::Exists)
    }

    /// `attribute_not_exists(name)`.
    pub fn not_exists(name: impl Into<String>) -> Self {
        Self::attribute(name, Condition::NotExists)
    }

    /// `contains(name, value)`.
    pub fn contains(name: impl Into<String>, value: T) -> Self {
        Self::attribute(name, Condition::Contains(value))
    }

    /// `name IN (values...)`.
    pub fn is_in(name: impl Into<String>, values: Vec<T>) -> Self {
        Self::attribute(name, Condition::In(values))
    }

    /// Conjunction of `children`.
    pub fn and(children: Vec<Self>) -> Self {
        Self::And(children)
    }

    /// Disjunction of `children`.
    pub fn or(children: Vec<Self>) -> Self {
        Self::Or(children)
    }

    /// Negation of `child`.
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Self) -> Self {
        Self::Not(Box::new(child))
    }
}

impl<T: Serialize + fmt::Debug> Filter<T> {
    /// Compile the tree depth-first, allocating placeholders left to right.
    pub fn compile(self, placeholders: &mut common::Placeholders) -> Result<common::ExpressionInput> {
        match self {
            Self::Leaf(key_condition) => key_condition.compile(placeholders),
            Self::And(children) => Self::compile_group(LogicalOperator::And, children, placeholders),
            Self::Or(children) => Self::compile_group(LogicalOperator::Or, children, placeholders),
            Self::Not(child) => {
                let mut operation = child.compile(placeholders)?;
                operation.expression = format!("NOT ({})", operation.expression);
                Ok(operation)
            }
        }
    }

    fn compile_group(
        operator: LogicalOperator,
        children: Vec<Self>,
        placeholders: &mut common::Placeholders,
    ) -> Result<common::ExpressionInput> {
        if children.is_empty() {
            let node: Self = match operator {
                LogicalOperator::And => Self::And(children),
                LogicalOperator::Or => Self::Or(children),
            };
            return Err(Error::invalid_expression(node));
        }
        let mut operations = Vec::with_capacity(children.len());
        for child in children {
            operations.push(child.compile(placeholders)?);
        }
        let mut operation = common::ExpressionInput::merge(&operator, operations);
        operation.expression = format!("({})", operation.expression);
        Ok(operation)
    }
}

impl TryFrom<Filter<Value>> for common::ExpressionInput {
    type Error = Error;

    fn try_from(filter: Filter<Value>) -> Result<Self> {
        filter.compile(&mut common::Placeholders::new())
    }
}

fn invalid(node: &Value) -> Error {
    Error::InvalidExpression {
        node: node.to_string(),
    }
}

impl Filter<Value> {
    /// Parse the JSON form of a predicate.
    ///
    /// Accepted shapes are `{"and": [..]}`, `{"or": [..]}`, `{"not": {..}}` and
    /// leaves such as `{"attribute": "role", "eq": "admin"}`. Leaf operators:
    /// `eq`, `ne`, `exists` (boolean), `contains`, `notContains`, `in`, `gt`,
    /// `gte`, `lt`, `lte`, `between` (two element array) and `beginsWith`.
    pub fn from_json(node: &Value) -> Result<Self> {
        let object = node.as_object().ok_or_else(|| invalid(node))?;
        if object.len() == 1 {
            if let Some(children) = object.get("and") {
                return Ok(Self::And(Self::children_from_json(node, children)?));
            }
            if let Some(children) = object.get("or") {
                return Ok(Self::Or(Self::children_from_json(node, children)?));
            }
            if let Some(child) = object.get("not") {
                return Ok(Self::not(Self::from_json(child)?));
            }
        }
        let name = object
            .get("attribute")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(node))?;
        if object.len() != 2 {
            return Err(invalid(node));
        }
        let (operator, operand) = object
            .iter()
            .find(|(key, _)| key.as_str() != "attribute")
            .ok_or_else(|| invalid(node))?;
        let operand = operand.clone();
        let condition = match operator.as_str() {
            "eq" => Condition::Equals(operand),
            "ne" => Condition::NotEqual(operand),
            "exists" => match operand {
                Value::Bool(true) => Condition::Exists,
                Value::Bool(false) => Condition::NotExists,
                _ => return Err(invalid(node)),
            },
            "contains" => Condition::Contains(operand),
            "notContains" => Condition::NotContains(operand),
            "in" => match operand {
                Value::Array(members) if !members.is_empty() => Condition::In(members),
                _ => return Err(invalid(node)),
            },
            "gt" => Condition::GreaterThan(operand),
            "gte" => Condition::GreaterThanOrEqual(operand),
            "lt" => Condition::LessThan(operand),
            "lte" => Condition::LessThanOrEqual(operand),
            "between" => match operand {
                Value::Array(mut bounds) if bounds.len() == 2 => {
                    let high = bounds.pop().unwrap_or_default();
                    let low = bounds.pop().unwrap_or_default();
                    Condition::Between(low, high)
                }
                _ => return Err(invalid(node)),
            },
            "beginsWith" => match operand {
                Value::String(prefix) => Condition::BeginsWith(prefix),
                _ => return Err(invalid(node)),
            },
            _ => return Err(invalid(node)),
        };
        Ok(Self::attribute(name, condition))
    }

    fn children_from_json(node: &Value, children: &Value) -> Result<Vec<Self>> {
        match children {
            Value::Array(children) if !children.is_empty() => {
                children.iter().map(Self::from_json).collect()
            }
            _ => Err(invalid(node)),
        }
    }
}

/// Condition on the sort key of a query.
///
/// Exactly one variant applies per query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SortKeyCondition {
    /// Sort key equals the value.
    Equals(String),
    /// Sort key starts with the prefix.
    BeginsWith(String),
    /// Sort key lies between the bounds, inclusive.
    Between(String, String),
    /// Sort key is greater than the value.
    GreaterThan(String),
    /// Sort key is greater than or equal to the value.
    GreaterThanOrEqual(String),
    /// Sort key is less than the value.
    LessThan(String),
    /// Sort key is less than or equal to the value.
    LessThanOrEqual(String),
}

impl From<SortKeyCondition> for Condition<String> {
    fn from(sort_key_condition: SortKeyCondition) -> Self {
        match sort_key_condition {
            SortKeyCondition::Equals(value) => Self::Equals(value),
            SortKeyCondition::BeginsWith(prefix) => Self::BeginsWith(prefix),
            SortKeyCondition::Between(low, high) => Self::Between(low, high),
            SortKeyCondition::GreaterThan(value) => Self::GreaterThan(value),
            SortKeyCondition::GreaterThanOrEqual(value) => Self::GreaterThanOrEqual(value),
            SortKeyCondition::LessThan(value) => Self::LessThan(value),
            SortKeyCondition::LessThanOrEqual(value) => Self::LessThanOrEqual(value),
        }
    }
}

/// Compile the key condition of a query: partition equality, then the optional sort-key clause.
pub(crate) fn key_condition_expression(
    partition_key_name: &str,
    partition_key_value: String,
    sort_key: Option<(&str, SortKeyCondition)>,
    placeholders: &mut common::Placeholders,
) -> Result<common::ExpressionInput> {
    let mut operations = vec![
        KeyCondition {
            condition: Condition::Equals(partition_key_value),
            name: partition_key_name.to_string(),
        }
        .compile(placeholders)?,
    ];
    if let Some((name, sort_key_condition)) = sort_key {
        let key_condition = KeyCondition {
            condition: Condition::from(sort_key_condition),
            name: name.to_string(),
        };
        operations.push(key_condition.compile(placeholders)?);
    }
    Ok(common::ExpressionInput::merge(&LogicalOperator::And, operations))
}
