//! In-memory table evaluating the compiled expressions, for tests.
//!
//! Understands the subset of the expression language the compiler emits:
//! comparisons, `BETWEEN`, `IN`, `attribute_exists`, `attribute_not_exists`,
//! `begins_with`, `contains`, `AND`, `OR`, `NOT` and parentheses, plus
//! `SET` assignments. Items are kept ordered by `(pk, sk)`.

use crate::{
    common::{Item, key},
    error::{Error, Result},
    read::{
        batch_get_item::{BatchGetItemInput, BatchGetItemOutput},
        common::{MultipleReadInput, Page},
        get_item::GetItemInput,
        query::QueryInput,
        scan::ScanInput,
    },
    transport::Transport,
    write::{
        batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput, WriteRequestInput},
        common::WriteInput,
        delete_item::DeleteItemInput,
        put_item::PutItemInput,
        transact_write_items::{TransactWriteInput, TransactWriteItemsInput},
    },
};

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use std::{
    cmp, collections,
    sync::{Mutex, atomic},
};

type TableKey = (String, String);

#[derive(Debug, Default)]
pub(crate) struct MemoryTransport {
    items: Mutex<collections::BTreeMap<TableKey, Item>>,
    writes: atomic::AtomicUsize,
}

impl MemoryTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of items written so far, across every write operation.
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(atomic::Ordering::SeqCst)
    }

    pub(crate) fn item(&self, pk: &str, sk: &str) -> Option<Item> {
        self.items
            .lock()
            .unwrap()
            .get(&(pk.to_string(), sk.to_string()))
            .cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    fn store(&self, items: &mut collections::BTreeMap<TableKey, Item>, item: Item) {
        items.insert(table_key(&item), item);
        self.writes.fetch_add(1, atomic::Ordering::SeqCst);
    }

    fn remove(&self, items: &mut collections::BTreeMap<TableKey, Item>, key: &Item) {
        items.remove(&table_key(key));
        self.writes.fetch_add(1, atomic::Ordering::SeqCst);
    }

    fn read_page(
        &self,
        key_condition_expression: Option<&str>,
        input: MultipleReadInput,
        ascending: bool,
    ) -> Page {
        let context = Context::new(
            input.expression_attribute_names.as_ref(),
            input.expression_attribute_values.as_ref(),
        );
        let items = self.items.lock().unwrap();
        let mut candidates: Vec<&Item> = items
            .values()
            .filter(|item| {
                key_condition_expression
                    .is_none_or(|expression| context.evaluate(expression, item))
            })
            .collect();
        if !ascending {
            candidates.reverse();
        }
        if let Some(start) = &input.exclusive_start_key {
            let start = table_key(start);
            if let Some(position) = candidates.iter().position(|item| table_key(item) == start) {
                candidates = candidates.split_off(position + 1);
            }
        }
        let limit = input
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);
        let evaluated: Vec<&Item> = candidates.iter().take(limit).copied().collect();
        let last_evaluated_key = if candidates.len() > evaluated.len() {
            evaluated.last().map(|item| {
                let (pk, sk) = table_key(item);
                Item::from([
                    (key::PARTITION_KEY.to_string(), AttributeValue::S(pk)),
                    (key::SORT_KEY.to_string(), AttributeValue::S(sk)),
                ])
            })
        } else {
            None
        };
        let returned: Vec<Item> = evaluated
            .iter()
            .filter(|item| {
                input
                    .filter_expression
                    .as_deref()
                    .is_none_or(|expression| context.evaluate(expression, item))
            })
            .map(|item| context.project(input.projection_expression.as_deref(), item))
            .collect();
        Page {
            count: returned.len() as i32,
            scanned_count: evaluated.len() as i32,
            items: returned,
            last_evaluated_key,
        }
    }
}

fn table_key(item: &Item) -> TableKey {
    let component = |name: &str| match item.get(name) {
        Some(AttributeValue::S(value)) => value.clone(),
        other => panic!("item has no string `{name}`: {other:?}"),
    };
    (component(key::PARTITION_KEY), component(key::SORT_KEY))
}

fn condition_holds(write_input: &WriteInput, existing: Option<&Item>) -> bool {
    let Some(expression) = &write_input.condition_expression else {
        return true;
    };
    let empty = Item::new();
    Context::new(
        write_input.expression_attribute_names.as_ref(),
        write_input.expression_attribute_values.as_ref(),
    )
    .evaluate(expression, existing.unwrap_or(&empty))
}

fn apply_set(
    update_expression: &str,
    write_input: &WriteInput,
    mut item: Item,
) -> Item {
    let context = Context::new(
        write_input.expression_attribute_names.as_ref(),
        write_input.expression_attribute_values.as_ref(),
    );
    let assignments = update_expression
        .strip_prefix("SET ")
        .unwrap_or_else(|| panic!("unsupported update expression {update_expression}"));
    for assignment in assignments.split(", ") {
        let (name, value) = assignment
            .split_once(" = ")
            .unwrap_or_else(|| panic!("unsupported assignment {assignment}"));
        item.insert(context.name(name).to_string(), context.value(value).clone());
    }
    item
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get_item(&self, input: GetItemInput) -> Result<Option<Item>> {
        let items = self.items.lock().unwrap();
        let context = Context::new(input.single_read_input.expression_attribute_names.as_ref(), None);
        Ok(items.get(&table_key(&input.key)).map(|item| {
            context.project(
                input.single_read_input.projection_expression.as_deref(),
                item,
            )
        }))
    }

    async fn put_item(&self, input: PutItemInput) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        if !condition_holds(&input.write_input, items.get(&table_key(&input.item))) {
            return Err(Error::Conflict("conditional check failed".to_string()));
        }
        self.store(&mut items, input.item);
        Ok(())
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        if !condition_holds(&input.write_input, items.get(&table_key(&input.key))) {
            return Err(Error::Conflict("conditional check failed".to_string()));
        }
        self.remove(&mut items, &input.key);
        Ok(())
    }

    async fn query(&self, input: QueryInput) -> Result<Page> {
        Ok(self.read_page(
            Some(input.key_condition_expression.as_str()),
            input.multiple_read_input,
            input.scan_index_forward.unwrap_or(true),
        ))
    }

    async fn scan(&self, input: ScanInput) -> Result<Page> {
        Ok(self.read_page(None, input.multiple_read_input, true))
    }

    async fn batch_get_item(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput> {
        let items = self.items.lock().unwrap();
        let context = Context::new(input.single_read_input.expression_attribute_names.as_ref(), None);
        let found = input
            .keys
            .iter()
            .filter_map(|key| items.get(&table_key(key)))
            .map(|item| {
                context.project(
                    input.single_read_input.projection_expression.as_deref(),
                    item,
                )
            })
            .collect();
        Ok(BatchGetItemOutput {
            items: found,
            unprocessed_keys: Vec::new(),
        })
    }

    async fn batch_write_item(&self, input: BatchWriteItemInput) -> Result<BatchWriteItemOutput> {
        let mut items = self.items.lock().unwrap();
        for request in input.requests {
            match request {
                WriteRequestInput::Put(item) => self.store(&mut items, item),
                WriteRequestInput::Delete(key) => self.remove(&mut items, &key),
            }
        }
        Ok(BatchWriteItemOutput::default())
    }

    async fn transact_write_items(&self, input: TransactWriteItemsInput) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        let reasons: Vec<String> = input
            .items
            .iter()
            .map(|item| {
                let (key, write_input) = match item {
                    TransactWriteInput::Put(put_item) => (&put_item.item, &put_item.write_input),
                    TransactWriteInput::Update(update_item) => {
                        (&update_item.key, &update_item.write_input)
                    }
                    TransactWriteInput::Delete(delete_item) => {
                        (&delete_item.key, &delete_item.write_input)
                    }
                    TransactWriteInput::ConditionCheck { key, write_input } => (key, write_input),
                };
                if condition_holds(write_input, items.get(&table_key(key))) {
                    "None".to_string()
                } else {
                    "ConditionalCheckFailed".to_string()
                }
            })
            .collect();
        if reasons.iter().any(|reason| reason != "None") {
            return Err(Error::TransactionAborted { reasons });
        }
        for item in input.items {
            match item {
                TransactWriteInput::Put(put_item) => self.store(&mut items, put_item.item),
                TransactWriteInput::Update(update_item) => {
                    let existing = items
                        .get(&table_key(&update_item.key))
                        .cloned()
                        .unwrap_or_else(|| update_item.key.clone());
                    let updated = apply_set(
                        &update_item.update_expression,
                        &update_item.write_input,
                        existing,
                    );
                    self.store(&mut items, updated);
                }
                TransactWriteInput::Delete(delete_item) => {
                    self.remove(&mut items, &delete_item.key)
                }
                TransactWriteInput::ConditionCheck { .. } => {}
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Open,
    Close,
    Comma,
    Comparator(String),
    Word(String),
}

fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();
    while let Some(&char) = chars.peek() {
        match char {
            ' ' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '<' | '>' | '=' => {
                let mut comparator = String::new();
                while let Some(&next) = chars.peek() {
                    if matches!(next, '<' | '>' | '=') {
                        comparator.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Comparator(comparator));
            }
            _ => {
                let mut word = String::new();
                while let Some(&next) = chars.peek() {
                    if matches!(next, ' ' | '(' | ')' | ',' | '<' | '>' | '=') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    tokens
}

struct Context<'a> {
    names: Option<&'a collections::HashMap<String, String>>,
    values: Option<&'a collections::HashMap<String, AttributeValue>>,
}

impl<'a> Context<'a> {
    fn new(
        names: Option<&'a collections::HashMap<String, String>>,
        values: Option<&'a collections::HashMap<String, AttributeValue>>,
    ) -> Self {
        Self { names, values }
    }

    fn name<'b>(&'b self, placeholder: &'b str) -> &'b str {
        self.names
            .and_then(|names| names.get(placeholder))
            .map(String::as_str)
            .unwrap_or(placeholder)
    }

    fn value(&self, placeholder: &str) -> &AttributeValue {
        self.values
            .and_then(|values| values.get(placeholder))
            .unwrap_or_else(|| panic!("unbound value placeholder {placeholder}"))
    }

    fn resolve<'i>(&self, path: &str, item: &'i Item) -> Option<&'i AttributeValue> {
        let mut segments = path.split('.');
        let mut current = item.get(self.name(segments.next()?))?;
        for segment in segments {
            current = match current {
                AttributeValue::M(map) => map.get(self.name(segment))?,
                _ => return None,
            };
        }
        Some(current)
    }

    fn project(&self, projection_expression: Option<&str>, item: &Item) -> Item {
        let Some(projection_expression) = projection_expression else {
            return item.clone();
        };
        projection_expression
            .split(", ")
            .filter_map(|path| {
                let top = self.name(path.split('.').next()?).to_string();
                item.get(&top).map(|value| (top, value.clone()))
            })
            .collect()
    }

    fn evaluate(&self, expression: &str, item: &Item) -> bool {
        let tokens = tokenize(expression);
        let mut parser = Parser {
            context: self,
            item,
            tokens: &tokens,
            position: 0,
        };
        let result = parser.or();
        assert_eq!(parser.position, tokens.len(), "trailing tokens in {expression}");
        result
    }
}

struct Parser<'a, 'c> {
    context: &'a Context<'c>,
    item: &'a Item,
    tokens: &'a [Token],
    position: usize,
}

impl Parser<'_, '_> {
    fn next(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        self.position += 1;
        token
    }

    fn peek_word(&self, expected: &str) -> bool {
        matches!(self.tokens.get(self.position), Some(Token::Word(word)) if word == expected)
    }

    fn expect(&mut self, expected: Token) {
        let token = self.next();
        assert_eq!(token, expected);
    }

    fn word(&mut self) -> String {
        match self.next() {
            Token::Word(word) => word,
            token => panic!("expected operand, found {token:?}"),
        }
    }

    fn or(&mut self) -> bool {
        let mut result = self.and();
        while self.peek_word("OR") {
            self.position += 1;
            let right = self.and();
            result = result || right;
        }
        result
    }

    fn and(&mut self) -> bool {
        let mut result = self.unary();
        while self.peek_word("AND") {
            self.position += 1;
            let right = self.unary();
            result = result && right;
        }
        result
    }

    fn unary(&mut self) -> bool {
        if self.peek_word("NOT") {
            self.position += 1;
            return !self.unary();
        }
        if self.tokens.get(self.position) == Some(&Token::Open) {
            self.position += 1;
            let result = self.or();
            self.expect(Token::Close);
            return result;
        }
        self.primary()
    }

    fn operand(&self, word: &str) -> Option<AttributeValue> {
        if word.starts_with(':') {
            Some(self.context.value(word).clone())
        } else {
            self.context.resolve(word, self.item).cloned()
        }
    }

    fn function(&mut self, name: &str) -> bool {
        self.expect(Token::Open);
        let path = self.word();
        let attribute = self.context.resolve(&path, self.item).cloned();
        let argument = if self.tokens.get(self.position) == Some(&Token::Comma) {
            self.position += 1;
            let placeholder = self.word();
            Some(self.context.value(&placeholder).clone())
        } else {
            None
        };
        self.expect(Token::Close);
        match (name, attribute, argument) {
            ("attribute_exists", attribute, None) => attribute.is_some(),
            ("attribute_not_exists", attribute, None) => attribute.is_none(),
            ("begins_with", Some(AttributeValue::S(value)), Some(AttributeValue::S(prefix))) => {
                value.starts_with(&prefix)
            }
            ("contains", Some(AttributeValue::S(value)), Some(AttributeValue::S(needle))) => {
                value.contains(&needle)
            }
            ("contains", Some(AttributeValue::L(members)), Some(needle)) => {
                members.contains(&needle)
            }
            ("contains", Some(AttributeValue::Ss(members)), Some(AttributeValue::S(needle))) => {
                members.contains(&needle)
            }
            _ => false,
        }
    }

    fn primary(&mut self) -> bool {
        let word = self.word();
        if matches!(
            word.as_str(),
            "attribute_exists" | "attribute_not_exists" | "begins_with" | "contains"
        ) {
            return self.function(&word);
        }
        let left = self.operand(&word);
        match self.next() {
            Token::Comparator(comparator) => {
                let right_word = self.word();
                let right = self.operand(&right_word);
                let (Some(left), Some(right)) = (left, right) else {
                    return comparator == "<>";
                };
                let ordering = compare(&left, &right);
                match comparator.as_str() {
                    "=" => left == right,
                    "<>" => left != right,
                    "<" => ordering == Some(cmp::Ordering::Less),
                    "<=" => matches!(ordering, Some(cmp::Ordering::Less | cmp::Ordering::Equal)),
                    ">" => ordering == Some(cmp::Ordering::Greater),
                    ">=" => matches!(
                        ordering,
                        Some(cmp::Ordering::Greater | cmp::Ordering::Equal)
                    ),
                    other => panic!("unsupported comparator {other}"),
                }
            }
            Token::Word(keyword) if keyword == "BETWEEN" => {
                let low_word = self.word();
                let low = self.operand(&low_word);
                assert_eq!(self.word(), "AND");
                let high_word = self.word();
                let high = self.operand(&high_word);
                match (left, low, high) {
                    (Some(left), Some(low), Some(high)) => {
                        compare(&left, &low).is_some_and(|ordering| ordering != cmp::Ordering::Less)
                            && compare(&left, &high)
                                .is_some_and(|ordering| ordering != cmp::Ordering::Greater)
                    }
                    _ => false,
                }
            }
            Token::Word(keyword) if keyword == "IN" => {
                self.expect(Token::Open);
                let mut members = vec![self.word()];
                while self.tokens.get(self.position) == Some(&Token::Comma) {
                    self.position += 1;
                    members.push(self.word());
                }
                self.expect(Token::Close);
                members
                    .iter()
                    .any(|member| left.is_some() && self.operand(member) == left)
            }
            token => panic!("unsupported token {token:?} after {word}"),
        }
    }
}

fn compare(left: &AttributeValue, right: &AttributeValue) -> Option<cmp::Ordering> {
    match (left, right) {
        (AttributeValue::S(left), AttributeValue::S(right)) => Some(left.cmp(right)),
        (AttributeValue::N(left), AttributeValue::N(right)) => left
            .parse::<f64>()
            .ok()?
            .partial_cmp(&right.parse::<f64>().ok()?),
        (AttributeValue::B(left), AttributeValue::B(right)) => {
            Some(left.as_ref().cmp(right.as_ref()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn n(value: &str) -> AttributeValue {
        AttributeValue::N(value.to_string())
    }

    #[rstest]
    #[case::equals("#n0 = :v0", true)]
    #[case::not_equals("#n0 <> :v0", false)]
    #[case::missing_attribute_not_equal("#n2 <> :v0", true)]
    #[case::greater("#n1 > :v1", true)]
    #[case::between("#n1 BETWEEN :v1 AND :v2", true)]
    #[case::in_list("#n0 IN (:v3, :v0)", true)]
    #[case::exists_and_begins("(attribute_exists(#n0) AND begins_with(#n0, :v4))", true)]
    #[case::or_group("(#n0 = :v3 OR #n1 >= :v2)", false)]
    #[case::negated("NOT (#n0 = :v3)", true)]
    #[case::not_exists("attribute_not_exists(#n2)", true)]
    fn test_evaluate(#[case] expression: &str, #[case] expected: bool) {
        let names = collections::HashMap::from([
            ("#n0".to_string(), "name".to_string()),
            ("#n1".to_string(), "age".to_string()),
            ("#n2".to_string(), "email".to_string()),
        ]);
        let values = collections::HashMap::from([
            (":v0".to_string(), s("John")),
            (":v1".to_string(), n("20")),
            (":v2".to_string(), n("40")),
            (":v3".to_string(), s("Jane")),
            (":v4".to_string(), s("Jo")),
        ]);
        let item = Item::from([("name".to_string(), s("John")), ("age".to_string(), n("30"))]);
        let context = Context::new(Some(&names), Some(&values));
        assert_eq!(context.evaluate(expression, &item), expected);
    }
}
