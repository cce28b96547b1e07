//! Store façade: the operation surface over one table.
//!
//! Every operation compiles its request through [`read`]/[`write`], runs the
//! store-level plugin hooks and talks to a [`Transport`].
//!
//! ```rust,no_run
//! use dynamodb_entity::{common::key::PhysicalKey, config::StoreConfig, store::Store};
//! use serde_json::json;
//!
//! # async fn example() -> dynamodb_entity::Result<()> {
//! let store = Store::from_config(&StoreConfig {
//!     table_name: "app".to_string(),
//!     ..Default::default()
//! })
//! .await;
//! let record = json!({"pk": "USER#1", "sk": "USER#META", "name": "John"});
//! store.put(record.as_object().cloned().unwrap_or_default()).await?;
//! let key = PhysicalKey::new("USER#1", "USER#META")?;
//! let updated = store
//!     .update(&key, json!({"name": "Jane"}).as_object().cloned().unwrap_or_default())
//!     .await?;
//! assert_eq!(updated["name"], "Jane");
//! # Ok(())
//! # }
//! ```

use crate::{
    common::{Item, Record, key::PhysicalKey},
    config::StoreConfig,
    error::{Error, Result},
    plugin::{self, StorePlugin},
    read::{
        self,
        common::QueryResult,
        query::{Query, QueryParams},
        scan::{Scan, ScanParams},
    },
    transport::Transport,
    write::{
        self,
        batch_write_item::{BatchWriteItemRequest, WriteRequestInput},
        transact_write_items::TransactionItem,
    },
};

use futures_util::future::try_join_all;
use std::{fmt, sync::Arc};

/// Records returned by a batch get.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetResult {
    /// Records found, after the `after_get` hooks. Order is not preserved.
    pub items: Vec<Record>,
    /// Keys the store left unprocessed; retry them later.
    pub unprocessed_keys: Vec<PhysicalKey>,
}

/// Outcome of a batch write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteResult {
    /// Requests the store left unprocessed; retry them later.
    pub unprocessed: Vec<BatchWriteItemRequest>,
}

/// Operation surface over a single table.
///
/// Cheap to clone; clones share the transport and the plugin list.
#[derive(Clone)]
pub struct Store {
    transport: Arc<dyn Transport>,
    table_name: String,
    plugins: Arc<[StorePlugin]>,
    consistent_read: Option<bool>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("table_name", &self.table_name)
            .field("plugins", &self.plugins)
            .field("consistent_read", &self.consistent_read)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Store over `table_name`, without plugins.
    pub fn new(transport: Arc<dyn Transport>, table_name: impl Into<String>) -> Self {
        Self {
            transport,
            table_name: table_name.into(),
            plugins: Arc::from(Vec::new()),
            consistent_read: None,
        }
    }

    /// Store backed by a client built from `config`.
    pub async fn from_config(config: &StoreConfig) -> Self {
        let mut store = Self::new(Arc::new(config.client().await), config.table_name.clone());
        store.consistent_read = config.consistent_read;
        store
    }

    /// Replace the store-level plugins; they run in the given order.
    pub fn with_plugins(mut self, plugins: Vec<StorePlugin>) -> Self {
        self.plugins = Arc::from(plugins);
        self
    }

    /// Default read consistency for gets, queries and scans.
    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }

    /// Name of the table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn single_read_args(&self) -> read::common::SingleReadArgs {
        read::common::SingleReadArgs {
            consistent_read: self.consistent_read,
            selection: None,
            table_name: self.table_name.clone(),
        }
    }

    fn write_args(&self) -> write::common::WriteArgs {
        write::common::WriteArgs {
            condition: None,
            table_name: self.table_name.clone(),
        }
    }

    async fn after_get(&self, item: Item) -> Result<Option<Record>> {
        let record: Record = serde_dynamo::from_item(item)?;
        plugin::apply_read(
            &self.plugins,
            "after_get",
            |plugin| plugin.after_get.as_ref(),
            record,
        )
        .await
    }

    async fn before_put(&self, record: Record) -> Result<Record> {
        plugin::apply(
            &self.plugins,
            "before_put",
            |plugin| plugin.before_put.as_ref(),
            record,
        )
        .await
    }

    async fn before_delete(&self, key: PhysicalKey) -> Result<PhysicalKey> {
        plugin::apply(
            &self.plugins,
            "before_delete",
            |plugin| plugin.before_delete.as_ref(),
            key,
        )
        .await
    }

    async fn after_query(&self, result: QueryResult) -> Result<QueryResult> {
        plugin::apply(
            &self.plugins,
            "after_query",
            |plugin| plugin.after_query.as_ref(),
            result,
        )
        .await
    }

    /// Record stored at `key`, or `None`.
    ///
    /// An `after_get` hook hiding the record also yields `None`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.store.get", skip(self), fields(table = %self.table_name), err)
    )]
    pub async fn get(&self, key: &PhysicalKey) -> Result<Option<Record>> {
        let get_item = read::get_item::GetItem {
            key: key.clone(),
            single_read_args: self.single_read_args(),
        };
        match self.transport.get_item(get_item.into()).await? {
            Some(item) => self.after_get(item).await,
            None => Ok(None),
        }
    }

    async fn put_record(&self, record: Record) -> Result<Record> {
        let record = self.before_put(record).await?;
        let put_item = write::put_item::PutItem {
            record: record.clone(),
            write_args: self.write_args(),
        };
        self.transport.put_item(put_item.try_into()?).await?;
        Ok(record)
    }

    /// Insert or replace `record`, which must carry both key attributes.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.store.put", skip_all, fields(table = %self.table_name), err)
    )]
    pub async fn put(&self, record: Record) -> Result<()> {
        self.put_record(record).await?;
        Ok(())
    }

    /// Delete the record at `key`; deleting an absent key succeeds.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.store.delete", skip(self), fields(table = %self.table_name), err)
    )]
    pub async fn delete(&self, key: &PhysicalKey) -> Result<()> {
        let key = self.before_delete(key.clone()).await?;
        let delete_item = write::delete_item::DeleteItem {
            key,
            write_args: self.write_args(),
        };
        self.transport.delete_item(delete_item.try_into()?).await
    }

    /// Read, shallow-merge `updates` over the current record and put it back.
    ///
    /// Fails with [`Error::NotFound`] without writing when `key` holds no
    /// record. The key attributes always come from `key`. This is not atomic:
    /// a concurrent write between the read and the put is overwritten. Use
    /// [`Store::transaction`] with a condition when that matters.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.store.update", skip(self, updates), fields(table = %self.table_name), err)
    )]
    pub async fn update(&self, key: &PhysicalKey, updates: Record) -> Result<Record> {
        let mut merged = self
            .get(key)
            .await?
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;
        merged.extend(updates);
        key.assert_on(&mut merged);
        self.put_record(merged).await
    }

    /// One page of the partition `params.partition_key`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.store.query", skip_all, fields(table = %self.table_name), err)
    )]
    pub async fn query(&self, params: QueryParams) -> Result<QueryResult> {
        let mut params = plugin::apply(
            &self.plugins,
            "before_query",
            |plugin| plugin.before_query.as_ref(),
            params,
        )
        .await?;
        params.consistent_read = params.consistent_read.or(self.consistent_read);
        let query = Query {
            params,
            table_name: self.table_name.clone(),
        };
        let input: read::query::QueryInput = query.try_into()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            key_condition = %input.key_condition_expression,
            filter = ?input.multiple_read_input.filter_expression,
            "compiled query"
        );
        let page = self.transport.query(input).await?;
        self.after_query(QueryResult::from_page(page)?).await
    }

    /// Every page of the partition, aggregated.
    pub async fn query_all(&self, mut params: QueryParams) -> Result<QueryResult> {
        let mut result = self.query(params.clone()).await?;
        while let Some(cursor) = result.cursor.clone() {
            params.cursor = Some(cursor);
            let next = self.query(params.clone()).await?;
            result.extend(next);
        }
        Ok(result)
    }

    /// One page of the whole table or index.
    ///
    /// A scan reads every item and is the most expensive way to read; the
    /// filter only trims what is returned.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.store.scan", skip_all, fields(table = %self.table_name), err)
    )]
    pub async fn scan(&self, mut params: ScanParams) -> Result<QueryResult> {
        params.consistent_read = params.consistent_read.or(self.consistent_read);
        let scan = Scan {
            params,
            table_name: self.table_name.clone(),
        };
        let input: read::scan::ScanInput = scan.try_into()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(filter = ?input.multiple_read_input.filter_expression, "compiled scan");
        let page = self.transport.scan(input).await?;
        self.after_query(QueryResult::from_page(page)?).await
    }

    /// Every page of the whole table or index, aggregated.
    pub async fn scan_all(&self, mut params: ScanParams) -> Result<QueryResult> {
        let mut result = self.scan(params.clone()).await?;
        while let Some(cursor) = result.cursor.clone() {
            params.cursor = Some(cursor);
            let next = self.scan(params.clone()).await?;
            result.extend(next);
        }
        Ok(result)
    }

    /// Fetch many keys, 100 per request. Missing keys are simply absent.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.store.batch_get", skip_all, fields(table = %self.table_name, keys = keys.len()), err)
    )]
    pub async fn batch_get(&self, keys: Vec<PhysicalKey>) -> Result<BatchGetResult> {
        let batch_get_item = read::batch_get_item::BatchGetItem {
            keys,
            single_read_args: self.single_read_args(),
        };
        let inputs: Vec<read::batch_get_item::BatchGetItemInput> = batch_get_item.into();
        let outputs = try_join_all(
            inputs
                .into_iter()
                .map(|input| self.transport.batch_get_item(input)),
        )
        .await?;
        let mut result = BatchGetResult::default();
        for output in outputs {
            for item in output.items {
                if let Some(record) = self.after_get(item).await? {
                    result.items.push(record);
                }
            }
            for key in output.unprocessed_keys {
                let key: Record = serde_dynamo::from_item(key)?;
                result.unprocessed_keys.push(PhysicalKey::from_record(&key)?);
            }
        }
        Ok(result)
    }

    /// Put and delete many records, 25 per request, without atomicity.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.store.batch_write", skip_all, fields(table = %self.table_name, puts = puts.len(), deletes = deletes.len()), err)
    )]
    pub async fn batch_write(
        &self,
        puts: Vec<Record>,
        deletes: Vec<PhysicalKey>,
    ) -> Result<BatchWriteResult> {
        let mut requests = Vec::with_capacity(puts.len() + deletes.len());
        for record in puts {
            requests.push(BatchWriteItemRequest::PutItem(
                self.before_put(record).await?,
            ));
        }
        for key in deletes {
            requests.push(BatchWriteItemRequest::DeleteItem(
                self.before_delete(key).await?,
            ));
        }
        let batch_write_item = write::batch_write_item::BatchWriteItem {
            requests,
            table_name: self.table_name.clone(),
        };
        let inputs: Vec<write::batch_write_item::BatchWriteItemInput> =
            batch_write_item.try_into()?;
        let outputs = try_join_all(
            inputs
                .into_iter()
                .map(|input| self.transport.batch_write_item(input)),
        )
        .await?;
        let mut result = BatchWriteResult::default();
        for request in outputs.into_iter().flat_map(|output| output.unprocessed) {
            let request = match request {
                WriteRequestInput::Put(item) => {
                    BatchWriteItemRequest::PutItem(serde_dynamo::from_item(item)?)
                }
                WriteRequestInput::Delete(key) => {
                    let key: Record = serde_dynamo::from_item(key)?;
                    BatchWriteItemRequest::DeleteItem(PhysicalKey::from_record(&key)?)
                }
            };
            result.unprocessed.push(request);
        }
        Ok(result)
    }

    /// Apply every item or none of them.
    ///
    /// Puts run the `before_put` hooks and deletes the `before_delete` hooks.
    /// Updates are sent as given: each field replaces the stored attribute,
    /// with no read before the write.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.store.transaction", skip_all, fields(table = %self.table_name, items = items.len()), err)
    )]
    pub async fn transaction(&self, items: Vec<TransactionItem>) -> Result<()> {
        let mut hooked = Vec::with_capacity(items.len());
        for item in items {
            let item = match item {
                TransactionItem::Put { record, condition } => TransactionItem::Put {
                    record: self.before_put(record).await?,
                    condition,
                },
                TransactionItem::Delete { key, condition } => TransactionItem::Delete {
                    key: self.before_delete(key).await?,
                    condition,
                },
                item => item,
            };
            hooked.push(item);
        }
        let transact_write_items = write::transact_write_items::TransactWriteItems {
            items: hooked,
            table_name: self.table_name.clone(),
        };
        self.transport
            .transact_write_items(transact_write_items.try_into()?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::condition::{Filter, SortKeyCondition},
        plugin::{Hook, Read, ReadHook},
        transport::memory::MemoryTransport,
    };

    use rstest::rstest;
    use serde_json::{Value, json};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn key(pk: &str, sk: &str) -> PhysicalKey {
        PhysicalKey::new(pk, sk).unwrap()
    }

    fn store() -> (Arc<MemoryTransport>, Store) {
        let transport = Arc::new(MemoryTransport::new());
        let store = Store::new(transport.clone(), "app");
        (transport, store)
    }

    async fn seed_orders(store: &Store) {
        for (index, status) in ["paid", "open", "paid", "open", "paid"].iter().enumerate() {
            store
                .put(record(json!({
                    "pk": "USER#1",
                    "sk": format!("ORDER#{index}"),
                    "status": status,
                    "total": index * 10,
                })))
                .await
                .unwrap();
        }
        store
            .put(record(json!({"pk": "USER#1", "sk": "USER#META", "name": "John"})))
            .await
            .unwrap();
        store
            .put(record(json!({"pk": "USER#2", "sk": "ORDER#0", "status": "paid"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (_, store) = store();
        let stored = record(json!({"pk": "USER#1", "sk": "USER#META", "name": "John", "age": 30}));
        store.put(stored.clone()).await.unwrap();
        let actual = store.get(&key("USER#1", "USER#META")).await.unwrap();
        assert_eq!(actual, Some(stored));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_, store) = store();
        let actual = store.get(&key("USER#1", "USER#META")).await.unwrap();
        assert_eq!(actual, None);
    }

    #[tokio::test]
    async fn test_put_requires_key() {
        let (transport, store) = store();
        let actual = store.put(record(json!({"pk": "USER#1"}))).await;
        assert!(matches!(actual, Err(Error::MissingKeyAttribute(field)) if field == "sk"));
        assert_eq!(transport.writes(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_does_not_write() {
        let (transport, store) = store();
        let actual = store
            .update(&key("USER#1", "USER#META"), record(json!({"name": "Jane"})))
            .await;
        assert!(
            matches!(actual, Err(Error::NotFound { key }) if key.pk == "USER#1" && key.sk == "USER#META")
        );
        assert_eq!(transport.writes(), 0);
        assert_eq!(transport.len(), 0);
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_key() {
        let (_, store) = store();
        store
            .put(record(json!({"pk": "USER#1", "sk": "USER#META", "name": "John", "age": 30})))
            .await
            .unwrap();
        let actual = store
            .update(
                &key("USER#1", "USER#META"),
                record(json!({"name": "Jane", "pk": "USER#2"})),
            )
            .await
            .unwrap();
        let expected = record(json!({"pk": "USER#1", "sk": "USER#META", "name": "Jane", "age": 30}));
        assert_eq!(actual, expected);
        assert_eq!(
            store.get(&key("USER#1", "USER#META")).await.unwrap(),
            Some(expected)
        );
        assert_eq!(store.get(&key("USER#2", "USER#META")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let (transport, store) = store();
        store
            .put(record(json!({"pk": "USER#1", "sk": "USER#META"})))
            .await
            .unwrap();
        store.delete(&key("USER#9", "USER#META")).await.unwrap();
        assert_eq!(transport.len(), 1);
        assert!(transport.item("USER#1", "USER#META").is_some());
    }

    #[tokio::test]
    async fn test_after_get_hides_soft_deleted() {
        let transport = Arc::new(MemoryTransport::new());
        let store = Store::new(transport.clone(), "app").with_plugins(vec![
            StorePlugin::new("soft_delete").after_get(ReadHook::sync(|record: Record| {
                if record.get("deleted") == Some(&Value::Bool(true)) {
                    Ok(Read::Hidden)
                } else {
                    Ok(Read::Unchanged)
                }
            })),
        ]);
        store
            .put(record(json!({"pk": "USER#1", "sk": "USER#META", "deleted": true})))
            .await
            .unwrap();
        store
            .put(record(json!({"pk": "USER#2", "sk": "USER#META", "deleted": false})))
            .await
            .unwrap();
        assert_eq!(store.get(&key("USER#1", "USER#META")).await.unwrap(), None);
        assert!(store.get(&key("USER#2", "USER#META")).await.unwrap().is_some());
        assert!(transport.item("USER#1", "USER#META").is_some());
    }

    #[tokio::test]
    async fn test_before_put_and_before_delete_hooks() {
        let transport = Arc::new(MemoryTransport::new());
        let store = Store::new(transport.clone(), "app").with_plugins(vec![
            StorePlugin::new("audit")
                .before_put(Hook::sync(|mut record: Record| {
                    record.insert("audited".to_string(), json!(true));
                    Ok(Some(record))
                }))
                .before_delete(Hook::sync(|key: PhysicalKey| {
                    Ok(Some(PhysicalKey {
                        sk: format!("{}#ARCHIVE", key.sk),
                        ..key
                    }))
                })),
        ]);
        store
            .put(record(json!({"pk": "USER#1", "sk": "USER#META"})))
            .await
            .unwrap();
        let actual = store.get(&key("USER#1", "USER#META")).await.unwrap().unwrap();
        assert_eq!(actual.get("audited"), Some(&json!(true)));
        store.delete(&key("USER#1", "USER#META")).await.unwrap();
        assert!(transport.item("USER#1", "USER#META").is_some());
    }

    #[rstest]
    #[case::whole_partition(QueryParams::new("USER#1"), vec!["ORDER#0", "ORDER#1", "ORDER#2", "ORDER#3", "ORDER#4", "USER#META"])]
    #[case::begins_with(
        QueryParams {
            sort_key: Some(SortKeyCondition::BeginsWith("ORDER#".to_string())),
            ..QueryParams::new("USER#1")
        },
        vec!["ORDER#0", "ORDER#1", "ORDER#2", "ORDER#3", "ORDER#4"]
    )]
    #[case::descending_with_filter(
        QueryParams {
            sort_key: Some(SortKeyCondition::BeginsWith("ORDER#".to_string())),
            filter: Some(Filter::eq("status", json!("paid"))),
            ascending: Some(false),
            ..QueryParams::new("USER#1")
        },
        vec!["ORDER#4", "ORDER#2", "ORDER#0"]
    )]
    #[case::between(
        QueryParams {
            sort_key: Some(SortKeyCondition::Between("ORDER#1".to_string(), "ORDER#3".to_string())),
            ..QueryParams::new("USER#1")
        },
        vec!["ORDER#1", "ORDER#2", "ORDER#3"]
    )]
    #[tokio::test]
    async fn test_query(#[case] params: QueryParams, #[case] expected: Vec<&str>) {
        let (_, store) = store();
        seed_orders(&store).await;
        let result = store.query(params).await.unwrap();
        let actual: Vec<_> = result
            .items
            .iter()
            .map(|item| item["sk"].as_str().unwrap())
            .collect();
        assert_eq!(actual, expected);
        assert_eq!(result.count, expected.len());
        assert!(!result.has_more);
        assert_eq!(result.cursor, None);
    }

    #[tokio::test]
    async fn test_query_pagination() {
        let (_, store) = store();
        seed_orders(&store).await;
        let mut params = QueryParams {
            sort_key: Some(SortKeyCondition::BeginsWith("ORDER#".to_string())),
            limit: Some(2),
            ..QueryParams::new("USER#1")
        };
        let mut pages = Vec::new();
        loop {
            let page = store.query(params.clone()).await.unwrap();
            pages.push(
                page.items
                    .iter()
                    .map(|item| item["sk"].as_str().unwrap().to_string())
                    .collect::<Vec<_>>(),
            );
            match page.cursor {
                Some(cursor) => {
                    assert!(page.has_more);
                    params.cursor = Some(cursor);
                }
                None => break,
            }
        }
        assert_eq!(
            pages,
            vec![
                vec!["ORDER#0", "ORDER#1"],
                vec!["ORDER#2", "ORDER#3"],
                vec!["ORDER#4"],
            ]
        );
        params.cursor = None;
        let all = store.query_all(params).await.unwrap();
        assert_eq!(all.count, 5);
        assert_eq!(all.scanned_count, Some(5));
        assert!(!all.has_more);
    }

    #[tokio::test]
    async fn test_query_requires_partition_key() {
        let (_, store) = store();
        let actual = store.query(QueryParams::default()).await;
        assert!(matches!(actual, Err(Error::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_query_hooks() {
        let transport = Arc::new(MemoryTransport::new());
        let store = Store::new(transport, "app").with_plugins(vec![
            StorePlugin::new("only_orders")
                .before_query(Hook::sync(|params: QueryParams| {
                    Ok(Some(QueryParams {
                        sort_key: Some(SortKeyCondition::BeginsWith("ORDER#".to_string())),
                        ..params
                    }))
                }))
                .after_query(Hook::sync(|mut result: QueryResult| {
                    result.items.truncate(1);
                    result.count = result.items.len();
                    Ok(Some(result))
                })),
        ]);
        seed_orders(&store).await;
        let result = store.query(QueryParams::new("USER#1")).await.unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.items[0]["sk"], json!("ORDER#0"));
    }

    #[tokio::test]
    async fn test_scan() {
        let (_, store) = store();
        seed_orders(&store).await;
        let params = ScanParams {
            filter: Some(Filter::and(vec![
                Filter::eq("status", json!("paid")),
                Filter::not(Filter::eq("pk", json!("USER#2"))),
            ])),
            limit: Some(3),
            ..Default::default()
        };
        let page = store.scan(params.clone()).await.unwrap();
        assert!(page.has_more);
        assert_eq!(page.scanned_count, Some(3));
        let all = store.scan_all(params).await.unwrap();
        assert_eq!(all.count, 3);
        assert_eq!(all.scanned_count, Some(7));
        assert!(all.items.iter().all(|item| item["status"] == json!("paid")));
    }

    #[tokio::test]
    async fn test_batch_write_then_batch_get() {
        let (transport, store) = store();
        let puts = (0..30)
            .map(|index| record(json!({"pk": format!("USER#{index}"), "sk": "USER#META"})))
            .collect();
        let result = store.batch_write(puts, vec![]).await.unwrap();
        assert!(result.unprocessed.is_empty());
        assert_eq!(transport.len(), 30);
        let result = store
            .batch_write(vec![], vec![key("USER#0", "USER#META"), key("USER#1", "USER#META")])
            .await
            .unwrap();
        assert!(result.unprocessed.is_empty());
        assert_eq!(transport.len(), 28);
        let keys = (0..5)
            .map(|index| key(&format!("USER#{index}"), "USER#META"))
            .collect();
        let result = store.batch_get(keys).await.unwrap();
        let mut actual: Vec<_> = result
            .items
            .iter()
            .map(|item| item["pk"].as_str().unwrap().to_string())
            .collect();
        actual.sort();
        assert_eq!(actual, vec!["USER#2", "USER#3", "USER#4"]);
        assert!(result.unprocessed_keys.is_empty());
    }

    #[tokio::test]
    async fn test_transaction_applies_all() {
        let (_, store) = store();
        store
            .put(record(json!({"pk": "ACCOUNT#1", "sk": "META", "balance": 100})))
            .await
            .unwrap();
        store
            .put(record(json!({"pk": "ACCOUNT#2", "sk": "META", "balance": 0})))
            .await
            .unwrap();
        store
            .transaction(vec![
                TransactionItem::Update {
                    key: key("ACCOUNT#1", "META"),
                    updates: record(json!({"balance": 60})),
                    condition: Some(Filter::eq("balance", json!(100))),
                },
                TransactionItem::Update {
                    key: key("ACCOUNT#2", "META"),
                    updates: record(json!({"balance": 40})),
                    condition: None,
                },
                TransactionItem::Put {
                    record: record(json!({"pk": "TRANSFER#1", "sk": "META", "amount": 40})),
                    condition: Some(Filter::not_exists("pk")),
                },
            ])
            .await
            .unwrap();
        let balance = |record: Option<Record>| record.unwrap()["balance"].clone();
        assert_eq!(
            balance(store.get(&key("ACCOUNT#1", "META")).await.unwrap()),
            json!(60)
        );
        assert_eq!(
            balance(store.get(&key("ACCOUNT#2", "META")).await.unwrap()),
            json!(40)
        );
        assert!(store.get(&key("TRANSFER#1", "META")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_transaction_failed_condition_changes_nothing() {
        let (transport, store) = store();
        store
            .put(record(json!({"pk": "ACCOUNT#1", "sk": "META", "balance": 100})))
            .await
            .unwrap();
        let writes = transport.writes();
        let actual = store
            .transaction(vec![
                TransactionItem::Update {
                    key: key("ACCOUNT#1", "META"),
                    updates: record(json!({"balance": 0})),
                    condition: None,
                },
                TransactionItem::Put {
                    record: record(json!({"pk": "ACCOUNT#2", "sk": "META", "balance": 100})),
                    condition: None,
                },
                TransactionItem::ConditionCheck {
                    key: key("ACCOUNT#3", "META"),
                    condition: Filter::exists("pk"),
                },
            ])
            .await;
        match actual {
            Err(Error::TransactionAborted { reasons }) => assert_eq!(
                reasons,
                vec!["None", "None", "ConditionalCheckFailed"]
            ),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(transport.writes(), writes);
        assert_eq!(
            store.get(&key("ACCOUNT#1", "META")).await.unwrap().unwrap()["balance"],
            json!(100)
        );
        assert_eq!(store.get(&key("ACCOUNT#2", "META")).await.unwrap(), None);
    }
}
