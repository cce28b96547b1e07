//! Schema-validated, key-bound CRUD over the store façade.
//!
//! An [`Entity`] binds a name, a [`Schema`], a [`KeyTransformer`] and an
//! ordered list of [`EntityPlugin`]s. It is built once and shared; every
//! operation only reads it.
//!
//! ```rust,no_run
//! use dynamodb_entity::{
//!     common::key::KeyTransformer,
//!     config::StoreConfig,
//!     entity::{Entity, Unchecked},
//!     store::Store,
//! };
//! use serde_json::json;
//!
//! # async fn example() -> dynamodb_entity::Result<()> {
//! let store = Store::from_config(&StoreConfig {
//!     table_name: "app".to_string(),
//!     ..Default::default()
//! })
//! .await;
//! let users = Entity::new("user", store, Unchecked, KeyTransformer::single("USER"));
//! let user = json!({"id": "42", "name": "John"});
//! users.create(user.as_object().cloned().unwrap_or_default()).await?;
//! let found = users.get("42").await?;
//! assert_eq!(found.map(|user| user["name"].clone()), Some(json!("John")));
//! # Ok(())
//! # }
//! ```

use crate::{
    common::{
        Record,
        condition::{Filter, SortKeyCondition},
        cursor::Cursor,
        key::{KeyTransformer, PhysicalKey},
        selection::SelectionMap,
    },
    error::{Error, Issue, Result, ValidationError},
    plugin::{self, EntityPlugin, UpdateRequest},
    read::{
        common::{QueryResult, SecondaryIndex},
        query::QueryParams,
        scan::ScanParams,
    },
    store::Store,
};

use futures_util::future::try_join_all;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{fmt, marker::PhantomData, sync::Arc};

/// Validation contract of an entity.
///
/// Runs once per create, read and update. The returned record replaces the
/// candidate, so a schema may normalize as well as reject.
pub trait Schema: Send + Sync {
    /// Accept `record`, possibly normalized, or describe every problem found.
    fn validate(&self, record: Record) -> Result<Record, ValidationError>;
}

impl<F> Schema for F
where
    F: Fn(Record) -> Result<Record, ValidationError> + Send + Sync,
{
    fn validate(&self, record: Record) -> Result<Record, ValidationError> {
        self(record)
    }
}

/// Schema accepting every record as is.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Unchecked;

impl Schema for Unchecked {
    fn validate(&self, record: Record) -> Result<Record, ValidationError> {
        Ok(record)
    }
}

/// Schema backed by a serde type: a record is valid when it deserializes
/// into `T`, and is normalized to what `T` serializes back to.
pub struct Typed<T>(PhantomData<fn() -> T>);

impl<T> Typed<T> {
    /// Schema of `T`.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Typed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Typed<{}>", std::any::type_name::<T>())
    }
}

impl<T> Schema for Typed<T>
where
    T: Serialize + DeserializeOwned,
{
    fn validate(&self, record: Record) -> Result<Record, ValidationError> {
        let invalid = |message: String| {
            ValidationError::single(Issue {
                path: Vec::new(),
                message,
            })
        };
        let value: T = serde_json::from_value(Value::Object(record))
            .map_err(|error| invalid(error.to_string()))?;
        match serde_json::to_value(value) {
            Ok(Value::Object(record)) => Ok(record),
            Ok(other) => Err(invalid(format!("expected an object, found {other}"))),
            Err(error) => Err(invalid(error.to_string())),
        }
    }
}

/// A logical record type stored in the table.
#[derive(Clone, Debug)]
pub struct Entity<S> {
    name: String,
    store: Store,
    schema: S,
    keys: KeyTransformer,
    plugins: Arc<[EntityPlugin]>,
}

impl<S: Schema> Entity<S> {
    /// Entity `name` stored through `store`, validated by `schema` and addressed by `keys`.
    pub fn new(name: impl Into<String>, store: Store, schema: S, keys: KeyTransformer) -> Self {
        Self {
            name: name.into(),
            store,
            schema,
            keys,
            plugins: Arc::from(Vec::new()),
        }
    }

    /// Replace the entity-level plugins; they run in the given order.
    pub fn with_plugins(mut self, plugins: Vec<EntityPlugin>) -> Self {
        self.plugins = Arc::from(plugins);
        self
    }

    /// Name of the entity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Addressing strategy of the entity.
    pub fn key_transformer(&self) -> &KeyTransformer {
        &self.keys
    }

    /// Turn a physical record into a domain record: strip, validate, `after_get`.
    async fn hydrate(&self, mut record: Record) -> Result<Option<Record>> {
        PhysicalKey::strip(&mut record);
        let record = self.schema.validate(record)?;
        plugin::apply_read(
            &self.plugins,
            "after_get",
            |plugin| plugin.after_get.as_ref(),
            record,
        )
        .await
    }

    /// Validate and store a new record; returns it after the `after_create` hooks.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.entity.create", skip_all, fields(entity = %self.name), err)
    )]
    pub async fn create(&self, input: Record) -> Result<Record> {
        let record = self.schema.validate(input)?;
        let record = plugin::apply(
            &self.plugins,
            "before_create",
            |plugin| plugin.before_create.as_ref(),
            record,
        )
        .await?;
        let key = self.keys.to_key(&record)?;
        let mut physical = record.clone();
        key.assert_on(&mut physical);
        self.store.put(physical).await?;
        plugin::apply(
            &self.plugins,
            "after_create",
            |plugin| plugin.after_create.as_ref(),
            record,
        )
        .await
    }

    /// Record with identifier `id`, or `None` when absent or hidden by a hook.
    ///
    /// Needs a key strategy that can rebuild a key from an identifier.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.entity.get", skip(self), fields(entity = %self.name), err)
    )]
    pub async fn get(&self, id: &str) -> Result<Option<Record>> {
        let id = plugin::apply(
            &self.plugins,
            "before_get",
            |plugin| plugin.before_get.as_ref(),
            id.to_string(),
        )
        .await?;
        let key = self.keys.from_id(&id)?;
        match self.store.get(&key).await? {
            Some(record) => self.hydrate(record).await,
            None => Ok(None),
        }
    }

    /// Merge `updates` over the current record, validate and write it.
    ///
    /// Fails with [`Error::NotFound`] when `id` has no record. The merged
    /// record goes through [`Store::update`], which reads and merges once
    /// more before writing.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.entity.update", skip(self, updates), fields(entity = %self.name), err)
    )]
    pub async fn update(&self, id: &str, updates: Record) -> Result<Record> {
        let Some(mut merged) = self.get(id).await? else {
            return Err(Error::NotFound {
                key: self.keys.from_id(id)?,
            });
        };
        let request = plugin::apply(
            &self.plugins,
            "before_update",
            |plugin| plugin.before_update.as_ref(),
            UpdateRequest {
                id: id.to_string(),
                updates,
            },
        )
        .await?;
        merged.extend(request.updates);
        let validated = self.schema.validate(merged)?;
        let key = self.keys.from_id(&request.id)?;
        self.store.update(&key, validated.clone()).await?;
        plugin::apply(
            &self.plugins,
            "after_update",
            |plugin| plugin.after_update.as_ref(),
            validated,
        )
        .await
    }

    /// Delete the record with identifier `id`; an absent record is not an error.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.entity.delete", skip(self), fields(entity = %self.name), err)
    )]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = plugin::apply(
            &self.plugins,
            "before_delete",
            |plugin| plugin.before_delete.as_ref(),
            id.to_string(),
        )
        .await?;
        let key = self.keys.from_id(&id)?;
        self.store.delete(&key).await?;
        plugin::apply(
            &self.plugins,
            "after_delete",
            |plugin| plugin.after_delete.as_ref(),
            id,
        )
        .await?;
        Ok(())
    }

    /// [`create`](Self::create) every input concurrently, results in input order.
    pub async fn create_many(&self, inputs: Vec<Record>) -> Result<Vec<Record>> {
        try_join_all(inputs.into_iter().map(|input| self.create(input))).await
    }

    /// [`get`](Self::get) every identifier concurrently, results in input order.
    pub async fn get_many<I>(&self, ids: I) -> Result<Vec<Option<Record>>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        try_join_all(
            ids.into_iter()
                .map(|id| async move { self.get(id.as_ref()).await }),
        )
        .await
    }

    /// [`delete`](Self::delete) every identifier concurrently.
    pub async fn delete_many<I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        try_join_all(
            ids.into_iter()
                .map(|id| async move { self.delete(id.as_ref()).await }),
        )
        .await?;
        Ok(())
    }

    /// Start a query on the partition `partition_key`.
    pub fn query(&self, partition_key: impl Into<String>) -> QueryBuilder<'_, S> {
        QueryBuilder {
            entity: self,
            params: QueryParams::new(partition_key),
        }
    }

    /// Every record of this entity whose fields equal all of `criteria`.
    ///
    /// Criteria match the records as [`get`](Self::get) returns them: key
    /// attributes stripped, validated and past the `after_get` hooks.
    ///
    /// Reads the whole table and compares client-side: the most expensive
    /// way to look a record up. Prefer [`get`](Self::get) or a query.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_entity.entity.find", skip_all, fields(entity = %self.name), err)
    )]
    pub async fn find(&self, criteria: Record) -> Result<Vec<Record>> {
        let scanned = self.store.scan_all(ScanParams::default()).await?;
        let mut found = Vec::new();
        for record in scanned.items {
            if !self.keys.owns(&PhysicalKey::from_record(&record)?) {
                continue;
            }
            let Some(record) = self.hydrate(record).await? else {
                continue;
            };
            let matches = criteria
                .iter()
                .all(|(field, expected)| record.get(field) == Some(expected));
            if matches {
                found.push(record);
            }
        }
        Ok(found)
    }

    /// First record [`find`](Self::find) returns, if any.
    pub async fn find_one(&self, criteria: Record) -> Result<Option<Record>> {
        Ok(self.find(criteria).await?.into_iter().next())
    }
}

/// Fluent builder of an entity query.
#[derive(Debug)]
#[must_use]
pub struct QueryBuilder<'a, S> {
    entity: &'a Entity<S>,
    params: QueryParams,
}

impl<S: Schema> QueryBuilder<'_, S> {
    /// Restrict the sort key.
    pub fn sort_key(mut self, condition: SortKeyCondition) -> Self {
        self.params.sort_key = Some(condition);
        self
    }

    /// Post-filter the records read.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.params.filter = Some(filter);
        self
    }

    /// Evaluate at most `limit` records.
    pub fn limit(mut self, limit: i32) -> Self {
        self.params.limit = Some(limit);
        self
    }

    /// Resume after a previous page.
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.params.cursor = Some(cursor);
        self
    }

    /// Sort order; ascending unless set to `false`.
    pub fn ascending(mut self, ascending: bool) -> Self {
        self.params.ascending = Some(ascending);
        self
    }

    /// Query a secondary index instead of the table.
    pub fn index(mut self, index: SecondaryIndex) -> Self {
        self.params.index = Some(index);
        self
    }

    /// Return only `fields`.
    pub fn select(mut self, fields: Vec<String>) -> Self {
        self.params.selection = Some(SelectionMap::from(fields));
        self
    }

    /// Read with strong consistency.
    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.params.consistent_read = Some(consistent_read);
        self
    }

    /// Parameters accumulated so far.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// One page, with its cursor.
    pub async fn exec_with_cursor(self) -> Result<QueryResult> {
        let page = self.entity.store.query(self.params).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for record in page.items {
            if let Some(record) = self.entity.hydrate(record).await? {
                items.push(record);
            }
        }
        Ok(QueryResult {
            count: items.len(),
            items,
            scanned_count: page.scanned_count,
            has_more: page.has_more,
            cursor: page.cursor,
        })
    }

    /// Records of one page.
    pub async fn exec(self) -> Result<Vec<Record>> {
        Ok(self.exec_with_cursor().await?.items)
    }

    /// First record of the partition, reading a single item.
    pub async fn first(self) -> Result<Option<Record>> {
        Ok(self.limit(1).exec().await?.into_iter().next())
    }
}
