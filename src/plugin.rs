//! Lifecycle hooks around store and entity operations.
//!
//! A plugin is a named set of optional hook slots. The slots of one phase
//! run in plugin order, each one awaited before the next starts, and each
//! one sees the value produced by the hooks before it. A hook returning
//! `None` leaves the running value unchanged.
//!
//! ```rust
//! use dynamodb_entity::{common::Record, plugin::{EntityPlugin, Hook}};
//! use serde_json::json;
//!
//! let stamp = EntityPlugin::new("stamp").before_create(Hook::sync(|mut record: Record| {
//!     record.insert("version".to_string(), json!(1));
//!     Ok(Some(record))
//! }));
//! assert!(stamp.before_create.is_some());
//! ```

use crate::{
    common::{Record, key::PhysicalKey},
    error::Result,
    read::{common::QueryResult, query::QueryParams},
};

use futures_util::future::{self, BoxFuture, FutureExt};
use std::{fmt, sync::Arc};

type HookFn<T, R> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<R>> + Send + Sync>;

/// A hook transforming a value of type `T`.
pub struct Hook<T>(HookFn<T, Option<T>>);

impl<T: Send + 'static> Hook<T> {
    /// Asynchronous hook.
    pub fn new<F, Fut>(hook: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<T>>> + Send + 'static,
    {
        Self(Arc::new(move |value| hook(value).boxed()))
    }

    /// Synchronous hook.
    pub fn sync<F>(hook: F) -> Self
    where
        F: Fn(T) -> Result<Option<T>> + Send + Sync + 'static,
    {
        Self(Arc::new(move |value| future::ready(hook(value)).boxed()))
    }
}

impl<T> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook")
    }
}

/// Outcome of a read hook.
#[derive(Clone, Debug, PartialEq)]
pub enum Read<T> {
    /// Keep the running value.
    Unchanged,
    /// Replace the running value.
    Replace(T),
    /// Treat the record as absent, e.g. soft-deleted. Later hooks do not run.
    Hidden,
}

/// A hook applied to records on their way out of the store.
pub struct ReadHook<T>(HookFn<T, Read<T>>);

impl<T: Send + 'static> ReadHook<T> {
    /// Asynchronous read hook.
    pub fn new<F, Fut>(hook: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Read<T>>> + Send + 'static,
    {
        Self(Arc::new(move |value| hook(value).boxed()))
    }

    /// Synchronous read hook.
    pub fn sync<F>(hook: F) -> Self
    where
        F: Fn(T) -> Result<Read<T>> + Send + Sync + 'static,
    {
        Self(Arc::new(move |value| future::ready(hook(value)).boxed()))
    }
}

impl<T> Clone for ReadHook<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for ReadHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReadHook")
    }
}

/// Anything carrying a plugin name.
pub(crate) trait Named {
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    fn name(&self) -> &str;
}

/// Run the `slot` hooks of `plugins` over `value`, in order.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) async fn apply<P, T>(
    plugins: &[P],
    slot: &'static str,
    hook: impl Fn(&P) -> Option<&Hook<T>>,
    mut value: T,
) -> Result<T>
where
    P: Named,
    T: Clone,
{
    for plugin in plugins {
        let Some(hook) = hook(plugin) else {
            continue;
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(plugin = plugin.name(), slot, "running hook");
        if let Some(next) = (hook.0)(value.clone()).await? {
            value = next;
        }
    }
    Ok(value)
}

/// Run the `slot` read hooks of `plugins` over `value`; `None` once a hook hides it.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) async fn apply_read<P, T>(
    plugins: &[P],
    slot: &'static str,
    hook: impl Fn(&P) -> Option<&ReadHook<T>>,
    mut value: T,
) -> Result<Option<T>>
where
    P: Named,
    T: Clone,
{
    for plugin in plugins {
        let Some(hook) = hook(plugin) else {
            continue;
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(plugin = plugin.name(), slot, "running read hook");
        match (hook.0)(value.clone()).await? {
            Read::Unchanged => {}
            Read::Replace(next) => value = next,
            Read::Hidden => return Ok(None),
        }
    }
    Ok(Some(value))
}

/// Hooks around the store façade. They see physical records, keys included.
#[derive(Clone, Debug, Default)]
pub struct StorePlugin {
    /// Plugin name, used in logs.
    pub name: String,
    /// Runs on every record before it is written by `put`.
    pub before_put: Option<Hook<Record>>,
    /// Runs on every record read by `get` and batch gets.
    pub after_get: Option<ReadHook<Record>>,
    /// Runs on query parameters before compilation.
    pub before_query: Option<Hook<QueryParams>>,
    /// Runs on every query and scan result page.
    pub after_query: Option<Hook<QueryResult>>,
    /// Runs on the key before a delete.
    pub before_delete: Option<Hook<PhysicalKey>>,
}

impl StorePlugin {
    /// Plugin without hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the `before_put` hook.
    pub fn before_put(mut self, hook: Hook<Record>) -> Self {
        self.before_put = Some(hook);
        self
    }

    /// Set the `after_get` hook.
    pub fn after_get(mut self, hook: ReadHook<Record>) -> Self {
        self.after_get = Some(hook);
        self
    }

    /// Set the `before_query` hook.
    pub fn before_query(mut self, hook: Hook<QueryParams>) -> Self {
        self.before_query = Some(hook);
        self
    }

    /// Set the `after_query` hook.
    pub fn after_query(mut self, hook: Hook<QueryResult>) -> Self {
        self.after_query = Some(hook);
        self
    }

    /// Set the `before_delete` hook.
    pub fn before_delete(mut self, hook: Hook<PhysicalKey>) -> Self {
        self.before_delete = Some(hook);
        self
    }
}

impl Named for StorePlugin {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Identifier and partial record of an entity update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateRequest {
    /// Entity identifier.
    pub id: String,
    /// Fields to merge over the current record.
    pub updates: Record,
}

/// Hooks around entity operations. They see domain records, keys stripped.
#[derive(Clone, Debug, Default)]
pub struct EntityPlugin {
    /// Plugin name, used in logs.
    pub name: String,
    /// Runs on the validated input of `create`.
    pub before_create: Option<Hook<Record>>,
    /// Runs on the record `create` returns.
    pub after_create: Option<Hook<Record>>,
    /// Runs on the identifier of `get`.
    pub before_get: Option<Hook<String>>,
    /// Runs on every validated record read; may hide it.
    pub after_get: Option<ReadHook<Record>>,
    /// Runs on the identifier and updates of `update`.
    pub before_update: Option<Hook<UpdateRequest>>,
    /// Runs on the record `update` returns.
    pub after_update: Option<Hook<Record>>,
    /// Runs on the identifier of `delete`.
    pub before_delete: Option<Hook<String>>,
    /// Runs on the identifier after a delete.
    pub after_delete: Option<Hook<String>>,
}

impl EntityPlugin {
    /// Plugin without hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the `before_create` hook.
    pub fn before_create(mut self, hook: Hook<Record>) -> Self {
        self.before_create = Some(hook);
        self
    }

    /// Set the `after_create` hook.
    pub fn after_create(mut self, hook: Hook<Record>) -> Self {
        self.after_create = Some(hook);
        self
    }

    /// Set the `before_get` hook.
    pub fn before_get(mut self, hook: Hook<String>) -> Self {
        self.before_get = Some(hook);
        self
    }

    /// Set the `after_get` hook.
    pub fn after_get(mut self, hook: ReadHook<Record>) -> Self {
        self.after_get = Some(hook);
        self
    }

    /// Set the `before_update` hook.
    pub fn before_update(mut self, hook: Hook<UpdateRequest>) -> Self {
        self.before_update = Some(hook);
        self
    }

    /// Set the `after_update` hook.
    pub fn after_update(mut self, hook: Hook<Record>) -> Self {
        self.after_update = Some(hook);
        self
    }

    /// Set the `before_delete` hook.
    pub fn before_delete(mut self, hook: Hook<String>) -> Self {
        self.before_delete = Some(hook);
        self
    }

    /// Set the `after_delete` hook.
    pub fn after_delete(mut self, hook: Hook<String>) -> Self {
        self.after_delete = Some(hook);
        self
    }
}

impl Named for EntityPlugin {
    fn name(&self) -> &str {
        &self.name
    }
}
