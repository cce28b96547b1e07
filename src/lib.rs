#![deny(missing_docs)]

//! # DynamoDB Entity
//!
//! An entity, key-design and plugin layer for single-table Amazon DynamoDB access.
//!
//! ## Overview
//!
//! Many record types share one table. Each record type is an [`Entity`]:
//! - a schema validates every record created, read or updated
//! - a [`KeyTransformer`](common::key::KeyTransformer) maps records to the physical `pk`/`sk` pair
//! - ordered plugins hook into every operation, at entity level and at [`Store`] level
//! - filters, sort-key conditions and projections compile into DynamoDB expressions
//!   with request-scoped placeholders
//!
//! ## Quick Example
//!
//! ```no_run
//! use dynamodb_entity::{
//!     common::{Record, condition::SortKeyCondition, key::KeyTransformer},
//!     config::StoreConfig,
//!     entity::{Entity, Unchecked},
//!     plugin::{EntityPlugin, Read, ReadHook},
//!     store::Store,
//! };
//! use serde_json::{Value, json};
//!
//! # async fn example() -> dynamodb_entity::Result<()> {
//! let store = Store::from_config(&StoreConfig {
//!     table_name: "app".to_string(),
//!     region: Some("eu-west-1".to_string()),
//!     ..Default::default()
//! })
//! .await;
//! // hide soft-deleted comments from every read
//! let soft_delete = EntityPlugin::new("soft_delete").after_get(ReadHook::sync(|record: Record| {
//!     match record.get("deleted") {
//!         Some(Value::Bool(true)) => Ok(Read::Hidden),
//!         _ => Ok(Read::Unchanged),
//!     }
//! }));
//! let comments = Entity::new("comment", store, Unchecked, KeyTransformer::hierarchy("COMMENT"))
//!     .with_plugins(vec![soft_delete]);
//! let comment = json!({"id": "c1", "parentId": "post1", "text": "first!"});
//! // stored under pk = "COMMENT#post1", sk = "COMMENT#c1"
//! comments.create(comment.as_object().cloned().unwrap_or_default()).await?;
//! let page = comments
//!     .query("COMMENT#post1")
//!     .sort_key(SortKeyCondition::BeginsWith("COMMENT#".to_string()))
//!     .limit(20)
//!     .exec_with_cursor()
//!     .await?;
//! println!("{} comments, more: {}", page.count, page.has_more);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@entity`] - Schema-validated CRUD, batch helpers, query builder and find
//! - [`mod@store`] - Store façade over one table
//! - [`mod@plugin`] - Store and entity hooks
//! - [`mod@common`] - Keys, conditions, selections and cursors
//! - [`mod@read`] - Read requests (GetItem, Query, Scan, BatchGetItem)
//! - [`mod@write`] - Write requests (PutItem, UpdateItem, DeleteItem, BatchWriteItem, TransactWriteItems)
//! - [`mod@transport`] - The seam to the DynamoDB client
//! - [`mod@config`] - Store settings
//!
//! ## Features
//!
//! - `tracing` - spans around every store and entity operation

/// Keys, conditions, attribute selection and cursors.
pub mod common;

/// Store settings and client construction.
pub mod config;

/// Entities: schema, keys and hooks bound together.
pub mod entity;

/// Error taxonomy.
pub mod error;

/// Store and entity hooks.
pub mod plugin;

/// Read requests for retrieving data from the table.
///
/// This module provides operations for:
/// - Getting individual items by key
/// - Querying a partition with sort-key conditions
/// - Scanning the table
/// - Batch retrieving multiple items
pub mod read;

/// Store façade.
pub mod store;

/// Transport seam.
pub mod transport;

/// Write requests for modifying data in the table.
///
/// This module provides operations for:
/// - Putting new items or replacing existing ones
/// - Updating items
/// - Deleting items by key
/// - Batch writing multiple items
/// - Writing several items atomically
pub mod write;

pub use entity::{Entity, Schema};
pub use error::{Error, Result};
pub use store::Store;
