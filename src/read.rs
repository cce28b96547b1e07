//! Read requests: the compiled form of every read the store façade issues.
//!
//! Each operation pairs a public argument type with the `*Input` type the
//! [`Transport`](crate::transport::Transport) consumes:
//! - Getting individual items by physical key
//! - Querying one partition with an optional sort-key condition
//! - Scanning entire tables or indexes
//! - Batch retrieving multiple items

/// Batch get item operation for retrieving multiple items efficiently.
pub mod batch_get_item;

/// Common utilities and types for read operations.
pub mod common;

/// Get item operation for retrieving a single item by physical key.
pub mod get_item;

/// Query operation for retrieving items of one partition.
pub mod query;

/// Scan operation for retrieving all items from a table.
pub mod scan;
