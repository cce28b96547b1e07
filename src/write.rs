//! Write requests: the compiled form of every write the store façade issues.
//!
//! - Putting new items or replacing existing ones
//! - Replacing individual attributes (transactional update)
//! - Deleting items by physical key
//! - Batch writing multiple items
//! - All-or-nothing transactions

/// Batch write item operation for efficiently writing multiple items.
pub mod batch_write_item;

/// Common utilities and types for write operations.
pub mod common;

/// Delete item operation for removing items from tables.
pub mod delete_item;

/// Put item operation for creating or replacing items.
pub mod put_item;

/// Transactional write of several items.
pub mod transact_write_items;

/// Update item operation replacing individual attributes.
pub mod update_item;
