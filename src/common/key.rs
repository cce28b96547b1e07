use crate::{
    common::{Item, Record},
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;
use serde_json::Value;
use std::{fmt, sync::Arc};

/// Attribute name of the partition key.
pub const PARTITION_KEY: &str = "pk";

/// Attribute name of the sort key.
pub const SORT_KEY: &str = "sk";

/// Two-part primary key addressing one record of the table.
///
/// ```rust
/// use dynamodb_entity::common::key;
///
/// let key = key::PhysicalKey::new("USER#42", "USER#META").unwrap();
/// assert_eq!(key.to_string(), "USER#42/USER#META");
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PhysicalKey {
    /// Partition key value.
    pub pk: String,
    /// Sort key value.
    pub sk: String,
}

impl PhysicalKey {
    /// Build a key, rejecting empty components.
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Result<Self> {
        let key = Self {
            pk: pk.into(),
            sk: sk.into(),
        };
        if key.pk.is_empty() || key.sk.is_empty() {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(key)
    }

    /// Read the key fields out of a physical record.
    pub fn from_record(record: &Record) -> Result<Self> {
        let pk = string_field(record, PARTITION_KEY)?;
        let sk = string_field(record, SORT_KEY)?;
        Self::new(pk, sk)
    }

    /// Write the key fields into `record`, replacing whatever was there.
    pub fn assert_on(&self, record: &mut Record) {
        record.insert(PARTITION_KEY.to_string(), Value::String(self.pk.clone()));
        record.insert(SORT_KEY.to_string(), Value::String(self.sk.clone()));
    }

    /// Remove the key fields from `record`.
    pub fn strip(record: &mut Record) {
        record.remove(PARTITION_KEY);
        record.remove(SORT_KEY);
    }
}

impl fmt::Display for PhysicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pk, self.sk)
    }
}

impl From<&PhysicalKey> for Item {
    fn from(key: &PhysicalKey) -> Self {
        Self::from([
            (
                PARTITION_KEY.to_string(),
                types::AttributeValue::S(key.pk.clone()),
            ),
            (
                SORT_KEY.to_string(),
                types::AttributeValue::S(key.sk.clone()),
            ),
        ])
    }
}

fn string_field(record: &Record, name: &str) -> Result<String> {
    match record.get(name) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(Value::Number(value)) => Ok(value.to_string()),
        _ => Err(Error::MissingKeyAttribute(name.to_string())),
    }
}

/// A key component read from `record`; an empty value is not addressable.
fn key_component(record: &Record, name: &str) -> Result<String> {
    let value = string_field(record, name)?;
    if value.is_empty() {
        return Err(Error::InvalidKey(format!("empty {name}")));
    }
    Ok(value)
}

/// Forward mapping of a custom key strategy.
pub type ToKeyFn = Arc<dyn Fn(&Record) -> Result<PhysicalKey> + Send + Sync>;

/// Reverse mapping of a custom key strategy.
pub type FromIdFn = Arc<dyn Fn(&str) -> Result<PhysicalKey> + Send + Sync>;

/// Addressing strategy mapping domain records and identifiers to physical keys.
///
/// ```rust
/// use dynamodb_entity::common::key;
///
/// let users = key::KeyTransformer::single("USER");
/// let key = users.from_id("42").unwrap();
/// assert_eq!(key.pk, "USER#42");
/// assert_eq!(key.sk, "USER#META");
/// ```
#[derive(Clone)]
pub enum KeyTransformer {
    /// One record per entity: `TYPE#id` / `TYPE#META`.
    Single {
        /// Entity type prefix.
        entity_type: String,
    },
    /// Records grouped by tenant: `TENANT#tenantId` / `TYPE#id`.
    Tenant {
        /// Entity type prefix.
        entity_type: String,
    },
    /// Children grouped under a parent: `TYPE#parentId` / `TYPE#id`.
    Hierarchy {
        /// Entity type prefix.
        entity_type: String,
    },
    /// Caller supplied mappings.
    Custom {
        /// Record to key.
        to_key: ToKeyFn,
        /// Identifier to key, when the caller can provide one.
        from_id: Option<FromIdFn>,
    },
}

impl fmt::Debug for KeyTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single { entity_type } => f.debug_tuple("Single").field(entity_type).finish(),
            Self::Tenant { entity_type } => f.debug_tuple("Tenant").field(entity_type).finish(),
            Self::Hierarchy { entity_type } => {
                f.debug_tuple("Hierarchy").field(entity_type).finish()
            }
            Self::Custom { from_id, .. } => f
                .debug_struct("Custom")
                .field("reversible", &from_id.is_some())
                .finish(),
        }
    }
}

impl KeyTransformer {
    /// Single-record strategy for `entity_type`.
    pub fn single(entity_type: impl Into<String>) -> Self {
        Self::Single {
            entity_type: entity_type.into(),
        }
    }

    /// Tenant-partitioned strategy for `entity_type`.
    pub fn tenant(entity_type: impl Into<String>) -> Self {
        Self::Tenant {
            entity_type: entity_type.into(),
        }
    }

    /// Parent-partitioned strategy for `entity_type`.
    pub fn hierarchy(entity_type: impl Into<String>) -> Self {
        Self::Hierarchy {
            entity_type: entity_type.into(),
        }
    }

    /// Custom strategy with a forward mapping only.
    pub fn custom<F>(to_key: F) -> Self
    where
        F: Fn(&Record) -> Result<PhysicalKey> + Send + Sync + 'static,
    {
        Self::Custom {
            to_key: Arc::new(to_key),
            from_id: None,
        }
    }

    /// Custom strategy with both mappings.
    pub fn custom_reversible<F, G>(to_key: F, from_id: G) -> Self
    where
        F: Fn(&Record) -> Result<PhysicalKey> + Send + Sync + 'static,
        G: Fn(&str) -> Result<PhysicalKey> + Send + Sync + 'static,
    {
        Self::Custom {
            to_key: Arc::new(to_key),
            from_id: Some(Arc::new(from_id)),
        }
    }

    /// Name of the strategy, used in errors and logs.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Single { .. } => "single",
            Self::Tenant { .. } => "tenant",
            Self::Hierarchy { .. } => "hierarchy",
            Self::Custom { .. } => "custom",
        }
    }

    /// Map a full record to its physical key.
    pub fn to_key(&self, record: &Record) -> Result<PhysicalKey> {
        match self {
            Self::Single { entity_type } => {
                let id = key_component(record, "id")?;
                PhysicalKey::new(format!("{entity_type}#{id}"), format!("{entity_type}#META"))
            }
            Self::Tenant { entity_type } => {
                let id = key_component(record, "id")?;
                let tenant_id = key_component(record, "tenantId")?;
                PhysicalKey::new(format!("TENANT#{tenant_id}"), format!("{entity_type}#{id}"))
            }
            Self::Hierarchy { entity_type } => {
                let id = key_component(record, "id")?;
                let parent_id = key_component(record, "parentId")?;
                PhysicalKey::new(
                    format!("{entity_type}#{parent_id}"),
                    format!("{entity_type}#{id}"),
                )
            }
            Self::Custom { to_key, .. } => to_key(record),
        }
    }

    /// Map a bare identifier to its physical key.
    ///
    /// Tenant and hierarchy keys carry a partition component that an id alone
    /// does not determine, so they fail with [`Error::UnsupportedReverseMapping`].
    /// An empty `id` fails with [`Error::InvalidKey`] whatever the strategy.
    pub fn from_id(&self, id: &str) -> Result<PhysicalKey> {
        if id.is_empty() {
            return Err(Error::InvalidKey("empty id".to_string()));
        }
        match self {
            Self::Single { entity_type } => {
                PhysicalKey::new(format!("{entity_type}#{id}"), format!("{entity_type}#META"))
            }
            Self::Tenant { .. } | Self::Hierarchy { .. } => Err(Error::UnsupportedReverseMapping {
                strategy: self.strategy(),
            }),
            Self::Custom { from_id, .. } => match from_id {
                Some(from_id) => from_id(id),
                None => Err(Error::NotImplemented("custom key transformer without from_id")),
            },
        }
    }

    /// Whether `key` has the shape this strategy produces.
    ///
    /// Custom strategies claim every key.
    pub fn owns(&self, key: &PhysicalKey) -> bool {
        match self {
            Self::Single { entity_type } => {
                key.pk.starts_with(&format!("{entity_type}#"))
                    && key.sk == format!("{entity_type}#META")
            }
            Self::Tenant { entity_type } => {
                key.pk.starts_with("TENANT#") && key.sk.starts_with(&format!("{entity_type}#"))
            }
            Self::Hierarchy { entity_type } => {
                let prefix = format!("{entity_type}#");
                key.pk.starts_with(&prefix) && key.sk.starts_with(&prefix)
            }
            Self::Custom { .. } => true,
        }
    }
}
