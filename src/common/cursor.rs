use crate::{
    common::Item,
    error::{Error, Result},
};

use aws_sdk_dynamodb::{primitives::Blob, types};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use serde::{Deserialize, Serialize};
use std::{collections, fmt};

/// Key attribute as carried inside a cursor, tagged with its store type.
#[derive(Debug, Deserialize, Serialize)]
enum KeyAttribute {
    S(String),
    N(String),
    B(String),
}

/// Opaque pagination token.
///
/// Wraps the store's continuation key. Callers must hand it back unchanged
/// together with the same query parameters that produced it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Cursor(String);

impl Cursor {
    /// Encode a continuation key.
    pub fn encode(last_evaluated_key: &Item) -> Result<Self> {
        let mut attributes = collections::BTreeMap::new();
        for (name, value) in last_evaluated_key {
            let attribute = match value {
                types::AttributeValue::S(value) => KeyAttribute::S(value.clone()),
                types::AttributeValue::N(value) => KeyAttribute::N(value.clone()),
                types::AttributeValue::B(value) => KeyAttribute::B(STANDARD.encode(value.as_ref())),
                other => {
                    return Err(Error::InvalidCursor(format!(
                        "key attribute `{name}` has unsupported type {other:?}"
                    )));
                }
            };
            attributes.insert(name.clone(), attribute);
        }
        let json = serde_json::to_vec(&attributes)
            .map_err(|error| Error::InvalidCursor(error.to_string()))?;
        Ok(Self(URL_SAFE_NO_PAD.encode(json)))
    }

    /// Decode back into the continuation key.
    pub fn decode(&self) -> Result<Item> {
        let json = URL_SAFE_NO_PAD
            .decode(&self.0)
            .map_err(|error| Error::InvalidCursor(error.to_string()))?;
        let attributes: collections::BTreeMap<String, KeyAttribute> =
            serde_json::from_slice(&json).map_err(|error| Error::InvalidCursor(error.to_string()))?;
        let mut item = Item::with_capacity(attributes.len());
        for (name, attribute) in attributes {
            let value = match attribute {
                KeyAttribute::S(value) => types::AttributeValue::S(value),
                KeyAttribute::N(value) => types::AttributeValue::N(value),
                KeyAttribute::B(value) => {
                    let bytes = STANDARD
                        .decode(value)
                        .map_err(|error| Error::InvalidCursor(error.to_string()))?;
                    types::AttributeValue::B(Blob::new(bytes))
                }
            };
            item.insert(name, value);
        }
        Ok(item)
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<Cursor> for String {
    fn from(cursor: Cursor) -> Self {
        cursor.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
