//! The uniform record envelope.
//!
//! Every replicated entity serializes to a [`Record`]: its kind tag, uid,
//! the producer's write timestamp and a flat map of kind-specific
//! attributes. On the wire the attributes sit next to the envelope fields:
//!
//! ```json
//! {"kind": "Grid", "uid": "1", "timestamp": 1700000000000, "cellSize": 200}
//! ```

use crate::{Error, Timestamp, Uid};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind-specific attribute payload of a record.
pub type AttributeMap = serde_json::Map<String, serde_json::Value>;

/// Type tag distinguishing entity variants (`"Grid"`, `"Scene"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(String);

impl EntityKind {
    /// Creates a kind tag.
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKind {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for EntityKind {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityKind {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The mutation an action batch carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    /// The lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

/// Wire/storage representation of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Kind tag used to find the converter.
    pub kind: EntityKind,

    /// Globally unique entity id.
    pub uid: Uid,

    /// Producer's write time. Unset on delete envelopes.
    #[serde(default, skip_serializing_if = "Timestamp::is_unset")]
    pub timestamp: Timestamp,

    /// Kind-specific attributes, flattened into the envelope.
    #[serde(flatten)]
    pub attributes: AttributeMap,
}

impl Record {
    /// Creates a record from its parts.
    pub fn new(
        kind: impl Into<EntityKind>,
        uid: Uid,
        timestamp: Timestamp,
        attributes: AttributeMap,
    ) -> Self {
        Self {
            kind: kind.into(),
            uid,
            timestamp,
            attributes,
        }
    }

    /// A delete envelope: kind and uid only.
    pub fn tombstone(kind: impl Into<EntityKind>, uid: Uid) -> Self {
        Self::new(kind, uid, Timestamp::default(), AttributeMap::new())
    }

    /// Builds a record by serializing a typed attribute struct.
    ///
    /// The struct must serialize to a JSON object.
    pub fn from_attributes<T: Serialize>(
        kind: impl Into<EntityKind>,
        uid: Uid,
        timestamp: Timestamp,
        attributes: &T,
    ) -> crate::Result<Self> {
        let attributes = match serde_json::to_value(attributes)? {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => AttributeMap::new(),
            other => {
                return Err(Error::Serialization(serde::ser::Error::custom(format!(
                    "attributes must serialize to an object, got {other}"
                ))));
            }
        };
        Ok(Self::new(kind, uid, timestamp, attributes))
    }

    /// Deserializes the attribute payload into a typed struct.
    pub fn attributes_as<T: DeserializeOwned>(&self) -> crate::Result<T> {
        let value = serde_json::Value::Object(self.attributes.clone());
        Ok(serde_json::from_value(value)?)
    }

    /// Reads a string attribute.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    /// Reads a foreign-key attribute (a uid stored as a string).
    pub fn reference(&self, key: &str) -> Option<Uid> {
        self.get_str(key)
            .filter(|s| !s.is_empty())
            .map(Uid::from_string)
    }

    /// Sets the write timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}
