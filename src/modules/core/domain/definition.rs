//! Collection definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One attribute of a collection definition
///
/// Accepts both the full form (`{type: "datetime", required: true}`) and the
/// shorthand form (`"string"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAttribute")]
pub struct Attribute {
    /// Declared type name, as written by the caller
    #[serde(rename = "type")]
    pub kind: String,

    /// Everything else declared on the attribute
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttribute {
    Short(String),
    Full {
        #[serde(rename = "type", default)]
        kind: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<RawAttribute> for Attribute {
    fn from(raw: RawAttribute) -> Self {
        match raw {
            RawAttribute::Short(kind) => Attribute {
                kind,
                extra: Map::new(),
            },
            RawAttribute::Full { kind, extra } => Attribute { kind, extra },
        }
    }
}

impl Attribute {
    /// Create an attribute of the given type
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            extra: Map::new(),
        }
    }

    /// Returns true if the declared type contains "date" (case-insensitive)
    pub fn is_date(&self) -> bool {
        self.kind.to_lowercase().contains("date")
    }
}

/// Field name to attribute mapping of one collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionDefinition {
    pub attributes: BTreeMap<String, Attribute>,
}

impl CollectionDefinition {
    /// Create an empty definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), Attribute::new(kind));
        self
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Names of all date-typed fields
    pub fn date_fields(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.is_date())
            .map(|(name, _)| name.as_str())
    }

    /// Returns true if the definition has no attributes
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
