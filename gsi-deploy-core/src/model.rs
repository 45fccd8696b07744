//! Index and attribute definitions as declared in a table template
//!
//! Field names follow the template's PascalCase schema (`AttributeName`,
//! `KeySchema`, `ProjectionType`, ...) so values can be lifted straight out of
//! a resource's `Properties` and handed back to the table service unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar type of a key attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl AttributeType {
    /// Wire-format string ("S", "N" or "B")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number => "N",
            Self::Binary => "B",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed attribute. Identity is the name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: AttributeType,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            attribute_name: name.into(),
            attribute_type,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Number)
    }
}

/// Role of an attribute within a key schema
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Partition key
    #[serde(rename = "HASH")]
    Hash,
    /// Sort key
    #[serde(rename = "RANGE")]
    Range,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hash => "HASH",
            Self::Range => "RANGE",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

impl KeySchemaElement {
    pub fn hash(name: impl Into<String>) -> Self {
        Self {
            attribute_name: name.into(),
            key_type: KeyType::Hash,
        }
    }

    pub fn range(name: impl Into<String>) -> Self {
        Self {
            attribute_name: name.into(),
            key_type: KeyType::Range,
        }
    }
}

/// Which table attributes are copied into an index
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionType {
    #[default]
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "KEYS_ONLY")]
    KeysOnly,
    #[serde(rename = "INCLUDE")]
    Include,
}

impl ProjectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::KeysOnly => "KEYS_ONLY",
            Self::Include => "INCLUDE",
        }
    }
}

impl fmt::Display for ProjectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Projection {
    pub projection_type: ProjectionType,
    /// Only meaningful for `INCLUDE` projections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_key_attributes: Option<Vec<String>>,
}

impl Projection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn keys_only() -> Self {
        Self {
            projection_type: ProjectionType::KeysOnly,
            non_key_attributes: None,
        }
    }

    pub fn include<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            projection_type: ProjectionType::Include,
            non_key_attributes: Some(attributes.into_iter().map(Into::into).collect()),
        }
    }
}

/// Capacity settings for an index on a provisioned-billing table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// A global secondary index definition. Immutable once extracted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexSpec {
    pub index_name: String,
    #[serde(default)]
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

impl IndexSpec {
    pub fn new(
        index_name: impl Into<String>,
        key_schema: Vec<KeySchemaElement>,
        projection: Projection,
    ) -> Self {
        Self {
            index_name: index_name.into(),
            key_schema,
            projection,
            provisioned_throughput: None,
        }
    }

    pub fn with_provisioned_throughput(mut self, read: i64, write: i64) -> Self {
        self.provisioned_throughput = Some(ProvisionedThroughput {
            read_capacity_units: read,
            write_capacity_units: write,
        });
        self
    }

    /// Attribute names used by the key schema, in key order
    pub fn referenced_attributes(&self) -> impl Iterator<Item = &str> {
        self.key_schema.iter().map(|k| k.attribute_name.as_str())
    }

    /// An index with no key schema can never be created
    pub fn has_key_schema(&self) -> bool {
        !self.key_schema.is_empty()
    }
}

/// Indexes deferred from one table, plus everything needed to create them later
///
/// `required_attributes` holds one definition for every attribute referenced
/// by any pending index's key schema, in first-reference order. It is sent in
/// full with every create call so each call is self-sufficient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableIndexPlan {
    pub table_name: String,
    pub pending_indexes: Vec<IndexSpec>,
    pub required_attributes: Vec<AttributeDefinition>,
    /// Declared indexes with an empty key schema, never submitted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_indexes: Vec<String>,
}

impl TableIndexPlan {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            pending_indexes: Vec::new(),
            required_attributes: Vec::new(),
            skipped_indexes: Vec::new(),
        }
    }

    /// Look up a required attribute by name
    pub fn required_attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.required_attributes
            .iter()
            .find(|a| a.attribute_name == name)
    }

    /// The required attributes a single index's key schema references
    pub fn required_definitions_for(&self, index: &IndexSpec) -> Vec<&AttributeDefinition> {
        let mut defs: Vec<&AttributeDefinition> = Vec::new();
        for name in index.referenced_attributes() {
            if defs.iter().any(|d| d.attribute_name == name) {
                continue;
            }
            if let Some(def) = self.required_attribute(name) {
                defs.push(def);
            }
        }
        defs
    }

    /// Position of the last index that will actually be submitted
    pub fn last_submittable(&self) -> Option<usize> {
        self.pending_indexes.iter().rposition(IndexSpec::has_key_schema)
    }
}
