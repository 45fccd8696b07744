//! Table service abstraction
//!
//! The reconciliation engine only needs two remote operations: describe a
//! table and request an index build. [`TableStore`] captures exactly that, so
//! the engine can be driven by the DynamoDB client in production and by
//! [`MemoryTableStore`](crate::memory::MemoryTableStore) in tests.

use crate::error::Result;
use crate::model::{AttributeDefinition, IndexSpec, KeySchemaElement, Projection};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt::{self, Debug};

/// Lifecycle status of a table
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TableStatus {
    Creating,
    Updating,
    Deleting,
    Active,
    /// Any status this crate does not model
    Unknown(String),
}

impl TableStatus {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "CREATING" => Self::Creating,
            "UPDATING" => Self::Updating,
            "DELETING" => Self::Deleting,
            "ACTIVE" => Self::Active,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "CREATING",
            Self::Updating => "UPDATING",
            Self::Deleting => "DELETING",
            Self::Active => "ACTIVE",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a global secondary index
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexStatus {
    Creating,
    Updating,
    Deleting,
    Active,
    Unknown(String),
}

impl IndexStatus {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "CREATING" => Self::Creating,
            "UPDATING" => Self::Updating,
            "DELETING" => Self::Deleting,
            "ACTIVE" => Self::Active,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "CREATING",
            Self::Updating => "UPDATING",
            Self::Deleting => "DELETING",
            Self::Active => "ACTIVE",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An index as reported by the table service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDescription {
    pub index_name: String,
    pub status: IndexStatus,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Option<Projection>,
}

/// A table as reported by the table service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDescription {
    pub table_name: String,
    pub status: TableStatus,
    pub indexes: Vec<IndexDescription>,
    pub attribute_definitions: Vec<AttributeDefinition>,
}

impl TableDescription {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            status: TableStatus::Active,
            indexes: Vec::new(),
            attribute_definitions: Vec::new(),
        }
    }

    /// Find an index by name, whatever its status
    pub fn index(&self, index_name: &str) -> Option<&IndexDescription> {
        self.indexes.iter().find(|i| i.index_name == index_name)
    }
}

/// Request to create exactly one global secondary index
///
/// `attribute_definitions` must cover every attribute the new index's key
/// schema references; the service rejects the request otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateIndexRequest {
    pub table_name: String,
    pub index: IndexSpec,
    pub attribute_definitions: Vec<AttributeDefinition>,
}

impl CreateIndexRequest {
    pub fn new(
        table_name: impl Into<String>,
        index: IndexSpec,
        attribute_definitions: Vec<AttributeDefinition>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            index,
            attribute_definitions,
        }
    }

    /// The request in the service's UpdateTable shape
    pub fn to_wire(&self) -> Value {
        json!({
            "TableName": self.table_name,
            "GlobalSecondaryIndexUpdates": [{"Create": self.index}],
            "AttributeDefinitions": self.attribute_definitions,
        })
    }
}

/// The two remote operations reconciliation depends on
///
/// Implementations map service failures onto the crate's error kinds:
/// `NotFound` for a missing table, `Validation`, `ResourceInUse` and
/// `Throttled` for the corresponding rejections, and `Store` for anything else.
#[async_trait]
pub trait TableStore: Debug + Send + Sync {
    /// Current state of a table and its indexes
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription>;

    /// Request creation of one index. Returns once the request is accepted;
    /// the build itself completes asynchronously.
    async fn update_table(&self, request: &CreateIndexRequest) -> Result<TableDescription>;
}
