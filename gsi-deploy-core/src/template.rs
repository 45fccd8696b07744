//! Resolved deployment template
//!
//! ## Document shape
//!
//! ```text
//! { "Resources": { "<LogicalName>": { "Type": "...", "Properties": { ... } } } }
//! ```
//!
//! A deployment-tool service document nests the same map under
//! `resources.Resources`; both are accepted. Resource order is the document's
//! insertion order.

use crate::error::{GsiError, Result};
use crate::model::{AttributeDefinition, IndexSpec, KeySchemaElement};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// `Type` of a table resource
pub const TABLE_RESOURCE_TYPE: &str = "AWS::DynamoDB::Table";

pub const PROP_TABLE_NAME: &str = "TableName";
pub const PROP_ATTRIBUTE_DEFINITIONS: &str = "AttributeDefinitions";
pub const PROP_KEY_SCHEMA: &str = "KeySchema";
pub const PROP_GLOBAL_SECONDARY_INDEXES: &str = "GlobalSecondaryIndexes";
pub const PROP_LOCAL_SECONDARY_INDEXES: &str = "LocalSecondaryIndexes";

const RESOURCES: &str = "Resources";
const SERVICE_RESOURCES: &str = "resources";

/// An already-resolved template document, mutated in place by extraction
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    document: Value,
}

impl Template {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(s)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.document
    }

    pub fn into_value(self) -> Value {
        self.document
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    /// The logical-name → resource map, if the document has one
    pub fn resources(&self) -> Result<Option<&Map<String, Value>>> {
        let root = self
            .document
            .as_object()
            .ok_or_else(|| GsiError::invalid_template("template document must be an object"))?;

        let resources = match root.get(RESOURCES) {
            Some(r) => Some(r),
            None => root.get(SERVICE_RESOURCES).and_then(|s| s.get(RESOURCES)),
        };

        match resources {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(GsiError::invalid_template("Resources must be an object")),
        }
    }

    pub fn resources_mut(&mut self) -> Result<Option<&mut Map<String, Value>>> {
        let root = self
            .document
            .as_object_mut()
            .ok_or_else(|| GsiError::invalid_template("template document must be an object"))?;

        let resources = if root.contains_key(RESOURCES) {
            root.get_mut(RESOURCES)
        } else {
            root.get_mut(SERVICE_RESOURCES)
                .and_then(|s| s.get_mut(RESOURCES))
        };

        match resources {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(GsiError::invalid_template("Resources must be an object")),
        }
    }
}

/// The part of a local secondary index extraction cares about
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LocalIndexKeys {
    #[serde(default)]
    key_schema: Vec<KeySchemaElement>,
}

/// Mutable view over one table resource's `Properties`
pub struct TableResource<'a> {
    logical_name: &'a str,
    properties: &'a mut Map<String, Value>,
}

impl<'a> TableResource<'a> {
    /// View a resource as a table; `Ok(None)` for resources of other kinds
    pub fn from_resource(logical_name: &'a str, resource: &'a mut Value) -> Result<Option<Self>> {
        let resource = resource.as_object_mut().ok_or_else(|| {
            GsiError::invalid_template(format!("resource '{}' must be an object", logical_name))
        })?;

        if resource.get("Type").and_then(Value::as_str) != Some(TABLE_RESOURCE_TYPE) {
            return Ok(None);
        }

        let properties = resource
            .get_mut("Properties")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                GsiError::invalid_template(format!(
                    "table resource '{}' has no Properties object",
                    logical_name
                ))
            })?;

        Ok(Some(Self {
            logical_name,
            properties,
        }))
    }

    pub fn logical_name(&self) -> &str {
        self.logical_name
    }

    /// Physical table name, falling back to the logical resource name
    pub fn table_name(&self) -> Result<String> {
        match self.properties.get(PROP_TABLE_NAME) {
            None => Ok(self.logical_name.to_string()),
            Some(Value::String(name)) => Ok(name.clone()),
            Some(_) => Err(GsiError::invalid_template(format!(
                "table resource '{}': TableName must be a resolved string",
                self.logical_name
            ))),
        }
    }

    pub fn has_secondary_indexes(&self) -> bool {
        self.properties.contains_key(PROP_GLOBAL_SECONDARY_INDEXES)
    }

    pub fn secondary_indexes(&self) -> Result<Vec<IndexSpec>> {
        self.read_property(PROP_GLOBAL_SECONDARY_INDEXES)
            .map(Option::unwrap_or_default)
    }

    /// Declared attribute definitions; a table without the list is malformed
    pub fn attribute_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        self.read_property(PROP_ATTRIBUTE_DEFINITIONS)?
            .ok_or_else(|| {
                GsiError::invalid_template(format!(
                    "table resource '{}' declares secondary indexes but no AttributeDefinitions",
                    self.logical_name
                ))
            })
    }

    /// The table's own primary key (empty if not declared)
    pub fn key_schema(&self) -> Result<Vec<KeySchemaElement>> {
        self.read_property(PROP_KEY_SCHEMA)
            .map(Option::unwrap_or_default)
    }

    /// Attribute names the table keeps using after its global secondary
    /// indexes are gone: the primary key plus every local index key
    pub fn retained_key_attributes(&self) -> Result<Vec<String>> {
        let local: Vec<LocalIndexKeys> = self
            .read_property(PROP_LOCAL_SECONDARY_INDEXES)?
            .unwrap_or_default();

        let mut names: Vec<String> = Vec::new();
        let keys = self
            .key_schema()?
            .into_iter()
            .chain(local.into_iter().flat_map(|l| l.key_schema));
        for key in keys {
            if !names.contains(&key.attribute_name) {
                names.push(key.attribute_name);
            }
        }
        Ok(names)
    }

    pub fn remove_secondary_indexes(&mut self) {
        self.properties.remove(PROP_GLOBAL_SECONDARY_INDEXES);
    }

    pub fn set_attribute_definitions(&mut self, definitions: &[AttributeDefinition]) -> Result<()> {
        self.properties.insert(
            PROP_ATTRIBUTE_DEFINITIONS.to_string(),
            serde_json::to_value(definitions)?,
        );
        Ok(())
    }

    fn read_property<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.properties.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                GsiError::invalid_template(format!(
                    "table resource '{}': malformed {}: {}",
                    self.logical_name, key, e
                ))
            }),
        }
    }
}
