//! In-memory table store for testing
//!
//! Behaves like the table service as far as reconciliation can observe:
//! one index build per table at a time, every key attribute must be supplied
//! with the create request, and new indexes report `CREATING` for a
//! configurable number of describe calls before turning `ACTIVE`.
//!
//! Every call is recorded so tests can assert on ordering.

use crate::error::{GsiError, Result};
use crate::store::{
    CreateIndexRequest, IndexDescription, IndexStatus, TableDescription, TableStatus, TableStore,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A call made against the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    Describe { table_name: String },
    Create(CreateIndexRequest),
}

#[derive(Debug)]
struct MemoryTable {
    description: TableDescription,
    /// Describes left before a building index turns active
    building: HashMap<String, u32>,
}

/// In-memory table store
///
/// `activation_delay` is the number of describe calls a new index stays in
/// `CREATING`; `None` keeps it building forever.
#[derive(Clone)]
pub struct MemoryTableStore {
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    faults: Arc<Mutex<HashMap<String, GsiError>>>,
    activation_delay: Option<u32>,
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            faults: Arc::new(Mutex::new(HashMap::new())),
            activation_delay: Some(1),
        }
    }
}

impl Debug for MemoryTableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTableStore")
            .field("table_count", &self.tables.read().len())
            .field("call_count", &self.calls.lock().len())
            .field("activation_delay", &self.activation_delay)
            .finish()
    }
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activation_delay(mut self, describes: Option<u32>) -> Self {
        self.activation_delay = describes;
        self
    }

    /// Register an active table with no indexes
    pub fn create_table(&self, table_name: &str) {
        self.insert_table(TableDescription::new(table_name));
    }

    pub fn insert_table(&self, description: TableDescription) {
        self.tables.write().insert(
            description.table_name.clone(),
            MemoryTable {
                description,
                building: HashMap::new(),
            },
        );
    }

    /// Add an existing index directly, bypassing validation
    pub fn add_index(&self, table_name: &str, index_name: &str, status: IndexStatus) -> Result<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| GsiError::not_found(format!("table '{}'", table_name)))?;
        table.description.indexes.push(IndexDescription {
            index_name: index_name.to_string(),
            status,
            key_schema: Vec::new(),
            projection: None,
        });
        Ok(())
    }

    /// Fail the next create request for `index_name` with `error`
    pub fn fail_next_create(&self, index_name: &str, error: GsiError) {
        self.faults.lock().insert(index_name.to_string(), error);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn create_calls(&self) -> Vec<CreateIndexRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                StoreCall::Create(request) => Some(request.clone()),
                StoreCall::Describe { .. } => None,
            })
            .collect()
    }

    /// Index names in the order their create requests were made
    pub fn created_index_names(&self) -> Vec<String> {
        self.create_calls()
            .into_iter()
            .map(|r| r.index.index_name)
            .collect()
    }

    pub fn index_status(&self, table_name: &str, index_name: &str) -> Option<IndexStatus> {
        self.tables
            .read()
            .get(table_name)
            .and_then(|t| t.description.index(index_name))
            .map(|i| i.status.clone())
    }

    fn validate(table: &MemoryTable, request: &CreateIndexRequest) -> Result<()> {
        let index = &request.index;
        if table.description.index(&index.index_name).is_some() {
            return Err(GsiError::validation(format!(
                "index '{}' already exists",
                index.index_name
            )));
        }
        if index.key_schema.is_empty() {
            return Err(GsiError::validation("key schema must not be empty"));
        }
        for attribute in index.referenced_attributes() {
            let supplied = request
                .attribute_definitions
                .iter()
                .any(|d| d.attribute_name == attribute);
            if !supplied {
                return Err(GsiError::validation(format!(
                    "attribute '{}' is missing from AttributeDefinitions",
                    attribute
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        self.calls.lock().push(StoreCall::Describe {
            table_name: table_name.to_string(),
        });

        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| GsiError::not_found(format!("table '{}'", table_name)))?;

        let MemoryTable {
            description,
            building,
        } = table;
        for index in description.indexes.iter_mut() {
            if let Some(remaining) = building.get_mut(&index.index_name) {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    building.remove(&index.index_name);
                    index.status = IndexStatus::Active;
                }
            }
        }
        if building.is_empty() {
            description.status = TableStatus::Active;
        }

        Ok(description.clone())
    }

    async fn update_table(&self, request: &CreateIndexRequest) -> Result<TableDescription> {
        self.calls.lock().push(StoreCall::Create(request.clone()));

        if let Some(error) = self.faults.lock().remove(&request.index.index_name) {
            return Err(error);
        }

        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(|| GsiError::not_found(format!("table '{}'", request.table_name)))?;

        let in_progress = table
            .description
            .indexes
            .iter()
            .any(|i| i.status == IndexStatus::Creating);
        if in_progress {
            return Err(GsiError::resource_in_use(format!(
                "table '{}' already has an index build in progress",
                request.table_name
            )));
        }
        Self::validate(table, request)?;

        for def in &request.attribute_definitions {
            let known = table
                .description
                .attribute_definitions
                .iter()
                .any(|d| d.attribute_name == def.attribute_name);
            if !known {
                table.description.attribute_definitions.push(def.clone());
            }
        }

        let index = &request.index;
        let status = match self.activation_delay {
            Some(0) => IndexStatus::Active,
            Some(describes) => {
                table.building.insert(index.index_name.clone(), describes);
                IndexStatus::Creating
            }
            None => IndexStatus::Creating,
        };
        if status == IndexStatus::Creating {
            table.description.status = TableStatus::Updating;
        }
        table.description.indexes.push(IndexDescription {
            index_name: index.index_name.clone(),
            status,
            key_schema: index.key_schema.clone(),
            projection: Some(index.projection.clone()),
        });

        Ok(table.description.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeDefinition, IndexSpec, KeySchemaElement, Projection};

    fn request(index: &str, attribute: &str) -> CreateIndexRequest {
        CreateIndexRequest::new(
            "orders",
            IndexSpec::new(
                index,
                vec![KeySchemaElement::hash(attribute)],
                Projection::all(),
            ),
            vec![AttributeDefinition::string(attribute)],
        )
    }

    #[tokio::test]
    async fn new_index_turns_active_after_delay() {
        let store = MemoryTableStore::new().with_activation_delay(Some(2));
        store.create_table("orders");

        store.update_table(&request("by-status", "status")).await.unwrap();
        assert_eq!(
            store.index_status("orders", "by-status"),
            Some(IndexStatus::Creating)
        );

        let first = store.describe_table("orders").await.unwrap();
        assert_eq!(first.index("by-status").unwrap().status, IndexStatus::Creating);
        assert_eq!(first.status, TableStatus::Updating);

        let second = store.describe_table("orders").await.unwrap();
        assert_eq!(second.index("by-status").unwrap().status, IndexStatus::Active);
        assert_eq!(second.status, TableStatus::Active);
    }

    #[tokio::test]
    async fn one_build_at_a_time() {
        let store = MemoryTableStore::new().with_activation_delay(None);
        store.create_table("orders");

        store.update_table(&request("a", "x")).await.unwrap();
        let err = store.update_table(&request("b", "y")).await.unwrap_err();
        assert!(matches!(err, GsiError::ResourceInUse(_)));
    }

    #[tokio::test]
    async fn missing_attribute_definition_is_rejected() {
        let store = MemoryTableStore::new();
        store.create_table("orders");

        let mut bad = request("by-status", "status");
        bad.attribute_definitions.clear();

        let err = store.update_table(&bad).await.unwrap_err();
        assert!(matches!(err, GsiError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_table_is_not_found() {
        let store = MemoryTableStore::new();
        let err = store.describe_table("nope").await.unwrap_err();
        assert!(matches!(err, GsiError::NotFound(_)));
    }

    #[tokio::test]
    async fn scripted_fault_fires_once_and_is_recorded() {
        let store = MemoryTableStore::new().with_activation_delay(Some(0));
        store.create_table("orders");
        store.fail_next_create("by-status", GsiError::throttled("rate exceeded"));

        let err = store
            .update_table(&request("by-status", "status"))
            .await
            .unwrap_err();
        assert!(matches!(err, GsiError::Throttled(_)));

        store.update_table(&request("by-status", "status")).await.unwrap();
        assert_eq!(
            store.created_index_names(),
            vec!["by-status".to_string(), "by-status".to_string()]
        );
    }
}
