//! Index plan extraction
//!
//! Removes every table's `GlobalSecondaryIndexes` from the template, together
//! with the attribute definitions only those indexes need, and returns them as
//! one [`TableIndexPlan`] per table. The reduced template can then be deployed
//! in a single update; the plans are applied afterwards by the
//! [`ReconciliationEngine`](crate::reconcile::ReconciliationEngine).
//!
//! Extraction is a pure in-memory transformation and is idempotent: a second
//! pass over the same template sees no declared indexes and returns no plans.

use crate::catalog::AttributeCatalog;
use crate::error::{GsiError, Result};
use crate::model::{IndexSpec, KeyType, TableIndexPlan};
use crate::template::{TableResource, Template};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Scans a template for table resources and pulls their indexes into plans
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexPlanExtractor;

impl IndexPlanExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract plans from every table resource that declares indexes.
    ///
    /// Plans are returned in resource order. On error the template may be
    /// partially processed and should be discarded.
    pub fn extract(&self, template: &mut Template) -> Result<Vec<TableIndexPlan>> {
        let Some(resources) = template.resources_mut()? else {
            debug!("template has no resources section");
            return Ok(Vec::new());
        };

        let mut plans = Vec::new();
        for (logical_name, resource) in resources.iter_mut() {
            let Some(mut table) = TableResource::from_resource(logical_name, resource)? else {
                continue;
            };
            if let Some(plan) = self.extract_table(&mut table)? {
                plans.push(plan);
            }
        }

        info!(tables = plans.len(), "extracted deferred index plans");
        Ok(plans)
    }

    fn extract_table(&self, table: &mut TableResource<'_>) -> Result<Option<TableIndexPlan>> {
        if !table.has_secondary_indexes() {
            return Ok(None);
        }

        let indexes = table.secondary_indexes()?;
        if indexes.is_empty() {
            table.remove_secondary_indexes();
            return Ok(None);
        }

        let table_name = table.table_name()?;
        let retained = table.retained_key_attributes()?;
        let mut catalog =
            AttributeCatalog::new(table.attribute_definitions()?)?.with_pinned(retained);

        let mut plan = TableIndexPlan::new(&table_name);
        let mut index_names = HashSet::new();

        for index in indexes {
            if !index_names.insert(index.index_name.clone()) {
                return Err(GsiError::invalid_template(format!(
                    "table '{}' declares index '{}' more than once",
                    table_name, index.index_name
                )));
            }
            validate_key_schema(&table_name, &index)?;

            if !index.has_key_schema() {
                warn!(
                    table = %table_name,
                    index = %index.index_name,
                    "index has an empty key schema and will not be created"
                );
                plan.skipped_indexes.push(index.index_name);
                continue;
            }

            for attribute in index.referenced_attributes() {
                if plan.required_attribute(attribute).is_some() {
                    continue;
                }
                let definition = catalog.relocate(attribute).map_err(|_| {
                    GsiError::not_found(format!(
                        "attribute '{}' referenced by index '{}' on table '{}' has no definition",
                        attribute, index.index_name, table_name
                    ))
                })?;
                plan.required_attributes.push(definition);
            }

            debug!(table = %table_name, index = %index.index_name, "deferring index");
            plan.pending_indexes.push(index);
        }

        table.remove_secondary_indexes();
        table.set_attribute_definitions(&catalog.into_definitions())?;

        info!(
            table = %table_name,
            resource = table.logical_name(),
            pending = plan.pending_indexes.len(),
            skipped = plan.skipped_indexes.len(),
            attributes = plan.required_attributes.len(),
            "removed secondary indexes from table resource"
        );
        Ok(Some(plan))
    }
}

/// At most two key elements, at most one of each key type
fn validate_key_schema(table_name: &str, index: &IndexSpec) -> Result<()> {
    let invalid = |reason: &str| {
        GsiError::invalid_template(format!(
            "index '{}' on table '{}': {}",
            index.index_name, table_name, reason
        ))
    };

    if index.key_schema.len() > 2 {
        return Err(invalid("key schema has more than two elements"));
    }
    let hashes = index
        .key_schema
        .iter()
        .filter(|k| k.key_type == KeyType::Hash)
        .count();
    let ranges = index.key_schema.len() - hashes;
    if hashes > 1 || ranges > 1 {
        return Err(invalid("key schema repeats a key type"));
    }
    if ranges == 1 && hashes == 0 {
        return Err(invalid("key schema has a RANGE key but no HASH key"));
    }
    Ok(())
}

/// Extract plans from `template` with the default extractor
pub fn extract(template: &mut Template) -> Result<Vec<TableIndexPlan>> {
    IndexPlanExtractor::new().extract(template)
}
