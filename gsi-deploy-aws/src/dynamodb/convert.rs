//! Conversions between the crate's model types and the SDK's types

use crate::error::{AwsStoreError, Result};
use aws_sdk_dynamodb::types as sdk;
use gsi_deploy_core::{
    AttributeDefinition, AttributeType, IndexDescription, IndexSpec, IndexStatus,
    KeySchemaElement, KeyType, Projection, ProjectionType, TableDescription, TableStatus,
};

pub(crate) fn attribute_definition_to_sdk(
    def: &AttributeDefinition,
) -> Result<sdk::AttributeDefinition> {
    let attribute_type = match def.attribute_type {
        AttributeType::String => sdk::ScalarAttributeType::S,
        AttributeType::Number => sdk::ScalarAttributeType::N,
        AttributeType::Binary => sdk::ScalarAttributeType::B,
    };
    sdk::AttributeDefinition::builder()
        .attribute_name(&def.attribute_name)
        .attribute_type(attribute_type)
        .build()
        .map_err(|e| AwsStoreError::build(e.to_string()))
}

pub(crate) fn key_schema_to_sdk(key: &KeySchemaElement) -> Result<sdk::KeySchemaElement> {
    let key_type = match key.key_type {
        KeyType::Hash => sdk::KeyType::Hash,
        KeyType::Range => sdk::KeyType::Range,
    };
    sdk::KeySchemaElement::builder()
        .attribute_name(&key.attribute_name)
        .key_type(key_type)
        .build()
        .map_err(|e| AwsStoreError::build(e.to_string()))
}

pub(crate) fn projection_to_sdk(projection: &Projection) -> sdk::Projection {
    let projection_type = match projection.projection_type {
        ProjectionType::All => sdk::ProjectionType::All,
        ProjectionType::KeysOnly => sdk::ProjectionType::KeysOnly,
        ProjectionType::Include => sdk::ProjectionType::Include,
    };
    sdk::Projection::builder()
        .projection_type(projection_type)
        .set_non_key_attributes(projection.non_key_attributes.clone())
        .build()
}

/// The `Create` action for one global secondary index update
pub(crate) fn create_action(index: &IndexSpec) -> Result<sdk::GlobalSecondaryIndexUpdate> {
    let key_schema = index
        .key_schema
        .iter()
        .map(key_schema_to_sdk)
        .collect::<Result<Vec<_>>>()?;

    let throughput = index
        .provisioned_throughput
        .map(|t| {
            sdk::ProvisionedThroughput::builder()
                .read_capacity_units(t.read_capacity_units)
                .write_capacity_units(t.write_capacity_units)
                .build()
                .map_err(|e| AwsStoreError::build(e.to_string()))
        })
        .transpose()?;

    let action = sdk::CreateGlobalSecondaryIndexAction::builder()
        .index_name(&index.index_name)
        .set_key_schema(Some(key_schema))
        .projection(projection_to_sdk(&index.projection))
        .set_provisioned_throughput(throughput)
        .build()
        .map_err(|e| AwsStoreError::build(e.to_string()))?;

    Ok(sdk::GlobalSecondaryIndexUpdate::builder()
        .create(action)
        .build())
}

fn attribute_definition_from_sdk(def: &sdk::AttributeDefinition) -> Option<AttributeDefinition> {
    let attribute_type = match def.attribute_type() {
        sdk::ScalarAttributeType::S => AttributeType::String,
        sdk::ScalarAttributeType::N => AttributeType::Number,
        sdk::ScalarAttributeType::B => AttributeType::Binary,
        _ => return None,
    };
    Some(AttributeDefinition::new(def.attribute_name(), attribute_type))
}

fn key_schema_from_sdk(key: &sdk::KeySchemaElement) -> Option<KeySchemaElement> {
    match key.key_type() {
        sdk::KeyType::Hash => Some(KeySchemaElement::hash(key.attribute_name())),
        sdk::KeyType::Range => Some(KeySchemaElement::range(key.attribute_name())),
        _ => None,
    }
}

fn projection_from_sdk(projection: &sdk::Projection) -> Option<Projection> {
    let projection_type = match projection.projection_type()? {
        sdk::ProjectionType::All => ProjectionType::All,
        sdk::ProjectionType::KeysOnly => ProjectionType::KeysOnly,
        sdk::ProjectionType::Include => ProjectionType::Include,
        _ => return None,
    };
    let non_key = projection.non_key_attributes();
    Some(Projection {
        projection_type,
        non_key_attributes: (!non_key.is_empty()).then(|| non_key.to_vec()),
    })
}

fn index_from_sdk(index: &sdk::GlobalSecondaryIndexDescription) -> Option<IndexDescription> {
    let index_name = index.index_name()?.to_string();
    let status = index
        .index_status()
        .map(|s| IndexStatus::from_wire(s.as_str()))
        .unwrap_or_else(|| IndexStatus::Unknown(String::new()));
    Some(IndexDescription {
        index_name,
        status,
        key_schema: index
            .key_schema()
            .iter()
            .filter_map(key_schema_from_sdk)
            .collect(),
        projection: index.projection().and_then(projection_from_sdk),
    })
}

/// Map a service table description onto the crate's model
///
/// Entries the model cannot represent (unnamed indexes, key types added after
/// this crate was written) are dropped rather than failing the describe.
pub(crate) fn table_from_sdk(
    fallback_name: &str,
    table: &sdk::TableDescription,
) -> TableDescription {
    TableDescription {
        table_name: table.table_name().unwrap_or(fallback_name).to_string(),
        status: table
            .table_status()
            .map(|s| TableStatus::from_wire(s.as_str()))
            .unwrap_or_else(|| TableStatus::Unknown(String::new())),
        indexes: table
            .global_secondary_indexes()
            .iter()
            .filter_map(index_from_sdk)
            .collect(),
        attribute_definitions: table
            .attribute_definitions()
            .iter()
            .filter_map(attribute_definition_from_sdk)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_action_carries_key_schema_and_projection() {
        let index = IndexSpec::new(
            "by-customer",
            vec![
                KeySchemaElement::hash("customerId"),
                KeySchemaElement::range("createdAt"),
            ],
            Projection::include(["total"]),
        )
        .with_provisioned_throughput(5, 2);

        let update = create_action(&index).unwrap();
        let create = update.create().unwrap();

        assert_eq!(create.index_name(), "by-customer");
        let keys = create.key_schema();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].attribute_name(), "customerId");
        assert_eq!(keys[0].key_type(), &sdk::KeyType::Hash);
        assert_eq!(keys[1].key_type(), &sdk::KeyType::Range);

        let projection = create.projection().unwrap();
        assert_eq!(
            projection.projection_type(),
            Some(&sdk::ProjectionType::Include)
        );
        assert_eq!(projection.non_key_attributes(), ["total".to_string()]);

        let throughput = create.provisioned_throughput().unwrap();
        assert_eq!(throughput.read_capacity_units(), 5);
        assert_eq!(throughput.write_capacity_units(), 2);
    }

    #[test]
    fn attribute_types_map_to_scalar_types() {
        let def = attribute_definition_to_sdk(&AttributeDefinition::number("createdAt")).unwrap();
        assert_eq!(def.attribute_name(), "createdAt");
        assert_eq!(def.attribute_type(), &sdk::ScalarAttributeType::N);
    }

    #[test]
    fn describe_output_maps_statuses_and_indexes() {
        let index = sdk::GlobalSecondaryIndexDescription::builder()
            .index_name("by-status")
            .index_status(sdk::IndexStatus::Creating)
            .key_schema(key_schema_to_sdk(&KeySchemaElement::hash("status")).unwrap())
            .projection(projection_to_sdk(&Projection::keys_only()))
            .build();
        let table = sdk::TableDescription::builder()
            .table_name("orders")
            .table_status(sdk::TableStatus::Updating)
            .global_secondary_indexes(index)
            .attribute_definitions(
                attribute_definition_to_sdk(&AttributeDefinition::string("status")).unwrap(),
            )
            .build();

        let described = table_from_sdk("orders", &table);

        assert_eq!(described.table_name, "orders");
        assert_eq!(described.status, TableStatus::Updating);
        let by_status = described.index("by-status").unwrap();
        assert_eq!(by_status.status, IndexStatus::Creating);
        assert_eq!(by_status.key_schema, vec![KeySchemaElement::hash("status")]);
        assert_eq!(by_status.projection, Some(Projection::keys_only()));
        assert_eq!(
            described.attribute_definitions,
            vec![AttributeDefinition::string("status")]
        );
    }

    #[test]
    fn missing_table_name_falls_back_to_requested_name() {
        let table = sdk::TableDescription::builder().build();
        let described = table_from_sdk("orders", &table);
        assert_eq!(described.table_name, "orders");
        assert!(described.indexes.is_empty());
    }
}
