//! A table's attribute definitions, with removal by name
//!
//! Attributes named by the table's own primary key are pinned: they can be
//! looked up and copied but never removed, because the table still needs them
//! after its indexes have been taken away.

use crate::error::{GsiError, Result};
use crate::model::AttributeDefinition;
use std::collections::HashSet;

#[derive(Clone, Debug, Default)]
pub struct AttributeCatalog {
    definitions: Vec<AttributeDefinition>,
    pinned: HashSet<String>,
}

impl AttributeCatalog {
    /// Build a catalog, rejecting duplicate attribute names
    pub fn new(definitions: Vec<AttributeDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.attribute_name.as_str()) {
                return Err(GsiError::invalid_template(format!(
                    "duplicate attribute definition '{}'",
                    def.attribute_name
                )));
            }
        }
        Ok(Self {
            definitions,
            pinned: HashSet::new(),
        })
    }

    /// Mark attributes that must stay in the catalog
    pub fn with_pinned<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pinned.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn find(&self, name: &str) -> Option<&AttributeDefinition> {
        self.definitions.iter().find(|d| d.attribute_name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.pinned.contains(name)
    }

    /// Remove an attribute, returning its definition
    pub fn remove(&mut self, name: &str) -> Result<AttributeDefinition> {
        let pos = self
            .definitions
            .iter()
            .position(|d| d.attribute_name == name)
            .ok_or_else(|| GsiError::not_found(format!("attribute definition '{}'", name)))?;
        Ok(self.definitions.remove(pos))
    }

    /// Take an attribute's definition for an index.
    ///
    /// Pinned attributes are copied and stay in place; all others are removed.
    pub fn relocate(&mut self, name: &str) -> Result<AttributeDefinition> {
        if self.is_pinned(name) {
            return self
                .find(name)
                .cloned()
                .ok_or_else(|| GsiError::not_found(format!("attribute definition '{}'", name)));
        }
        self.remove(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Remaining definitions in their original relative order
    pub fn into_definitions(self) -> Vec<AttributeDefinition> {
        self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_catalog() -> AttributeCatalog {
        AttributeCatalog::new(vec![
            AttributeDefinition::string("id"),
            AttributeDefinition::string("status"),
            AttributeDefinition::number("createdAt"),
        ])
        .unwrap()
        .with_pinned(["id"])
    }

    #[test]
    fn remove_takes_definition_out() {
        let mut catalog = orders_catalog();

        let def = catalog.remove("status").unwrap();
        assert_eq!(def, AttributeDefinition::string("status"));
        assert!(!catalog.contains("status"));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn remove_twice_is_not_found() {
        let mut catalog = orders_catalog();
        catalog.remove("status").unwrap();

        let err = catalog.remove("status").unwrap_err();
        assert!(matches!(err, GsiError::NotFound(_)));
    }

    #[test]
    fn relocate_keeps_pinned_attributes() {
        let mut catalog = orders_catalog();

        let id = catalog.relocate("id").unwrap();
        assert_eq!(id, AttributeDefinition::string("id"));
        assert!(catalog.contains("id"));

        let created = catalog.relocate("createdAt").unwrap();
        assert_eq!(created, AttributeDefinition::number("createdAt"));
        assert!(!catalog.contains("createdAt"));
    }

    #[test]
    fn remaining_definitions_keep_order() {
        let mut catalog = orders_catalog();
        catalog.remove("status").unwrap();

        let names: Vec<_> = catalog
            .into_definitions()
            .into_iter()
            .map(|d| d.attribute_name)
            .collect();
        assert_eq!(names, vec!["id", "createdAt"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = AttributeCatalog::new(vec![
            AttributeDefinition::string("id"),
            AttributeDefinition::number("id"),
        ])
        .unwrap_err();
        assert!(matches!(err, GsiError::InvalidTemplate(_)));
    }
}
