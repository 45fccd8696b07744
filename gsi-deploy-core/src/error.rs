//! Error types for index plan extraction and reconciliation

use crate::reconcile::ReconcileReport;
use thiserror::Error;

/// Result type for extraction and reconciliation operations
pub type Result<T> = std::result::Result<T, GsiError>;

/// Errors that can occur while extracting or reconciling index plans
#[derive(Error, Debug)]
pub enum GsiError {
    /// Malformed or incomplete resource shape in the template
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Attribute, table or index referenced but absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected by the table service (missing attribute definition,
    /// malformed key schema, duplicate index name)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another index build is already in progress on the table
    #[error("Resource in use: {0}")]
    ResourceInUse(String),

    /// Rate limited by the table service
    #[error("Throttled: {0}")]
    Throttled(String),

    /// Index did not become active within the poll bound
    #[error("Timed out waiting for index '{index}' on table '{table}' after {attempts} poll attempts")]
    Timeout {
        table: String,
        index: String,
        attempts: u32,
    },

    /// Index moved into a state it cannot recover from while being awaited
    #[error("Index '{index}' on table '{table}' entered unexpected status {status}")]
    UnexpectedIndexStatus {
        table: String,
        index: String,
        status: String,
    },

    /// A remote call made on behalf of one index failed
    #[error("Index '{index}' on table '{table}': {source}")]
    Index {
        table: String,
        index: String,
        #[source]
        source: Box<GsiError>,
    },

    /// Reconciliation stopped at its first failure. `report` holds every
    /// table finished before it, plus the failing table up to the failure.
    #[error("{source}")]
    Aborted {
        report: Box<ReconcileReport>,
        #[source]
        source: Box<GsiError>,
    },

    /// Other table service failure (network, credentials, unknown service error)
    #[error("Storage error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GsiError {
    /// Create an invalid template error
    pub fn invalid_template(msg: impl Into<String>) -> Self {
        Self::InvalidTemplate(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a resource in use error
    pub fn resource_in_use(msg: impl Into<String>) -> Self {
        Self::ResourceInUse(msg.into())
    }

    /// Create a throttled error
    pub fn throttled(msg: impl Into<String>) -> Self {
        Self::Throttled(msg.into())
    }

    /// Create a storage error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Attach the table and index a remote failure happened for
    pub fn for_index(self, table: impl Into<String>, index: impl Into<String>) -> Self {
        Self::Index {
            table: table.into(),
            index: index.into(),
            source: Box::new(self),
        }
    }

    /// Name of the index this error was raised for, if any
    pub fn index_name(&self) -> Option<&str> {
        match self {
            Self::Timeout { index, .. }
            | Self::UnexpectedIndexStatus { index, .. }
            | Self::Index { index, .. } => Some(index),
            Self::Aborted { source, .. } => source.index_name(),
            _ => None,
        }
    }

    /// The underlying error with any index context peeled off
    pub fn root(&self) -> &GsiError {
        match self {
            Self::Index { source, .. } | Self::Aborted { source, .. } => source.root(),
            other => other,
        }
    }

    /// Progress made before an aborted reconciliation stopped
    pub fn partial_report(&self) -> Option<&ReconcileReport> {
        match self {
            Self::Aborted { report, .. } => Some(report),
            _ => None,
        }
    }
}
