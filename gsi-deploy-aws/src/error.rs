//! Error types for the DynamoDB table store

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use gsi_deploy_core::GsiError;
use std::fmt::Debug;
use thiserror::Error;

/// Errors from DynamoDB operations
#[derive(Debug, Error)]
pub enum AwsStoreError {
    /// The service answered with an error code
    #[error("{operation} failed: {code}: {message}")]
    Service {
        operation: &'static str,
        code: String,
        message: String,
    },

    /// The request never got an answer (network, timeout, credentials)
    #[error("{operation} failed: {message}")]
    Dispatch {
        operation: &'static str,
        message: String,
    },

    /// Request could not be built from the index definition
    #[error("Invalid request: {0}")]
    Build(String),

    /// The service answered without the data we asked for
    #[error("Unexpected response: {0}")]
    Response(String),
}

impl AwsStoreError {
    pub fn build(msg: impl Into<String>) -> Self {
        Self::Build(msg.into())
    }

    pub fn response(msg: impl Into<String>) -> Self {
        Self::Response(msg.into())
    }

    /// Classify an SDK failure by its service error code
    pub fn from_sdk<E, R>(operation: &'static str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: Debug,
    {
        match &err {
            SdkError::ServiceError(_) => Self::Service {
                operation,
                code: err.code().unwrap_or("Unknown").to_string(),
                message: err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
            },
            _ => Self::Dispatch {
                operation,
                message: DisplayErrorContext(&err).to_string(),
            },
        }
    }
}

/// Result type for DynamoDB table store operations
pub type Result<T> = std::result::Result<T, AwsStoreError>;

// Convert to the core error taxonomy
impl From<AwsStoreError> for GsiError {
    fn from(err: AwsStoreError) -> Self {
        match &err {
            AwsStoreError::Service { code, .. } => match code.as_str() {
                "ResourceNotFoundException" => GsiError::not_found(err.to_string()),
                "ResourceInUseException" => GsiError::resource_in_use(err.to_string()),
                "ValidationException" => GsiError::validation(err.to_string()),
                "ThrottlingException"
                | "LimitExceededException"
                | "ProvisionedThroughputExceededException"
                | "RequestLimitExceeded" => GsiError::throttled(err.to_string()),
                _ => GsiError::store(err.to_string()),
            },
            AwsStoreError::Build(msg) => GsiError::validation(msg.clone()),
            AwsStoreError::Dispatch { .. } | AwsStoreError::Response(_) => {
                GsiError::store(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(code: &str) -> AwsStoreError {
        AwsStoreError::Service {
            operation: "UpdateTable",
            code: code.to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn service_codes_map_to_error_kinds() {
        assert!(matches!(
            GsiError::from(service("ResourceNotFoundException")),
            GsiError::NotFound(_)
        ));
        assert!(matches!(
            GsiError::from(service("ResourceInUseException")),
            GsiError::ResourceInUse(_)
        ));
        assert!(matches!(
            GsiError::from(service("ValidationException")),
            GsiError::Validation(_)
        ));
        assert!(matches!(
            GsiError::from(service("LimitExceededException")),
            GsiError::Throttled(_)
        ));
        assert!(matches!(
            GsiError::from(service("ThrottlingException")),
            GsiError::Throttled(_)
        ));
        assert!(matches!(
            GsiError::from(service("InternalServerError")),
            GsiError::Store(_)
        ));
    }

    #[test]
    fn message_keeps_operation_and_code() {
        let err = GsiError::from(service("ValidationException"));
        assert_eq!(
            err.to_string(),
            "Validation error: UpdateTable failed: ValidationException: boom"
        );
    }

    #[test]
    fn build_failures_are_validation_errors() {
        assert!(matches!(
            GsiError::from(AwsStoreError::build("missing key type")),
            GsiError::Validation(_)
        ));
    }
}
