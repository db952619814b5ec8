use crate::core::domain::model::category::Category;
use thiserror::Error;

/// The main error type for node telemetry operations.
///
/// This enum represents every failure the collector, the node store and the
/// change-event ingestion can return. Validation *findings* are not errors;
/// they are recorded in the report log instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// A fetch against a node agent failed at the transport level
    ///
    /// # Fields
    /// * `0` - Connection failure, timeout or non-2xx status description
    #[error("Transport error: {0}")]
    Transport(String),

    /// A node agent answered but the body did not decode into the payload type
    ///
    /// # Fields
    /// * `0` - The decoder message
    #[error("Decode error: {0}")]
    Decode(String),

    /// An operation referenced a node that is not in the store
    ///
    /// # Fields
    /// * `0` - The node name
    #[error("Node '{0}' not found")]
    NotFound(String),

    /// A node with the same name is already present
    ///
    /// # Fields
    /// * `0` - The node name
    #[error("Node '{0}' already exists")]
    DuplicateNode(String),

    /// The category exists in the data model but cannot be collected yet
    #[error("Category '{0}' is not supported for collection")]
    Unsupported(Category),

    /// A resync watcher rejected the new node set
    #[error("Watcher error: {0}")]
    Watcher(String),

    /// The collection coordinator is not running or has stopped
    #[error("Coordinator error: {0}")]
    Coordinator(String),

    /// Represents validation failures with detailed context
    ///
    /// # Fields
    /// * `source` - The underlying validation error
    #[error("Validation error: {source}")]
    Validation { source: ValidationError },
}

impl From<ValidationError> for TelemetryError {
    fn from(error: ValidationError) -> Self {
        TelemetryError::Validation { source: error }
    }
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a configuration value or
/// an externally supplied node attribute was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with a TelemetryError
pub type TelemetryResult<T> = Result<T, TelemetryError>;
