//! Database error handling module
//! Define the error kinds surfaced by configuration loading, connecting and releasing

use thiserror::Error;

/// Boxed cause of a driver or resource failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Database utility error
#[derive(Error, Debug)]
pub enum DbError {
    /// Configuration resource could not be located
    #[error("Configuration not found: {0}")]
    ConfigNotFound(String),

    /// Configuration is empty, unparseable or misses required keys
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Driver layer rejected the connection attempt
    #[error("Failed to connect to database {url}: {source}")]
    ConnectionError {
        /// Connection URL with any password masked
        url: String,
        #[source]
        source: BoxError,
    },

    /// Release was requested for an empty batch
    #[error("At least one closeable resource must be provided")]
    NoResourcesProvided,

    /// A resource of the batch failed to release
    #[error("Failed to release resource #{index} ({resource}): {source}")]
    ResourceReleaseError {
        /// Position of the resource in the supplied batch
        index: usize,
        /// Debug rendering of the resource
        resource: String,
        #[source]
        source: BoxError,
    },
}
