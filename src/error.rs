use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Priority must be an integer between 1 and 5, got {0}.")]
    InvalidPriority(i64),

    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Maximum distance must be a non-negative number, got {0}.")]
    InvalidDistance(f64),

    #[error("Invalid reservation: {0}")]
    InvalidReservation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task already exists: {0}")]
    DuplicateTask(String),

    #[error("Resource type not found: {0}")]
    ResourceTypeNotFound(String),

    #[error("Cannot delete resource type {0}, it is currently in use")]
    ResourceTypeInUse(String),

    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to encode or decode binary data: {0}")]
    EncodingError(#[from] bincode::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl Error {
    /// Returns true for malformed-input errors. These never leave an entity
    /// or the assignment in a modified state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidLocation(_)
                | Error::InvalidIdentifier(_)
                | Error::InvalidPriority(_)
                | Error::InvalidTimeWindow(_)
                | Error::InvalidQuantity(_)
                | Error::InvalidDistance(_)
                | Error::InvalidReservation(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::TaskNotFound(_) | Error::ResourceTypeNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
