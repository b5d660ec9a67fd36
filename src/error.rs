// error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected user input. Nothing was mutated or written.
    #[error("{0}")]
    Validation(String),

    /// Writing the backing store failed.
    #[error("Failed to save data, changes may not be saved: {0}")]
    Persist(#[from] std::io::Error),

    #[error("Failed to read saved data: {0}")]
    Load(std::io::Error),

    /// A loaded id sits at the top of the id range.
    #[error("Stored data is corrupt: no ids left after {0}")]
    IdsExhausted(i64),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        StoreError::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
