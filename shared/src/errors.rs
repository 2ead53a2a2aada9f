//! Shared error types for the invitation agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid group reference: {input:?}")]
    InvalidGroupRef { input: String },

    #[error("Logging setup failed: {message}")]
    LoggingError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
