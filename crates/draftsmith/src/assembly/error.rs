use thiserror::Error;

use crate::error::StorageError;

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Failed to fill template: {0}")]
    Fill(String),

    #[error("Failed to convert document: {0}")]
    ConversionFailed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
