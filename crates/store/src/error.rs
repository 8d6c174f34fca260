//! Narrow error type for the store crate; converts into `docqa_core::Error`
//! at the crate boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document {0} not found")]
    NotFound(String),

    #[error("persistence I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("persisted artifact is malformed: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<StoreError> for docqa_core::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => docqa_core::Error::NotFound(id),
            StoreError::Io(e) => docqa_core::Error::Fatal(format!("store I/O: {e}")),
            StoreError::Corrupt(e) => docqa_core::Error::Fatal(format!("store corrupt: {e}")),
        }
    }
}
