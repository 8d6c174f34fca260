//! Document Store (C7): the process-lifetime, versioned document
//! collection, plus its single-file JSON persistence collaborator.

pub mod document_store;
pub mod error;
pub mod persistence;

pub use document_store::DocumentStore;
pub use error::StoreError;
pub use persistence::JsonFilePersistence;
