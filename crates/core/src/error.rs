//! Workspace-level error type.
//!
//! Every crate defines its own narrow error enum and converts into this one
//! at the crate boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error kinds, matching the abstract kinds of the error design.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed `RawDocument` or query. Recovered by rejecting with a message.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// `NormalizedDocument` failed a §3 invariant. Ingest is rejected.
    #[error("schema invalid: {0}")]
    SchemaInvalid(String),

    /// Extraction produced a low-confidence value; recorded, not surfaced.
    #[error("extraction partial: {0}")]
    ExtractionPartial(String),

    /// Aggregation spans more than one currency.
    #[error("mixed currency in aggregation")]
    MixedCurrency {
        breakdown: std::collections::BTreeMap<String, rust_decimal::Decimal>,
    },

    /// Embedding or LLM call exceeded its budget.
    #[error("external call timed out: {0}")]
    ExternalTimeout(String),

    /// Embedding or LLM service unreachable.
    #[error("external service unavailable: {0}")]
    ExternalUnavailable(String),

    /// Concurrent supersession detected at the store write lock.
    #[error("store conflict: {0}")]
    StoreConflict(String),

    /// Invariant violation or corrupted persistence. Surfaced to the operator.
    #[error("fatal: {0}")]
    Fatal(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether this kind is recovered locally rather than surfaced verbatim
    /// to the conversation (see the error design's propagation policy).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ExtractionPartial(_) | Error::ExternalTimeout(_) | Error::ExternalUnavailable(_)
        )
    }
}
