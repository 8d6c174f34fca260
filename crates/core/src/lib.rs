//! Core data model, error type, and external-collaborator traits shared by
//! every crate in the document QA engine.
//!
//! This crate owns the shapes described in spec §3 (`Section`,
//! `NormalizedDocument`, …) and §6 (`RawDocument`, `ChatRequest`, …) so that
//! no two crates invent their own copy of the same DTO.

pub mod aggregate;
pub mod conversation;
pub mod corpus;
pub mod document;
pub mod error;
pub mod extraction;
pub mod intent;
pub mod normalized;
pub mod retrieval;
pub mod traits;
pub mod util;
pub mod wire;

pub use aggregate::{
    AggregateField, AggregateFilters, AggregateOp, AggregatePlan, AggregateResult, GroupBy,
};
pub use conversation::{ConversationTurn, Role};
pub use corpus::{CorpusVersion, CorpusVersionCounter};
pub use document::{FileType, RawDocument, RawSection, Section};
pub use error::{Error, Result};
pub use extraction::{ExtractedAmount, ExtractedDate, ExtractedId, InvoiceIdPattern};
pub use intent::{Intent, IntentKind};
pub use normalized::{
    Confidence, DocType, DocumentSummary, LineItem, NormalizedDocument, ProcessingLogEntry,
    ProcessingStatus, TableKind, TableMeta, SCHEMA_VERSION,
};
pub use retrieval::{truncate_excerpt, MatchType, RetrievalResult, MAX_EXCERPT_CHARS};
pub use traits::{EmbeddingBatch, EmbeddingClient, GenerateOptions, LanguageModel};
pub use wire::{ChatMeta, ChatReference, ChatRequest, ChatResponse, IngestResult, ModelMeta};
