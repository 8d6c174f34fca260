//! Engine: orchestrates ingest (C1-C7) and chat (C8-C15) over one
//! in-process corpus, owning every collaborator's lifetime.

pub mod engine;
pub mod section_cache;
pub mod sessions;

pub use engine::Engine;
pub use section_cache::SectionCache;
pub use sessions::SessionStore;
