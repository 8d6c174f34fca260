//! Inverted Index (C8), Retriever (C9), Re-ranker (C10), and Retrieval
//! Cache (C12).

pub mod cache;
pub mod index;
pub mod reranker;
pub mod retriever;

pub use cache::{CacheStats, RetrievalCache};
pub use index::{CachedSection, InvertedIndex};
pub use reranker::{rerank, RerankCandidate};
pub use retriever::{retrieve, RetrievalOptions};
