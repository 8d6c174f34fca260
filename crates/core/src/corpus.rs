//! `CorpusVersion` — owned exclusively by the Document Store; part of every
//! cache key.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CorpusVersion(pub u64);

impl CorpusVersion {
    pub const INITIAL: CorpusVersion = CorpusVersion(0);

    pub fn next(self) -> Self {
        CorpusVersion(self.0 + 1)
    }
}

impl std::fmt::Display for CorpusVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Atomic counter backing the store's monotonic version. Kept here so the
/// retrieval cache and inverted index can observe it without depending on
/// `docqa-store`.
#[derive(Debug, Default)]
pub struct CorpusVersionCounter(AtomicU64);

impl CorpusVersionCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn current(&self) -> CorpusVersion {
        CorpusVersion(self.0.load(Ordering::Acquire))
    }

    /// Bump and return the new version. Must be called under the store's
    /// write lock.
    pub fn bump(&self) -> CorpusVersion {
        CorpusVersion(self.0.fetch_add(1, Ordering::AcqRel) + 1)
    }
}
