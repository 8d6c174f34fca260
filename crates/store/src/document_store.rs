//! Document Store (§4.7): process-lifetime in-memory collection of
//! `NormalizedDocument`s, persisted by a thin external collaborator.
//!
//! Invariant: at most one non-archived record per `id`. `insert` enforces
//! this by archiving any existing non-archived record with the same id
//! before appending the new one.

use std::sync::Arc;

use chrono::Utc;
use docqa_core::{CorpusVersion, CorpusVersionCounter, NormalizedDocument};
use parking_lot::RwLock;

use crate::error::StoreError;

/// Shared, versioned collection of documents. Cheap to clone — internally
/// an `Arc` over the lock and the version counter.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<RwLock<Vec<NormalizedDocument>>>,
    version: Arc<CorpusVersionCounter>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(Vec::new())), version: Arc::new(CorpusVersionCounter::new()) }
    }

    pub fn from_documents(documents: Vec<NormalizedDocument>) -> Self {
        Self { inner: Arc::new(RwLock::new(documents)), version: Arc::new(CorpusVersionCounter::new()) }
    }

    pub fn version(&self) -> CorpusVersion {
        self.version.current()
    }

    pub fn version_counter(&self) -> Arc<CorpusVersionCounter> {
        self.version.clone()
    }

    /// Appends `doc`; archives any existing non-archived record sharing its
    /// `id` first. Always bumps `CorpusVersion`.
    pub fn insert(&self, mut doc: NormalizedDocument) -> CorpusVersion {
        let mut guard = self.inner.write();
        for existing in guard.iter_mut() {
            if existing.id == doc.id && !existing.archived {
                existing.archived = true;
                existing.archived_at = Some(Utc::now());
            }
        }
        doc.archived = false;
        doc.archived_at = None;
        guard.push(doc);
        drop(guard);
        self.version.bump()
    }

    pub fn get(&self, id: &str) -> Option<NormalizedDocument> {
        self.inner.read().iter().find(|d| d.id == id && !d.archived).cloned()
    }

    /// Lists documents; archived records are excluded unless
    /// `include_archived` is set.
    pub fn list(&self, include_archived: bool) -> Vec<NormalizedDocument> {
        self.inner
            .read()
            .iter()
            .filter(|d| include_archived || !d.archived)
            .cloned()
            .collect()
    }

    /// Physically removes the record `id` and every archived predecessor.
    /// Bumps `CorpusVersion` even if nothing matched (§4.7 makes no
    /// exception for a no-op purge, and callers treat the version bump as
    /// the signal that a mutation attempt occurred).
    pub fn purge(&self, id: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.write();
        let before = guard.len();
        guard.retain(|d| d.id != id);
        if guard.len() == before {
            drop(guard);
            return Err(StoreError::NotFound(id.to_string()));
        }
        drop(guard);
        self.version.bump();
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<NormalizedDocument> {
        self.inner.read().clone()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::{Confidence, DocType, FileType, SCHEMA_VERSION};
    use std::collections::HashMap;

    fn doc(id: &str) -> NormalizedDocument {
        NormalizedDocument {
            schema_v: SCHEMA_VERSION,
            id: id.to_string(),
            filename: format!("{id}.pdf"),
            file_type: FileType::Pdf,
            doc_type: DocType::Other,
            invoice_no: None,
            date: None,
            supplier: None,
            buyer: None,
            currency: None,
            total: None,
            tax: None,
            items: Vec::new(),
            tables: Vec::new(),
            summary: None,
            confidence: Confidence { classification: 1.0, heuristic: 1.0, semantic: 1.0 },
            needs_human_review: false,
            source_sample: String::new(),
            embedding: None,
            embedding_model: None,
            processing_log: Vec::new(),
            archived: false,
            archived_at: None,
            section_ids: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn insert_archives_prior_non_archived_record() {
        let store = DocumentStore::new();
        store.insert(doc("d1"));
        store.insert(doc("d1"));
        let all = store.list(true);
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|d| !d.archived).count(), 1);
        assert_eq!(store.version(), CorpusVersion(2));
    }

    #[test]
    fn list_excludes_archived_by_default() {
        let store = DocumentStore::new();
        store.insert(doc("d1"));
        store.insert(doc("d1"));
        assert_eq!(store.list(false).len(), 1);
    }

    #[test]
    fn purge_removes_all_predecessors_and_bumps_version() {
        let store = DocumentStore::new();
        store.insert(doc("d1"));
        store.insert(doc("d1"));
        store.purge("d1").unwrap();
        assert!(store.list(true).is_empty());
        assert_eq!(store.version(), CorpusVersion(3));
    }

    #[test]
    fn purge_missing_id_errors() {
        let store = DocumentStore::new();
        assert!(matches!(store.purge("nope"), Err(StoreError::NotFound(_))));
    }
}
