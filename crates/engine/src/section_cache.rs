//! In-memory full-text cache backing the Inverted Index.
//!
//! `NormalizedDocument` (the record the Document Store persists) keeps only
//! `section_ids` and a truncated `source_sample` — §3 deliberately excludes
//! full section bodies from the persisted schema. The engine is the one
//! place that still needs the raw/normalized text of every section (to
//! build `Section` records for `InvertedIndex::build`), so it keeps its own
//! keyed cache, populated at ingest time and never persisted. A process
//! restart therefore rebuilds the index lazily: nothing is retrievable by
//! content until the corresponding documents are re-ingested.

use std::collections::HashMap;

use docqa_core::{RawSection, Section};
use parking_lot::RwLock;

#[derive(Default)]
pub struct SectionCache {
    inner: RwLock<HashMap<String, Section>>,
}

impl SectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds `Section` records from a raw document's sections and stores
    /// them, keyed by section id.
    pub fn insert_document(&self, document_id: &str, raw_sections: &[RawSection]) {
        let mut guard = self.inner.write();
        for (ordinal, raw) in raw_sections.iter().enumerate() {
            let normalized = docqa_text::normalize(&raw.content);
            guard.insert(
                raw.id.clone(),
                Section {
                    id: raw.id.clone(),
                    document_id: document_id.to_string(),
                    ordinal,
                    raw_content: raw.content.clone(),
                    normalized_content: normalized.text,
                    token_set: normalized.tokens_indexable.into_iter().collect(),
                    trigram_set: normalized.trigrams.into_iter().collect(),
                    page: raw.page,
                    sheet: raw.sheet.clone(),
                },
            );
        }
    }

    pub fn remove_document(&self, document_id: &str) {
        self.inner.write().retain(|_, section| section.document_id != document_id);
    }

    pub fn all(&self) -> Vec<Section> {
        self.inner.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, content: &str) -> RawSection {
        RawSection { id: id.to_string(), content: content.to_string(), page: None, sheet: None }
    }

    #[test]
    fn insert_then_remove_document_drops_its_sections() {
        let cache = SectionCache::new();
        cache.insert_document("d1", &[raw("s1", "merhaba dunya"), raw("s2", "ikinci bolum")]);
        assert_eq!(cache.all().len(), 2);

        cache.remove_document("d1");
        assert!(cache.all().is_empty());
    }

    #[test]
    fn normalizes_content_into_token_and_trigram_sets() {
        let cache = SectionCache::new();
        cache.insert_document("d1", &[raw("s1", "bir iki uc dort")]);
        let sections = cache.all();
        assert_eq!(sections.len(), 1);
        assert!(!sections[0].token_set.is_empty());
        assert!(!sections[0].trigram_set.is_empty());
    }
}
