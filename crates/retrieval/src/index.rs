//! Inverted Index (§4.8): token → section-id postings, built eagerly at
//! ingest and swapped atomically so readers always see a consistent
//! snapshot.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use docqa_core::{NormalizedDocument, Section};
use docqa_text::{filename_to_text, normalize};
use parking_lot::RwLock;

/// Per-section cache kept alongside the index, per §4.8.
#[derive(Debug, Clone)]
pub struct CachedSection {
    pub section_id: String,
    pub document_id: String,
    pub filename: String,
    pub normalized_text: String,
    pub token_set: BTreeSet<String>,
    pub trigram_set: BTreeSet<String>,
    pub original_text: String,
    pub ordinal: usize,
    pub page: Option<u32>,
}

#[derive(Debug, Default)]
struct IndexState {
    postings: HashMap<String, BTreeSet<String>>,
    sections: HashMap<String, CachedSection>,
    section_counts: HashMap<String, usize>,
}

fn build_state(sections: &[Section], documents: &[NormalizedDocument]) -> IndexState {
    let mut postings: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut cached: HashMap<String, CachedSection> = HashMap::new();
    let mut section_counts: HashMap<String, usize> = HashMap::new();

    let filenames: HashMap<&str, &str> =
        documents.iter().map(|d| (d.id.as_str(), d.filename.as_str())).collect();

    for section in sections {
        section_counts
            .entry(section.document_id.clone())
            .and_modify(|c| *c += 1)
            .or_insert(1);

        let filename = filenames.get(section.document_id.as_str()).copied().unwrap_or_default();
        for token in &section.token_set {
            postings.entry(token.clone()).or_default().insert(section.id.clone());
        }
        cached.insert(
            section.id.clone(),
            CachedSection {
                section_id: section.id.clone(),
                document_id: section.document_id.clone(),
                filename: filename.to_string(),
                normalized_text: section.normalized_content.clone(),
                token_set: section.token_set.iter().cloned().collect(),
                trigram_set: section.trigram_set.iter().cloned().collect(),
                original_text: section.raw_content.clone(),
                ordinal: section.ordinal,
                page: section.page,
            },
        );
    }

    for doc in documents {
        let filename_tokens = normalize(&filename_to_text(&doc.filename)).tokens_indexable;
        for token in filename_tokens {
            postings.entry(token).or_default().extend(doc.section_ids.iter().cloned());
        }
    }

    IndexState { postings, sections: cached, section_counts }
}

/// Thread-safe, swappable inverted index. Readers take the read lock only
/// long enough to clone the `Arc`, then operate on their own snapshot.
#[derive(Clone)]
pub struct InvertedIndex {
    state: Arc<RwLock<Arc<IndexState>>>,
}

impl InvertedIndex {
    pub fn empty() -> Self {
        Self { state: Arc::new(RwLock::new(Arc::new(IndexState::default()))) }
    }

    pub fn build(sections: &[Section], documents: &[NormalizedDocument]) -> Self {
        Self { state: Arc::new(RwLock::new(Arc::new(build_state(sections, documents)))) }
    }

    /// Rebuilds from scratch and swaps the snapshot in one write-lock hold.
    pub fn rebuild(&self, sections: &[Section], documents: &[NormalizedDocument]) {
        let fresh = Arc::new(build_state(sections, documents));
        *self.state.write() = fresh;
    }

    fn snapshot(&self) -> Arc<IndexState> {
        self.state.read().clone()
    }

    pub fn postings(&self, token: &str) -> BTreeSet<String> {
        self.snapshot().postings.get(token).cloned().unwrap_or_default()
    }

    pub fn section(&self, section_id: &str) -> Option<CachedSection> {
        self.snapshot().sections.get(section_id).cloned()
    }

    pub fn section_count(&self, document_id: &str) -> usize {
        self.snapshot().section_counts.get(document_id).copied().unwrap_or(0)
    }
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::{Confidence, DocType, FileType, SCHEMA_VERSION};
    use std::collections::HashMap as StdHashMap;

    fn section(id: &str, doc_id: &str, ordinal: usize, text: &str) -> Section {
        let n = normalize(text);
        Section {
            id: id.to_string(),
            document_id: doc_id.to_string(),
            ordinal,
            raw_content: text.to_string(),
            normalized_content: n.text,
            token_set: n.tokens_indexable.into_iter().collect(),
            trigram_set: n.trigrams.into_iter().collect(),
            page: None,
            sheet: None,
        }
    }

    fn document(id: &str, filename: &str, section_ids: Vec<&str>) -> NormalizedDocument {
        NormalizedDocument {
            schema_v: SCHEMA_VERSION,
            id: id.to_string(),
            filename: filename.to_string(),
            file_type: FileType::Pdf,
            doc_type: DocType::Invoice,
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
            section_ids: section_ids.into_iter().map(String::from).collect(),
            metadata: StdHashMap::new(),
        }
    }

    #[test]
    fn postings_include_body_and_filename_tokens() {
        let sections = vec![section("s1", "d1", 0, "bu fatura odeme detaylarini icerir")];
        let documents = vec![document("d1", "photobox_fatura.pdf", vec!["s1"])];
        let index = InvertedIndex::build(&sections, &documents);

        assert!(index.postings("fatura").contains("s1"));
        assert!(index.postings("photobox").contains("s1"));
        assert_eq!(index.section_count("d1"), 1);
    }

    #[test]
    fn rebuild_replaces_snapshot() {
        let index = InvertedIndex::empty();
        assert!(index.section("s1").is_none());
        let sections = vec![section("s1", "d1", 0, "merhaba dunya")];
        let documents = vec![document("d1", "belge.pdf", vec!["s1"])];
        index.rebuild(&sections, &documents);
        assert!(index.section("s1").is_some());
    }
}
