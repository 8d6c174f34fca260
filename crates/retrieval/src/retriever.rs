//! Retriever (§4.9): the cascading token/trigram/filename score, including
//! the filename-only-match floor, intent-aware price boosting, and the
//! short-query "general" bypass.

use std::collections::{BTreeSet, HashMap};

use docqa_core::{Intent, IntentKind, MatchType, NormalizedDocument, RetrievalResult};
use docqa_text::{filename_to_text, normalize_query, strip_extension};

use crate::index::InvertedIndex;
use crate::reranker::{rerank, RerankCandidate};

#[derive(Debug, Clone, Copy)]
pub struct RetrievalOptions {
    pub max_refs: usize,
    pub min_score: f32,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self { max_refs: 3, min_score: 0.15 }
    }
}

const GENERAL_QUERY_MAX_TOKENS: usize = 3;
const GENERAL_QUERY_MAX_TOKEN_LEN: usize = 4;
const GENERAL_QUERY_SECTIONS_PER_DOC: usize = 3;
const GENERAL_QUERY_SCORE: f32 = 0.9;
const TRIGRAM_BONUS_THRESHOLD: f32 = 0.5;
const TRIGRAM_BONUS_WEIGHT: f32 = 0.3;
const FILENAME_MATCHED_THRESHOLD: f32 = 0.3;
const FILENAME_BONUS_WEIGHT: f32 = 0.9;
const FILENAME_FLOOR_THRESHOLD: f32 = 0.7;
const FILENAME_FLOOR_SCORE: f32 = 0.5;
const FILENAME_FLOOR_BELOW: f32 = 0.3;
const PRICE_BOOST: f32 = 0.3;
const PRICE_DOWNWEIGHT: f32 = 0.5;

const PRICE_KEYWORDS: &[&str] = &[
    "fiyat", "tutar", "toplam", "fatura", "bedel", "kdv", "price", "amount", "total", "cost",
];

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// Ladder of filename-match rungs (§4.9 step 2). Returns the strongest
/// applicable score for one document's filename against the query.
fn filename_match_score(query_text: &str, query_tokens: &BTreeSet<String>, filename: &str) -> f32 {
    let filename_norm = normalize_query(&strip_extension(filename));
    if !query_text.is_empty() && query_text == filename_norm.text {
        return 1.00;
    }

    let mut best = 0.0f32;
    for qt in query_tokens {
        for ft in &filename_norm.tokens_indexable {
            if ft.len() >= qt.len() && ft.starts_with(qt.as_str()) {
                best = best.max(0.95);
            }
            if ft.contains(qt.as_str()) {
                best = best.max(0.85);
            }
            if qt.len() >= ft.len() && qt.starts_with(ft.as_str()) {
                best = best.max(0.75);
            }
            if qt.contains(ft.as_str()) {
                best = best.max(0.65);
            }
        }
    }

    let overlap = query_tokens.intersection(&filename_norm.tokens_indexable).count();
    if overlap >= 2 {
        best = best.max(0.40);
    }
    best
}

fn mentions_price(query_text: &str) -> bool {
    PRICE_KEYWORDS.iter().any(|kw| query_text.contains(kw))
}

fn section_has_numeric_signal(raw_text: &str) -> bool {
    !docqa_extract::extract_amounts(raw_text, "").is_empty()
}

/// Runs the Retriever's full pipeline against a live document/index
/// snapshot. `documents` should be the non-archived listing from the
/// Document Store; the cache is consulted and populated by the caller
/// (engine), since cache keys also depend on `corpus_version`.
pub fn retrieve(
    query: &str,
    documents: &[NormalizedDocument],
    index: &InvertedIndex,
    intent: &Intent,
    options: RetrievalOptions,
) -> Vec<RetrievalResult> {
    let normalized_query = normalize_query(query);
    if normalized_query.tokens_all.is_empty() {
        return Vec::new();
    }

    if is_general_query(&normalized_query.tokens_all) {
        return general_query_results(documents, index, options);
    }

    let query_tokens = &normalized_query.tokens_indexable;
    let query_trigrams = &normalized_query.trigrams;

    let mut filename_scores: HashMap<&str, f32> = HashMap::new();
    for doc in documents {
        let score = filename_match_score(&normalized_query.text, query_tokens, &doc.filename);
        filename_scores.insert(doc.id.as_str(), score);
    }
    let filename_matched: HashMap<&str, f32> = filename_scores
        .iter()
        .filter(|(_, score)| **score >= FILENAME_MATCHED_THRESHOLD)
        .map(|(id, score)| (*id, *score))
        .collect();

    let mut candidate_ids: BTreeSet<String> = BTreeSet::new();
    for token in query_tokens {
        candidate_ids.extend(index.postings(token));
    }
    for doc in documents {
        if filename_matched.contains_key(doc.id.as_str()) {
            candidate_ids.extend(doc.section_ids.iter().cloned());
        }
    }

    if candidate_ids.is_empty() {
        return Vec::new();
    }

    let wants_price = matches!(intent.kind, IntentKind::Aggregate | IntentKind::Document) && mentions_price(&normalized_query.text);

    let mut rerank_candidates = Vec::new();
    for section_id in &candidate_ids {
        let Some(section) = index.section(section_id) else { continue };

        let mut score = jaccard(query_tokens, &section.token_set);
        if score >= TRIGRAM_BONUS_THRESHOLD {
            score += jaccard(query_trigrams, &section.trigram_set) * TRIGRAM_BONUS_WEIGHT;
        }

        let mut match_type = MatchType::Partial;
        if let Some(fscore) = filename_matched.get(section.document_id.as_str()) {
            if score < FILENAME_FLOOR_BELOW && *fscore >= FILENAME_FLOOR_THRESHOLD {
                score = FILENAME_FLOOR_SCORE;
            }
            score += FILENAME_BONUS_WEIGHT * fscore;
            match_type = MatchType::Filename;
        } else if score > 0.0 && jaccard(query_trigrams, &section.trigram_set) > 0.0 {
            match_type = MatchType::Ngram;
        }
        if score >= 0.999 {
            match_type = MatchType::Exact;
        }

        if wants_price {
            if section_has_numeric_signal(&section.original_text) {
                score += PRICE_BOOST;
            } else {
                score *= PRICE_DOWNWEIGHT;
            }
        }

        score = score.clamp(0.0, 1.0);

        if score < options.min_score {
            continue;
        }

        let filename_relevance = filename_scores.get(section.document_id.as_str()).copied().unwrap_or(0.0);
        let section_count = index.section_count(&section.document_id).max(1);

        rerank_candidates.push(RerankCandidate {
            section_id: section.section_id.clone(),
            document_id: section.document_id.clone(),
            filename: section.filename.clone(),
            raw_text: section.original_text.clone(),
            token_set: section.token_set.clone(),
            trigram_set: section.trigram_set.clone(),
            ordinal: section.ordinal,
            section_count,
            original_score: score,
            filename_relevance,
            match_type,
            page: section.page,
        });
    }

    rerank(rerank_candidates, query_tokens, options.max_refs)
}

fn is_general_query(tokens_all: &[String]) -> bool {
    tokens_all.len() <= GENERAL_QUERY_MAX_TOKENS
        && tokens_all.iter().all(|t| t.chars().count() <= GENERAL_QUERY_MAX_TOKEN_LEN)
}

fn general_query_results(
    documents: &[NormalizedDocument],
    index: &InvertedIndex,
    options: RetrievalOptions,
) -> Vec<RetrievalResult> {
    use docqa_core::{truncate_excerpt, MAX_EXCERPT_CHARS};

    let mut results = Vec::new();
    'docs: for doc in documents {
        let mut taken = 0;
        for section_id in &doc.section_ids {
            if taken >= GENERAL_QUERY_SECTIONS_PER_DOC {
                break;
            }
            if let Some(section) = index.section(section_id) {
                results.push(RetrievalResult {
                    section_id: section.section_id,
                    document_id: section.document_id,
                    filename: section.filename,
                    excerpt: truncate_excerpt(&section.original_text, MAX_EXCERPT_CHARS),
                    relevance_score: GENERAL_QUERY_SCORE,
                    match_type: MatchType::Partial,
                    page: section.page,
                });
                taken += 1;
            }
            if results.len() >= options.max_refs {
                break 'docs;
            }
        }
    }
    results.truncate(options.max_refs);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::{Confidence, DocType, FileType, Section, SCHEMA_VERSION};
    use std::collections::HashMap as StdHashMap;

    fn section(id: &str, doc_id: &str, ordinal: usize, text: &str) -> Section {
        let n = docqa_text::normalize(text);
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
    fn empty_query_returns_empty() {
        let index = InvertedIndex::empty();
        let result = retrieve("   ", &[], &index, &Intent::default_document(), RetrievalOptions::default());
        assert!(result.is_empty());
    }

    #[test]
    fn content_match_surfaces_section() {
        let sections = vec![section("s1", "d1", 0, "bu fatura odeme detaylarini ve kdv tutarini icerir ayrintili")];
        let documents = vec![document("d1", "rapor.pdf", vec!["s1"])];
        let index = InvertedIndex::build(&sections, &documents);

        let results = retrieve(
            "fatura odeme detaylari",
            &documents,
            &index,
            &Intent::default_document(),
            RetrievalOptions::default(),
        );
        assert!(!results.is_empty());
        assert_eq!(results[0].section_id, "s1");
    }

    #[test]
    fn filename_only_match_surfaces_weak_content() {
        let sections = vec![section("s1", "d1", 0, "tamamen alakasiz bir icerik metni")];
        let documents = vec![document("d1", "photobox_kurulum_kilavuzu.pdf", vec!["s1"])];
        let index = InvertedIndex::build(&sections, &documents);

        let results = retrieve(
            "photobox kurulum",
            &documents,
            &index,
            &Intent::default_document(),
            RetrievalOptions::default(),
        );
        assert!(!results.is_empty());
        assert_eq!(results[0].match_type, MatchType::Filename);
    }

    #[test]
    fn general_query_bypasses_scoring() {
        let sections = vec![
            section("s1", "d1", 0, "ilk bolum metni"),
            section("s2", "d1", 1, "ikinci bolum metni"),
        ];
        let documents = vec![document("d1", "belge.pdf", vec!["s1", "s2"])];
        let index = InvertedIndex::build(&sections, &documents);

        let results = retrieve("ne var", &documents, &index, &Intent::default_document(), RetrievalOptions::default());
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.relevance_score == GENERAL_QUERY_SCORE));
    }

    #[test]
    fn stacked_bonuses_never_exceed_one() {
        let text = "fatura tutari 1234 tl odenecek";
        let sections = vec![section("s1", "d1", 0, text)];
        let documents = vec![document("d1", "fatura_tutari.pdf", vec!["s1"])];
        let index = InvertedIndex::build(&sections, &documents);

        let intent = Intent { kind: IntentKind::Document, confidence: 0.9, payload: None };
        let results = retrieve("fatura tutari ne kadar", &documents, &index, &intent, RetrievalOptions::default());
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.relevance_score <= 1.0));
    }

    #[test]
    fn no_candidates_returns_empty() {
        let documents = vec![document("d1", "belge.pdf", vec!["s1"])];
        let index = InvertedIndex::empty();
        let results = retrieve(
            "hic eslesmeyen uzun sorgu metni",
            &documents,
            &index,
            &Intent::default_document(),
            RetrievalOptions::default(),
        );
        assert!(results.is_empty());
    }
}
