//! Re-ranker (§4.10): density/filename/position/original-score weighted
//! re-scoring, trigram-Jaccard dedup, and a per-document cap.

use std::collections::BTreeSet;

use docqa_core::{truncate_excerpt, MatchType, RetrievalResult, MAX_EXCERPT_CHARS};

const MAX_SECTIONS_PER_DOCUMENT: usize = 3;
const DEDUP_TRIGRAM_THRESHOLD: f32 = 0.75;

/// One scored candidate handed to the re-ranker by the Retriever.
pub struct RerankCandidate {
    pub section_id: String,
    pub document_id: String,
    pub filename: String,
    pub raw_text: String,
    pub token_set: BTreeSet<String>,
    pub trigram_set: BTreeSet<String>,
    pub ordinal: usize,
    pub section_count: usize,
    pub original_score: f32,
    pub filename_relevance: f32,
    pub match_type: MatchType,
    pub page: Option<u32>,
}

fn jaccard<T: Eq + std::hash::Hash + Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f32 {
    if a.is_empty() && b.is_empty() {
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

fn density(candidate_tokens: &BTreeSet<String>, query_tokens: &BTreeSet<String>) -> f32 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let present = query_tokens.intersection(candidate_tokens).count();
    present as f32 / query_tokens.len() as f32
}

fn position(ordinal: usize, section_count: usize) -> f32 {
    if section_count == 0 {
        return 0.0;
    }
    1.0 - (ordinal as f32 / section_count as f32)
}

/// Re-ranks, deduplicates, and caps candidates, returning at most
/// `max_refs` results ordered descending by `rerank_score`.
pub fn rerank(candidates: Vec<RerankCandidate>, query_tokens: &BTreeSet<String>, max_refs: usize) -> Vec<RetrievalResult> {
    let mut scored: Vec<(f32, RerankCandidate)> = candidates
        .into_iter()
        .map(|c| {
            let d = density(&c.token_set, query_tokens);
            let p = position(c.ordinal, c.section_count);
            let score = (0.1 * c.original_score + 0.3 * d + 0.4 * c.filename_relevance + 0.2 * p).clamp(0.0, 1.0);
            (score, c)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<(f32, RerankCandidate)> = Vec::new();
    let mut per_document: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for (score, candidate) in scored {
        let count = per_document.get(&candidate.document_id).copied().unwrap_or(0);
        if count >= MAX_SECTIONS_PER_DOCUMENT {
            continue;
        }
        let too_similar = kept
            .iter()
            .any(|(_, k)| jaccard(&k.trigram_set, &candidate.trigram_set) >= DEDUP_TRIGRAM_THRESHOLD);
        if too_similar {
            continue;
        }
        per_document.entry(candidate.document_id.clone()).and_modify(|c| *c += 1).or_insert(1);
        kept.push((score, candidate));
        if kept.len() >= max_refs {
            break;
        }
    }

    kept.into_iter()
        .map(|(score, c)| RetrievalResult {
            section_id: c.section_id,
            document_id: c.document_id,
            filename: c.filename,
            excerpt: truncate_excerpt(&c.raw_text, MAX_EXCERPT_CHARS),
            relevance_score: score,
            match_type: c.match_type,
            page: c.page,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, doc: &str, ordinal: usize, score: f32, trigrams: &[&str]) -> RerankCandidate {
        RerankCandidate {
            section_id: id.to_string(),
            document_id: doc.to_string(),
            filename: format!("{doc}.pdf"),
            raw_text: format!("content of {id}"),
            token_set: BTreeSet::new(),
            trigram_set: trigrams.iter().map(|t| t.to_string()).collect(),
            ordinal,
            section_count: 4,
            original_score: score,
            filename_relevance: 0.0,
            match_type: MatchType::Partial,
            page: None,
        }
    }

    #[test]
    fn caps_sections_per_document() {
        let candidates = (0..5)
            .map(|i| candidate(&format!("s{i}"), "d1", i, 0.9, &[&format!("tri{i}")]))
            .collect();
        let result = rerank(candidates, &BTreeSet::new(), 10);
        assert_eq!(result.len(), MAX_SECTIONS_PER_DOCUMENT);
    }

    #[test]
    fn dedups_near_identical_trigram_sets() {
        let shared = ["a b c", "b c d", "c d e"];
        let candidates = vec![
            candidate("s1", "d1", 0, 0.9, &shared),
            candidate("s2", "d2", 0, 0.8, &shared),
        ];
        let result = rerank(candidates, &BTreeSet::new(), 10);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].section_id, "s1");
    }

    #[test]
    fn rerank_score_never_exceeds_one() {
        let mut query_tokens = BTreeSet::new();
        query_tokens.insert("a".to_string());
        let mut c = candidate("s1", "d1", 0, 1.5, &["a b c"]);
        c.token_set.insert("a".to_string());
        c.filename_relevance = 1.0;
        let result = rerank(vec![c], &query_tokens, 10);
        assert!(result[0].relevance_score <= 1.0);
    }

    #[test]
    fn respects_max_refs() {
        let candidates = (0..3)
            .map(|i| candidate(&format!("s{i}"), &format!("d{i}"), 0, 0.5, &[&format!("u{i}")]))
            .collect();
        let result = rerank(candidates, &BTreeSet::new(), 2);
        assert_eq!(result.len(), 2);
    }
}
