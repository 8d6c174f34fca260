//! Classifier (C4), Canonicalizer (C5), and Summarizer (C6): the ingest-time
//! pipeline that turns a `RawDocument` into a validated `NormalizedDocument`.

pub mod canonicalizer;
pub mod classifier;
pub mod summarizer;

pub use canonicalizer::{canonicalize, CanonicalizerInput};
pub use classifier::{classify, ClassificationResult, ClassifyMethod};
pub use summarizer::summarize;

use std::time::Duration;

use docqa_core::{EmbeddingClient, LanguageModel, NormalizedDocument, ProcessingLogEntry, RawDocument, Result};

/// Calls the embedding service with the document's `source_sample` (§6:
/// "embedding service (ingest only)"). On failure, ingest still proceeds —
/// `embedding` stays `null` and the document is flagged for human review,
/// per the documented failure mode.
async fn embed_document(doc: &mut NormalizedDocument, embedding_client: &dyn EmbeddingClient, timeout: Duration) {
    let call = embedding_client.embed(std::slice::from_ref(&doc.source_sample));
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(batch)) => match batch.embeddings.into_iter().next() {
            Some(vector) => {
                doc.embedding = Some(vector);
                doc.embedding_model = Some(batch.model);
            }
            None => {
                doc.embedding = None;
                doc.needs_human_review = true;
                doc.processing_log.push(ProcessingLogEntry::degraded("embed", "embedding service returned no vector"));
            }
        },
        Ok(Err(e)) => {
            doc.embedding = None;
            doc.needs_human_review = true;
            doc.processing_log.push(ProcessingLogEntry::degraded("embed", format!("embedding call failed: {e}")));
        }
        Err(_) => {
            doc.embedding = None;
            doc.needs_human_review = true;
            doc.processing_log.push(ProcessingLogEntry::degraded("embed", "embedding call timed out"));
        }
    }
}

/// Runs Numeric/Table Extraction, Classification, Canonicalization,
/// embedding, and Summarization over one raw document, in that order —
/// mirroring the control flow named in §2 ("C3 → C4 → C5 → C6 → embedding
/// service → C7") and §4.4-§4.6.
pub async fn ingest_one(
    raw: &RawDocument,
    embedding_client: &dyn EmbeddingClient,
    embed_timeout: Duration,
    llm: &dyn LanguageModel,
) -> Result<NormalizedDocument> {
    let section_extractions = docqa_extract::extract_document(&raw.sections);
    let detected_tables = docqa_extract::extract_tables(raw.file_type, &raw.sections);
    let all_ids: Vec<_> = section_extractions.iter().flat_map(|e| e.ids.clone()).collect();

    let classification = classifier::classify(raw, &all_ids, llm).await;

    let mut doc = canonicalizer::canonicalize(CanonicalizerInput {
        raw,
        classification: &classification,
        section_extractions: &section_extractions,
        detected_tables: &detected_tables,
    })?;

    embed_document(&mut doc, embedding_client, embed_timeout).await;

    doc.summary = Some(summarizer::summarize(&doc, llm).await);
    Ok(doc)
}
