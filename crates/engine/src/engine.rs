//! The Engine: owns every long-lived collaborator (Document Store,
//! Inverted Index, section cache, Retrieval Cache, per-session Conversation
//! Memory, external LLM/embedding clients) and wires them into the ingest
//! and chat control flows named in §4 and bounded by §5.
//!
//! A `Clone`-derived handle over `Arc`'d collaborators, built up through
//! `with_*` constructors.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docqa_config::Settings;
use docqa_core::{
    ChatMeta, ChatReference, ChatRequest, ChatResponse, ConversationTurn, EmbeddingClient,
    Error, IngestResult, Intent, IntentKind, LanguageModel, RawDocument, Result,
};
use docqa_retrieval::{InvertedIndex, RetrievalCache, RetrievalOptions};
use docqa_store::{DocumentStore, JsonFilePersistence};
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::section_cache::SectionCache;
use crate::sessions::SessionStore;

const ABSOLUTE_MAX_REFS: usize = 20;

#[derive(Clone)]
pub struct Engine {
    store: DocumentStore,
    index: InvertedIndex,
    sections: Arc<SectionCache>,
    cache: Arc<RetrievalCache>,
    sessions: Arc<SessionStore>,
    embedding_client: Arc<dyn EmbeddingClient>,
    llm: Arc<dyn LanguageModel>,
    settings: Settings,
    persistence: Option<JsonFilePersistence>,
}

impl Engine {
    pub fn new(
        settings: Settings,
        embedding_client: Arc<dyn EmbeddingClient>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        let cache = Arc::new(RetrievalCache::new(
            settings.cache.cache_size,
            Duration::from_secs(settings.cache.cache_ttl_seconds),
        ));
        let sessions = Arc::new(SessionStore::new(settings.conversation.memory_turns));
        Self {
            store: DocumentStore::new(),
            index: InvertedIndex::empty(),
            sections: Arc::new(SectionCache::new()),
            cache,
            sessions,
            embedding_client,
            llm,
            settings,
            persistence: None,
        }
    }

    /// Loads the persisted Document Store (if `settings.persistence.path`
    /// is set) and rebuilds whatever the Inverted Index can from it. The
    /// section cache is never persisted (see `section_cache`), so full-text
    /// retrieval for recovered documents stays empty until they are
    /// re-ingested — only metadata/aggregate/meta-count style answers are
    /// immediately available after a restart.
    pub async fn bootstrap(
        settings: Settings,
        embedding_client: Arc<dyn EmbeddingClient>,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let mut engine = Self::new(settings.clone(), embedding_client, llm);
        if let Some(path) = settings.persistence.path.clone() {
            let persistence = JsonFilePersistence::new(path);
            let store = persistence.load().await?;
            engine.store = store;
            engine.persistence = Some(persistence);
            engine.rebuild_index();
        }
        Ok(engine)
    }

    pub fn with_persistence(mut self, persistence: JsonFilePersistence) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn corpus_version(&self) -> docqa_core::CorpusVersion {
        self.store.version()
    }

    fn rebuild_index(&self) {
        let documents = self.store.list(false);
        let active: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        let sections: Vec<_> =
            self.sections.all().into_iter().filter(|s| active.contains(s.document_id.as_str())).collect();
        self.index.rebuild(&sections, &documents);
        self.cache.clear();
    }

    async fn persist(&self) {
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save(&self.store).await {
                error!(error = %e, "failed to persist document store after ingest");
            }
        }
    }

    /// Ingest (§4.1-§4.7, §5.1): runs the Classifier/Canonicalizer/
    /// Summarizer pipeline for every document concurrently via a
    /// `JoinSet`, so one document's rejection never blocks its siblings.
    pub async fn ingest_batch(&self, raw_documents: Vec<RawDocument>) -> Vec<IngestResult> {
        let embed_timeout = Duration::from_millis(self.settings.external.embed_timeout_ms);
        let mut join_set = JoinSet::new();
        for raw in raw_documents {
            let llm = self.llm.clone();
            let embedding_client = self.embedding_client.clone();
            join_set.spawn(async move {
                let outcome = docqa_ingest::ingest_one(&raw, embedding_client.as_ref(), embed_timeout, llm.as_ref()).await;
                (raw, outcome)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((raw, Ok(doc))) => {
                    self.sections.insert_document(&doc.id, &raw.sections);
                    results.push(IngestResult {
                        document_id: doc.id.clone(),
                        needs_human_review: doc.needs_human_review,
                        processing_log: doc.processing_log.clone(),
                    });
                    self.store.insert(doc);
                }
                Ok((raw, Err(e))) => {
                    warn!(document_id = %raw.id, error = %e, "ingest rejected");
                    results.push(IngestResult::rejected(raw.id.clone(), e.to_string()));
                }
                Err(join_err) => {
                    error!(error = %join_err, "ingest task panicked");
                }
            }
        }

        self.rebuild_index();
        self.persist().await;
        results
    }

    pub async fn purge_document(&self, document_id: &str) -> Result<()> {
        self.store.purge(document_id)?;
        self.sections.remove_document(document_id);
        self.rebuild_index();
        self.persist().await;
        Ok(())
    }

    fn retrieval_options(&self) -> RetrievalOptions {
        RetrievalOptions {
            max_refs: self.settings.retrieval.max_refs.min(ABSOLUTE_MAX_REFS),
            min_score: self.settings.retrieval.min_score,
        }
    }

    /// Chat (§4.13-§4.15): Intent Router dispatch over the Retriever,
    /// Aggregator, and Answer Composer, with the Retrieval Cache consulted
    /// only on the `document` path (the other intents never touch it).
    pub async fn chat(&self, request: ChatRequest) -> ChatResponse {
        let started = Instant::now();
        let documents = self.store.list(false);
        let known_filenames: Vec<String> = documents.iter().map(|d| d.filename.clone()).collect();

        let (resolved_query, history) = self.sessions.with_memory(&request.session_id, |memory| {
            if let Some(turns) = &request.conversation_history {
                for turn in turns {
                    memory.push(turn.clone());
                }
            }
            let resolved = memory.resolve_reference(&request.query, &known_filenames);
            let history: Vec<ConversationTurn> = memory.last_n(5).into_iter().cloned().collect();
            (resolved, history)
        });

        let intent = docqa_conversation::route_intent(&resolved_query);

        let mut references = Vec::new();
        let mut numeric_values = Vec::new();
        let mut aggregates = None;

        let answer = match intent.kind {
            IntentKind::Casual => docqa_conversation::compose_casual(&resolved_query)
                .unwrap_or_else(|| "Size nasıl yardımcı olabilirim?".to_string()),
            IntentKind::MetaCount => docqa_conversation::compose_meta_count(documents.len()),
            IntentKind::MetaList => docqa_conversation::compose_meta_list(&known_filenames),
            IntentKind::Summarize => self.answer_summarize(&intent, &documents),
            IntentKind::InvoiceCount => {
                let count = documents.iter().filter(|d| d.doc_type == docqa_core::DocType::Invoice).count();
                docqa_conversation::compose_invoice_count(count)
            }
            IntentKind::InvoiceList => {
                let filenames: Vec<String> = documents
                    .iter()
                    .filter(|d| d.doc_type == docqa_core::DocType::Invoice)
                    .map(|d| d.filename.clone())
                    .collect();
                docqa_conversation::compose_invoice_list(&filenames)
            }
            IntentKind::Aggregate => {
                let (text, result) = self.answer_aggregate(&resolved_query, &documents);
                aggregates = result;
                text
            }
            IntentKind::Document => {
                let retrieval = self.retrieve_with_cache(&resolved_query, &documents, &intent);
                numeric_values = retrieval
                    .iter()
                    .flat_map(|r| docqa_extract::extract_amounts(&r.excerpt, &r.section_id))
                    .map(|a| a.value.to_string())
                    .collect::<std::collections::BTreeSet<_>>()
                    .into_iter()
                    .collect();
                references = retrieval
                    .iter()
                    .map(|r| ChatReference {
                        filename: r.filename.clone(),
                        excerpt: r.excerpt.clone(),
                        relevance_score: r.relevance_score,
                        page: r.page,
                    })
                    .collect();
                let llm_timeout = Duration::from_millis(self.settings.external.llm_timeout_ms);
                docqa_conversation::compose_document(
                    &resolved_query,
                    &retrieval,
                    &history,
                    self.llm.as_ref(),
                    llm_timeout,
                )
                .await
            }
        };

        self.sessions.with_memory(&request.session_id, |memory| {
            memory.push(ConversationTurn::user(request.query.clone()));
            memory.push(ConversationTurn::assistant(answer.clone()));
        });

        ChatResponse {
            answer,
            meta: ChatMeta {
                intent: Some(intent.kind),
                query_type: Some(intent_label(intent.kind).to_string()),
                references,
                numeric_values,
                aggregates,
                confidence: intent.confidence,
            },
            model_meta: docqa_core::ModelMeta {
                model: self.llm.model_name().to_string(),
                latency_ms: started.elapsed().as_millis() as u64,
            },
        }
    }

    fn retrieve_with_cache(
        &self,
        query: &str,
        documents: &[docqa_core::NormalizedDocument],
        intent: &Intent,
    ) -> Vec<docqa_core::RetrievalResult> {
        let version = self.store.version();
        if let Some(cached) = self.cache.get(query, version) {
            return cached;
        }
        let computed = docqa_retrieval::retrieve(query, documents, &self.index, intent, self.retrieval_options());
        self.cache.put(query, version, computed.clone());
        computed
    }

    fn answer_summarize(&self, intent: &Intent, documents: &[docqa_core::NormalizedDocument]) -> String {
        let target = intent
            .payload
            .as_deref()
            .and_then(|payload| documents.iter().find(|d| d.filename.eq_ignore_ascii_case(payload)));
        let summary_text = target.and_then(|d| d.summary.as_ref()).map(|s| s.text.as_str());
        docqa_conversation::compose_summarize(summary_text)
    }

    fn answer_aggregate(
        &self,
        query: &str,
        documents: &[docqa_core::NormalizedDocument],
    ) -> (String, Option<docqa_core::AggregateResult>) {
        let Some(plan) = docqa_aggregate::parse_plan(query) else {
            return ("Bu hesaplamayı anlayamadım.".to_string(), None);
        };
        match docqa_aggregate::aggregate(documents, &plan) {
            Ok(result) => {
                let text = docqa_conversation::compose_aggregate(&result);
                (text, Some(result))
            }
            Err(Error::MixedCurrency { breakdown }) => {
                let parts: Vec<String> =
                    breakdown.iter().map(|(currency, amount)| format!("{amount} {currency}")).collect();
                (format!("Birden fazla para birimi bulundu, toplamlar ayrı: {}", parts.join(", ")), None)
            }
            Err(e) => (format!("Bu hesaplamayı yapamadım: {e}"), None),
        }
    }
}

fn intent_label(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::Casual => "casual",
        IntentKind::MetaCount => "meta_count",
        IntentKind::MetaList => "meta_list",
        IntentKind::Summarize => "summarize",
        IntentKind::InvoiceCount => "invoice_count",
        IntentKind::InvoiceList => "invoice_list",
        IntentKind::Aggregate => "aggregate",
        IntentKind::Document => "document",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docqa_core::{FileType, GenerateOptions, RawSection};
    use docqa_llm::NullEmbeddingClient;

    struct EchoLlm;

    #[async_trait]
    impl LanguageModel for EchoLlm {
        async fn generate(&self, _prompt: &str, _options: GenerateOptions) -> Result<String> {
            Ok("other\n0.9".to_string())
        }
        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn engine() -> Engine {
        Engine::new(
            Settings::default(),
            Arc::new(NullEmbeddingClient::new(8)),
            Arc::new(EchoLlm),
        )
    }

    fn raw_doc(id: &str, filename: &str, content: &str) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            filename: filename.to_string(),
            file_type: FileType::Pdf,
            sections: vec![RawSection {
                id: format!("{id}-s1"),
                content: content.to_string(),
                page: None,
                sheet: None,
            }],
            metadata: std::collections::HashMap::new(),
        }
    }

    #[tokio::test]
    async fn ingest_then_meta_count_reflects_corpus_size() {
        let engine = engine();
        let results = engine
            .ingest_batch(vec![raw_doc("d1", "rapor.pdf", "genel bir rapor metni icerigi")])
            .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].needs_human_review);

        let response = engine
            .chat(ChatRequest { session_id: "s1".to_string(), query: "kaç belge var".to_string(), conversation_history: None })
            .await;
        assert!(response.answer.contains('1'));
        assert_eq!(response.meta.intent, Some(IntentKind::MetaCount));
    }

    #[tokio::test]
    async fn ingest_then_document_query_surfaces_reference() {
        let engine = engine();
        engine
            .ingest_batch(vec![raw_doc(
                "d1",
                "rapor.pdf",
                "bu rapor odeme kosullarini ve teslimat takvimini detayli olarak aciklar",
            )])
            .await;

        let response = engine
            .chat(ChatRequest {
                session_id: "s1".to_string(),
                query: "odeme kosullari nedir".to_string(),
                conversation_history: None,
            })
            .await;
        assert_eq!(response.meta.intent, Some(IntentKind::Document));
        assert!(!response.meta.references.is_empty());
    }

    #[tokio::test]
    async fn purge_removes_document_from_corpus() {
        let engine = engine();
        engine.ingest_batch(vec![raw_doc("d1", "rapor.pdf", "icerik metni")]).await;
        assert_eq!(engine.store.list(false).len(), 1);

        engine.purge_document("d1").await.unwrap();
        assert!(engine.store.list(false).is_empty());
    }

    #[tokio::test]
    async fn unknown_session_starts_with_empty_memory() {
        let engine = engine();
        assert_eq!(engine.sessions.session_count(), 0);
        let _ = engine
            .chat(ChatRequest { session_id: "fresh".to_string(), query: "merhaba".to_string(), conversation_history: None })
            .await;
        assert_eq!(engine.sessions.session_count(), 1);
    }
}
