//! Answer Composer (§4.15): priority-ordered handlers for each intent, LLM
//! prompt assembly with a strict forbid-list, and post-processing.

use once_cell::sync::Lazy;
use regex::Regex;

use docqa_core::{AggregateResult, ConversationTurn, GenerateOptions, LanguageModel, RetrievalResult};
use docqa_extract::{extract_amounts, format_number};

const MAX_PROMPT_EXCERPTS: usize = 3;
const EXCERPT_CHARS_FEW_RESULTS: usize = 800;
const EXCERPT_CHARS_MANY_RESULTS: usize = 500;
const HISTORY_TURNS_IN_PROMPT: usize = 3;
const ANSWER_TEMPERATURE: f32 = 0.1;
const ANSWER_MAX_TOKENS: u32 = 512;

const PRICE_WORDS: &[&str] = &["ne kadar", "fiyat", "tutar", "kaç para", "kac para", "ücret", "ucret"];

const CASUAL_REPLIES: &[(&[&str], &str)] = &[
    (&["merhaba", "selam", "hello", "hi"], "Merhaba! Belgeleriniz hakkında nasıl yardımcı olabilirim?"),
    (&["teşekkür", "tesekkur", "sağol", "sagol", "thanks", "thank you"], "Rica ederim!"),
    (&["yardım", "yardim", "help"], "Belgelerinizle ilgili bir soru sorabilir, özet isteyebilir ya da toplam/ortalama gibi hesaplamalar talep edebilirsiniz."),
];

static NUMBERED_LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\d+[.)]\s+").unwrap());
static MARKDOWN_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*?([^*]+)\*\*?").unwrap());
static EXTRA_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());
static NOT_FOUND_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)bulunamadı|bulunamadi|not found|no data").unwrap());

/// Rule 1: casual turns get a fixed-table reply, or `None` if the caller
/// should fall through to the LLM's "short chat" mode.
pub fn compose_casual(query: &str) -> Option<String> {
    let lower = query.to_lowercase();
    CASUAL_REPLIES
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, reply)| reply.to_string())
}

/// Rule 2: meta/invoice counts and lists — direct, deterministic, no LLM.
pub fn compose_meta_count(total: usize) -> String {
    format!("Toplam {total} belge var.")
}

pub fn compose_meta_list(filenames: &[String]) -> String {
    if filenames.is_empty() {
        return "Henüz yüklenmiş bir belge yok.".to_string();
    }
    format!("Belgeler: {}", filenames.join(", "))
}

pub fn compose_invoice_count(count: usize) -> String {
    format!("Toplam {count} fatura var.")
}

pub fn compose_invoice_list(filenames: &[String]) -> String {
    if filenames.is_empty() {
        return "Henüz yüklenmiş bir fatura yok.".to_string();
    }
    format!("Faturalar: {}", filenames.join(", "))
}

/// Rule 3: summarize — the caller passes the stored summary if present;
/// invoking the Summarizer on demand otherwise is an engine-level concern.
pub fn compose_summarize(summary_text: Option<&str>) -> String {
    summary_text.map(|s| s.to_string()).unwrap_or_else(|| "Bu belge için henüz bir özet yok.".to_string())
}

/// Rule 4: aggregate — the Aggregator's `formatted` field plus advisory
/// duplicate/outlier flags.
pub fn compose_aggregate(result: &AggregateResult) -> String {
    let mut text = result.formatted.clone();
    if !result.duplicates.is_empty() {
        text.push_str(&format!(" (Uyarı: tekrarlanan fatura no'ları: {})", result.duplicates.join(", ")));
    }
    if !result.outliers.is_empty() {
        let outliers: Vec<String> = result.outliers.iter().map(|v| v.to_string()).collect();
        text.push_str(&format!(" (Uyarı: sıra dışı değerler: {})", outliers.join(", ")));
    }
    text
}

fn is_price_shaped(query: &str) -> bool {
    let lower = query.to_lowercase();
    PRICE_WORDS.iter().any(|w| lower.contains(w))
}

fn numeric_values_in(retrieval: &[RetrievalResult]) -> Vec<String> {
    retrieval
        .iter()
        .flat_map(|r| extract_amounts(&r.excerpt, &r.section_id))
        .map(|a| match a.currency {
            Some(currency) => format!("{} {currency}", format_number(a.value)),
            None => format_number(a.value),
        })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect::<String>() + "…"
    }
}

fn build_prompt(query: &str, retrieval: &[RetrievalResult], history: &[ConversationTurn]) -> String {
    let top = &retrieval[..retrieval.len().min(MAX_PROMPT_EXCERPTS)];
    let excerpt_limit = if top.len() <= 2 { EXCERPT_CHARS_FEW_RESULTS } else { EXCERPT_CHARS_MANY_RESULTS };

    let mut prompt = String::new();
    prompt.push_str(
        "Yalnızca verilen belge alıntılarına dayanarak, en fazla 2 cümlelik, \
         sade düz metin bir yanıt ver. Numaralı liste kullanma, kalın/italik \
         biçimlendirme kullanma.\n\n",
    );
    for (i, r) in top.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}: {}\n", i + 1, r.filename, truncate(&r.excerpt, excerpt_limit)));
    }
    if !history.is_empty() {
        prompt.push_str("\nSon konuşma:\n");
        let start = history.len().saturating_sub(HISTORY_TURNS_IN_PROMPT);
        for turn in &history[start..] {
            let role = match turn.role {
                docqa_core::Role::User => "Kullanıcı",
                docqa_core::Role::Assistant => "Asistan",
            };
            prompt.push_str(&format!("{role}: {}\n", turn.content));
        }
    }
    prompt.push_str(&format!("\nSoru: {query}\n"));
    prompt
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut last = 0;
    for m in SENTENCE_END.find_iter(text) {
        let piece = text[last..m.end()].trim();
        if !piece.is_empty() {
            sentences.push(piece.to_string());
        }
        last = m.end();
    }
    let remainder = text[last..].trim();
    if !remainder.is_empty() {
        sentences.push(remainder.to_string());
    }
    sentences
}

fn post_process(response: &str) -> String {
    let no_lists = NUMBERED_LIST_MARKER.replace_all(response, "");
    let no_emphasis = MARKDOWN_EMPHASIS.replace_all(&no_lists, "$1");
    let collapsed = EXTRA_NEWLINES.replace_all(&no_emphasis, "\n\n");
    let trimmed = collapsed.trim();

    let sentences = split_sentences(trimmed);
    if sentences.len() > 2 {
        sentences[..2].join(" ")
    } else {
        trimmed.to_string()
    }
}

fn fallback_from_retrieval(retrieval: &[RetrievalResult]) -> String {
    if retrieval.is_empty() {
        return "Bu soruya cevap verebilecek bir belge bulamadım.".to_string();
    }
    let filenames: Vec<&str> = retrieval.iter().map(|r| r.filename.as_str()).collect();
    format!("İlgili belgeler: {}", filenames.join(", "))
}

/// Rule 5: the generic `document` handler.
pub async fn compose_document(
    query: &str,
    retrieval: &[RetrievalResult],
    history: &[ConversationTurn],
    llm: &dyn LanguageModel,
    llm_timeout: std::time::Duration,
) -> String {
    if retrieval.is_empty() {
        return fallback_from_retrieval(retrieval);
    }

    let values = numeric_values_in(retrieval);
    if is_price_shaped(query) && values.len() == 1 {
        let top_filename_mentioned = query.to_lowercase().contains(
            &docqa_text::strip_extension(&retrieval[0].filename).to_lowercase(),
        );
        if top_filename_mentioned {
            return values[0].clone();
        }
    }

    let prompt = build_prompt(query, retrieval, history);
    let options = GenerateOptions { temperature: ANSWER_TEMPERATURE, num_predict: ANSWER_MAX_TOKENS };

    let generated = tokio::time::timeout(llm_timeout, llm.generate(&prompt, options)).await;
    let raw = match generated {
        Ok(Ok(text)) => text,
        _ => return fallback_from_retrieval(retrieval),
    };

    let processed = post_process(&raw);

    if NOT_FOUND_PHRASE.is_match(&processed) && !retrieval.is_empty() {
        return fallback_from_retrieval(retrieval);
    }

    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docqa_core::{MatchType, Result};

    fn result(filename: &str, excerpt: &str) -> RetrievalResult {
        RetrievalResult {
            section_id: "s1".to_string(),
            document_id: "d1".to_string(),
            filename: filename.to_string(),
            excerpt: excerpt.to_string(),
            relevance_score: 0.9,
            match_type: MatchType::Exact,
            page: None,
        }
    }

    struct EchoLlm(String);

    #[async_trait]
    impl LanguageModel for EchoLlm {
        async fn generate(&self, _prompt: &str, _options: GenerateOptions) -> Result<String> {
            Ok(self.0.clone())
        }
        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn casual_reply_matches_greeting() {
        assert!(compose_casual("merhaba").is_some());
        assert!(compose_casual("sözleşmede kira bedeli").is_none());
    }

    #[test]
    fn aggregate_appends_duplicate_warning() {
        let result = AggregateResult {
            operation: docqa_core::AggregateOp::Sum,
            field: docqa_core::AggregateField::Total,
            filters: docqa_core::AggregateFilters::default(),
            count: 2,
            value: Some(rust_decimal::Decimal::new(300, 0)),
            currency: Some("TRY".to_string()),
            formatted: "300 TRY".to_string(),
            group_by: None,
            duplicates: vec!["INV1".to_string()],
            outliers: Vec::new(),
        };
        let text = compose_aggregate(&result);
        assert!(text.contains("300 TRY"));
        assert!(text.contains("INV1"));
    }

    #[test]
    fn post_process_strips_markdown_and_caps_sentences() {
        let raw = "1. **Toplam** tutar 100 TRY'dir. Ayrıca KDV dahildir. Bu üçüncü cümledir.";
        let processed = post_process(raw);
        assert!(!processed.contains('*'));
        assert!(!processed.contains("1."));
        assert_eq!(processed.matches('.').count(), 2);
    }

    #[tokio::test]
    async fn price_shaped_single_value_bypasses_llm() {
        let retrieval = vec![result("Invoice-001.pdf", "Toplam tutar 500,00 TRY")];
        let llm = EchoLlm("bulunamadı".to_string());
        let answer = compose_document(
            "invoice-001.pdf faturasının tutarı ne kadar",
            &retrieval,
            &[],
            &llm,
            std::time::Duration::from_secs(1),
        )
        .await;
        assert_eq!(answer, "500,00 TRY");
    }

    #[tokio::test]
    async fn price_shaped_bypass_keeps_currency_and_turkish_grouping() {
        let retrieval = vec![result("Invoice-13TVEI4D-0002.docx", "Total: 2.458,30 EUR")];
        let llm = EchoLlm("bulunamadı".to_string());
        let answer = compose_document(
            "invoice-13tvei4d-0002.docx tutarı ne kadar",
            &retrieval,
            &[],
            &llm,
            std::time::Duration::from_secs(1),
        )
        .await;
        assert_eq!(answer, "2.458,30 EUR");
    }

    #[tokio::test]
    async fn false_negative_guard_overrides_not_found_reply() {
        let retrieval = vec![result("Invoice-001.pdf", "Genel şartlar ve koşullar")];
        let llm = EchoLlm("Aradığınız bilgi bulunamadı.".to_string());
        let answer =
            compose_document("bu belgede ne yazıyor", &retrieval, &[], &llm, std::time::Duration::from_secs(1))
                .await;
        assert!(answer.contains("Invoice-001.pdf"));
    }
}
