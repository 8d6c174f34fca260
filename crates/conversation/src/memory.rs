//! Conversation Memory (§4.14): a bounded per-session ring of recent turns,
//! plus pronoun resolution against recently mentioned filenames.

use std::collections::VecDeque;

use docqa_core::ConversationTurn;

use docqa_extract::extract_ids;
use docqa_text::{filename_to_text, normalize, strip_extension};

const DEFAULT_CAPACITY: usize = 10;
const LOOKBACK_TURNS: usize = 5;
const SIGNIFICANT_TOKEN_LEN: usize = 5;

const PRONOUNS: &[&str] = &["bu", "o", "su"];

/// Single-owner, per-session ring buffer (§5: "no cross-session sharing").
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ConversationMemory {
    pub fn new(capacity: usize) -> Self {
        Self { turns: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn turns(&self) -> &VecDeque<ConversationTurn> {
        &self.turns
    }

    /// Last `n` turns, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<&ConversationTurn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).collect()
    }

    /// Rewrites `query` per §4.14: if it opens with a bare pronoun and a
    /// recently mentioned filename can be found, substitute it in. Returns
    /// the query unchanged otherwise.
    pub fn resolve_reference(&self, query: &str, known_filenames: &[String]) -> String {
        let normalized = normalize(query);
        let Some(first_token) = normalized.tokens_all.first() else {
            return query.to_string();
        };
        if !PRONOUNS.contains(&first_token.as_str()) {
            return query.to_string();
        }

        let recent: Vec<&ConversationTurn> =
            self.turns.iter().rev().take(LOOKBACK_TURNS).collect();

        let Some(filename) = find_mentioned_filename(&recent, known_filenames) else {
            return query.to_string();
        };

        if introduces_novel_token(&normalized.tokens_all, &recent) {
            return query.to_string();
        }

        replace_leading_pronoun(query, first_token, &filename)
    }
}

fn find_mentioned_filename(recent: &[&ConversationTurn], known_filenames: &[String]) -> Option<String> {
    for turn in recent {
        let content_lower = turn.content.to_lowercase();

        // Strategy 1: exact filename.
        if let Some(name) = known_filenames.iter().find(|f| content_lower.contains(&f.to_lowercase())) {
            return Some(name.clone());
        }

        // Strategy 2: filename without extension.
        if let Some(name) = known_filenames
            .iter()
            .find(|f| content_lower.contains(&strip_extension(f).to_lowercase()))
        {
            return Some(name.clone());
        }

        // Strategy 3: ID-pattern substring (e.g. "Invoice-13TVEI4D" inside a
        // longer filename's canonical form).
        let turn_ids = extract_ids(&turn.content, "memory");
        if let Some(name) = known_filenames.iter().find(|f| {
            let canonical_filename: String =
                f.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_uppercase();
            turn_ids.iter().any(|id| !id.canonical.is_empty() && canonical_filename.contains(&id.canonical))
        }) {
            return Some(name.clone());
        }

        // Strategy 4: significant word (>= 5 chars) substring.
        let turn_tokens = normalize(&turn.content).tokens_all;
        if let Some(name) = known_filenames.iter().find(|f| {
            let filename_text = normalize(&filename_to_text(f)).tokens_all.join(" ");
            turn_tokens
                .iter()
                .filter(|t| t.chars().count() >= SIGNIFICANT_TOKEN_LEN)
                .any(|t| filename_text.contains(t.as_str()))
        }) {
            return Some(name.clone());
        }
    }
    None
}

/// §4.14 guard: don't expand a pronoun reference if the new query carries a
/// substantive token the history never mentioned — that signals a fresh
/// search, not a follow-up.
fn introduces_novel_token(query_tokens: &[String], recent: &[&ConversationTurn]) -> bool {
    let history_text: String =
        recent.iter().map(|t| normalize(&t.content).text).collect::<Vec<_>>().join(" ");

    query_tokens
        .iter()
        .skip(1) // the leading pronoun itself
        .filter(|t| t.chars().count() >= SIGNIFICANT_TOKEN_LEN)
        .any(|t| !history_text.contains(t.as_str()))
}

fn replace_leading_pronoun(query: &str, pronoun_token: &str, filename: &str) -> String {
    let pronoun_len = pronoun_token.chars().count();
    match query.split_whitespace().next() {
        Some(first_word) if first_word.chars().count() == pronoun_len => {
            let rest = &query[first_word.len()..];
            format!("{filename}{rest}")
        }
        _ => query.to_string(),
    }
}
