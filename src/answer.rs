//! Heuristic answer synthesis.
//!
//! Scores document sentences by keyword overlap with the user's question and
//! assembles a templated answer from the best matches. Pure and fully
//! deterministic: identical inputs yield byte-identical output, and no input
//! (empty text, empty question, huge text) can make it fail.
//!
//! Known quirk, kept deliberately: keyword matching is plain substring
//! matching without word boundaries, so "art" also scores inside "start".

use crate::config::AnswerConfig;

/// Fixed reply when no sentence scores above zero.
pub const NO_MATCH_ANSWER: &str = "I could not find anything in this document \
that seems related to your question. Try rephrasing it, or ask about a \
different part of the document.";

/// Appended to every real answer.
const DISCLAIMER: &str = "Note: these passages were picked by matching \
keywords from your question against the document text, not by a full AI \
model, so they may miss context.";

/// Synthesized answer plus the sentences that back it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub answer_text: String,
    /// 0 to `max_snippets` sentences, best match first.
    pub snippets: Vec<String>,
}

/// Splits `text` into sentences: a boundary is whitespace immediately
/// following `.`, `!`, or `?`. Each sentence is normalized by collapsing
/// whitespace runs to single spaces; empty results are dropped.
///
/// Deliberately naive: abbreviations, decimals, and quoted punctuation are
/// not special-cased.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut after_terminal = false;

    for ch in text.chars() {
        if after_terminal && ch.is_whitespace() {
            push_normalized(&mut sentences, &current);
            current.clear();
            after_terminal = false;
            continue;
        }
        current.push(ch);
        after_terminal = matches!(ch, '.' | '!' | '?');
    }
    push_normalized(&mut sentences, &current);
    sentences
}

fn push_normalized(sentences: &mut Vec<String>, raw: &str) {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalized.is_empty() {
        sentences.push(normalized);
    }
}

/// Extracts question keywords: lower-cased maximal alphanumeric runs of at
/// least `min_keyword_chars` characters, deduplicated in first-seen order,
/// capped at `max_keywords`.
pub fn extract_keywords(question: &str, limits: &AnswerConfig) -> Vec<String> {
    let lower = question.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();
    for run in lower.split(|c: char| !c.is_alphanumeric()) {
        if run.chars().count() < limits.min_keyword_chars {
            continue;
        }
        if keywords.iter().any(|k| k.as_str() == run) {
            continue;
        }
        keywords.push(run.to_string());
        if keywords.len() == limits.max_keywords {
            break;
        }
    }
    keywords
}

/// Scores one sentence: non-overlapping occurrence count per keyword, with
/// occurrences of keywords longer than `long_keyword_chars` counting double.
fn score_sentence(sentence: &str, keywords: &[String], limits: &AnswerConfig) -> usize {
    let lower = sentence.to_lowercase();
    keywords
        .iter()
        .map(|keyword| {
            let occurrences = lower.matches(keyword.as_str()).count();
            let weight = if keyword.chars().count() > limits.long_keyword_chars {
                2
            } else {
                1
            };
            occurrences * weight
        })
        .sum()
}

/// Ranks pre-split sentences against the question and builds the answer.
/// Zero-score sentences are dropped; the rest are sorted by descending score
/// with original order preserved on ties, and the top `max_snippets` win.
pub fn answer_from_sentences(
    question: &str,
    sentences: &[String],
    limits: &AnswerConfig,
) -> AnswerResult {
    let keywords = extract_keywords(question, limits);

    let mut scored: Vec<(usize, &String)> = sentences
        .iter()
        .map(|s| (score_sentence(s, &keywords, limits), s))
        .filter(|(score, _)| *score > 0)
        .collect();
    // Stable sort: ties keep their original sentence order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(limits.max_snippets);

    if scored.is_empty() {
        return AnswerResult {
            answer_text: NO_MATCH_ANSWER.to_string(),
            snippets: Vec::new(),
        };
    }

    let snippets: Vec<String> = scored.iter().map(|(_, s)| (*s).clone()).collect();
    let mut answer_text =
        String::from("Here is what I found in the document that seems most relevant:\n\n");
    for snippet in &snippets {
        answer_text.push_str("- ");
        answer_text.push_str(snippet);
        answer_text.push('\n');
    }
    answer_text.push('\n');
    answer_text.push_str(DISCLAIMER);

    AnswerResult {
        answer_text,
        snippets,
    }
}

/// Convenience entry point: split, rank, and answer in one call.
pub fn synthesize(question: &str, text: &str, limits: &AnswerConfig) -> AnswerResult {
    let sentences = split_sentences(text);
    answer_from_sentences(question, &sentences, limits)
}
