// Text Processing Service
// Tokenization and small statistics helpers shared by the text heuristics

use std::collections::{HashMap, HashSet};

/// Whitespace-split words (punctuation stays attached).
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Sentence fragments split on `.`, `!` and `?`, trimmed, empties dropped.
///
/// Deliberately naive: abbreviations and decimals split too.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lowercase with everything but letters, digits and apostrophes removed.
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '\'')
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn normalized_words(text: &str) -> Vec<String> {
    split_words(text)
        .into_iter()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Unique normalized words over total whitespace words.
pub fn type_token_ratio(text: &str) -> f64 {
    let total = split_words(text).len();
    if total == 0 {
        return 0.0;
    }
    let unique: HashSet<String> = normalized_words(text).into_iter().collect();
    unique.len() as f64 / total as f64
}

/// Word count of each sentence.
pub fn sentence_lengths(text: &str) -> Vec<f64> {
    split_sentences(text)
        .iter()
        .map(|s| s.split_whitespace().count() as f64)
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Share of all words taken by the `n` most frequent normalized words.
pub fn top_word_concentration(text: &str, n: usize) -> f64 {
    let words = normalized_words(text);
    if words.is_empty() {
        return 0.0;
    }
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for w in &words {
        *freq.entry(w.as_str()).or_insert(0) += 1;
    }
    let mut counts: Vec<usize> = freq.into_values().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    let top: usize = counts.iter().take(n).sum();
    top as f64 / words.len() as f64
}
