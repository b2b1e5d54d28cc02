// Text Heuristics
// Local statistical scoring of text:
// - lexical fallback: stands in for the remote AI detector when it is unavailable
// - linguistic diversity: vocabulary and sentence-length variation, always runs

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{Level, SignalResult};
use crate::services::text_processor::{
    sentence_lengths, split_sentences, split_words, std_dev, top_word_concentration,
    type_token_ratio, variance,
};
use super::SignalOutput;

pub const DIVERSITY_SIGNAL: &str = "Linguistic Diversity";

const FALLBACK_BASE: i32 = 75;
const FALLBACK_MIN: i32 = 5;
const FALLBACK_MAX: i32 = 95;

const UNIFORM_VARIANCE: f64 = 15.0;
const FORMAL_LIMIT: usize = 3;
const LOW_TTR: f64 = 0.4;
const SENSATIONAL_LIMIT: usize = 2;
const ABSOLUTE_LIMIT: usize = 5;

const FORMAL_PHRASES: &[&str] = &[
    "furthermore",
    "moreover",
    "additionally",
    "consequently",
    "nevertheless",
    "in conclusion",
    "in summary",
    "it is important to note",
    "it is worth noting",
    "delve into",
    "in today's world",
    "plays a crucial role",
];

const SENSATIONAL_PHRASES: &[&str] = &[
    "shocking",
    "you won't believe",
    "breaking",
    "unbelievable",
    "miracle",
    "exposed",
    "outrageous",
    "mind-blowing",
    "bombshell",
    "must see",
    "urgent",
    "secret they",
];

const ABSOLUTE_WORDS: &[&str] = &[
    "always",
    "never",
    "everyone",
    "nobody",
    "all",
    "none",
    "every",
    "completely",
    "totally",
    "absolutely",
    "definitely",
    "guaranteed",
];

/// Case-insensitive whole-word alternation over a phrase list.
fn phrase_regex(phrases: &[&str]) -> Option<Regex> {
    let alternation = phrases
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).ok()
}

fn count_matches(re: &'static OnceLock<Option<Regex>>, phrases: &[&str], text: &str) -> usize {
    re.get_or_init(|| phrase_regex(phrases))
        .as_ref()
        .map_or(0, |r| r.find_iter(text).count())
}

fn formal_count(text: &str) -> usize {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    count_matches(&RE, FORMAL_PHRASES, text)
}

fn sensational_count(text: &str) -> usize {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    count_matches(&RE, SENSATIONAL_PHRASES, text)
}

fn absolute_count(text: &str) -> usize {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    count_matches(&RE, ABSOLUTE_WORDS, text)
}

/// Measurements the fallback penalties are checked against.
struct TextFacts {
    sentence_lengths: Vec<f64>,
    formal: usize,
    type_token_ratio: f64,
    sensational: usize,
    absolutes: usize,
}

impl TextFacts {
    fn measure(text: &str) -> Self {
        Self {
            sentence_lengths: sentence_lengths(text),
            formal: formal_count(text),
            type_token_ratio: type_token_ratio(text),
            sensational: sensational_count(text),
            absolutes: absolute_count(text),
        }
    }
}

/// A fallback threshold check: when `check` fires, add `weight` and warn.
struct Penalty {
    check: fn(&TextFacts) -> bool,
    weight: i32,
    message: &'static str,
}

const FALLBACK_PENALTIES: &[Penalty] = &[
    Penalty {
        check: |f| f.sentence_lengths.len() >= 2 && variance(&f.sentence_lengths) < UNIFORM_VARIANCE,
        weight: -10,
        message: "Sentence lengths are unusually uniform",
    },
    Penalty {
        check: |f| f.formal > FORMAL_LIMIT,
        weight: -15,
        message: "Frequent formal transition phrases typical of AI writing",
    },
    Penalty {
        check: |f| f.type_token_ratio < LOW_TTR,
        weight: -10,
        message: "Repetitive vocabulary",
    },
    Penalty {
        check: |f| f.sensational > SENSATIONAL_LIMIT,
        weight: -20,
        message: "Sensationalist language detected, a common misinformation marker",
    },
    Penalty {
        check: |f| f.absolutes > ABSOLUTE_LIMIT,
        weight: -10,
        message: "Excessive absolute statements",
    },
];

fn triggered(text: &str) -> impl Iterator<Item = &'static Penalty> {
    let facts = TextFacts::measure(text);
    FALLBACK_PENALTIES.iter().filter(move |p| (p.check)(&facts))
}

/// Warnings of the fallback penalties the text triggers, in table order.
pub fn fallback_conditions(text: &str) -> Vec<&'static str> {
    triggered(text).map(|p| p.message).collect()
}

/// Local stand-in for the remote AI detector. Returns the clamped score and warnings.
pub fn fallback_score(text: &str) -> (i32, Vec<String>) {
    let mut score = FALLBACK_BASE;
    let mut warnings = Vec::new();
    for penalty in triggered(text) {
        score += penalty.weight;
        warnings.push(penalty.message.to_string());
    }
    (score.clamp(FALLBACK_MIN, FALLBACK_MAX), warnings)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStatistics {
    pub word_count: usize,
    pub sentence_count: usize,
    pub type_token_ratio: f64,
    /// Standard deviation of sentence length in words.
    pub burstiness: f64,
    pub top_word_concentration: f64,
}

impl TextStatistics {
    pub fn compute(text: &str) -> Self {
        let lengths = sentence_lengths(text);
        Self {
            word_count: split_words(text).len(),
            sentence_count: split_sentences(text).len(),
            type_token_ratio: type_token_ratio(text),
            burstiness: std_dev(&lengths),
            top_word_concentration: top_word_concentration(text, 10),
        }
    }

    /// Coarse stand-in for model perplexity: heavy reuse of a few words reads as predictable.
    pub fn perplexity_level(&self) -> Level {
        if self.top_word_concentration > 0.6 {
            Level::Low
        } else if self.top_word_concentration > 0.4 {
            Level::Medium
        } else {
            Level::High
        }
    }

    pub fn burstiness_level(&self) -> Level {
        if self.burstiness < 3.0 {
            Level::Low
        } else if self.burstiness < 7.0 {
            Level::Medium
        } else {
            Level::High
        }
    }

    pub fn vocabulary_score(&self) -> i32 {
        ((self.type_token_ratio * 120.0).round() as i32).min(95)
    }

    pub fn variation_score(&self) -> i32 {
        ((40.0 + self.burstiness * 10.0).round() as i32).min(95)
    }
}

pub fn analyze_diversity(text: &str) -> SignalOutput {
    let stats = TextStatistics::compute(text);
    let vocabulary = stats.vocabulary_score();
    let variation = stats.variation_score();
    let diversity = ((vocabulary + variation) as f64 / 2.0).round() as i32;

    let mut warnings = Vec::new();
    if variation < 50 {
        warnings.push("Low variation in sentence length".to_string());
    }
    if vocabulary < 50 {
        warnings.push("Limited vocabulary diversity".to_string());
    }
    if stats.burstiness < 3.0 {
        warnings.push("Low burstiness: sentence rhythm is unusually even".to_string());
    }

    SignalOutput {
        results: vec![SignalResult::new(DIVERSITY_SIGNAL, diversity)],
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 40 words, sentence lengths 4/13/6/17, no marker words.
    const NEUTRAL: &str = "We missed the bus. Rain kept falling while my brother searched his coat pockets for \
        spare coins. The driver finally waved us aboard. Later our neighbor brought soup, bread, and a \
        strange story about her cat climbing onto the roof.";

    #[test]
    fn test_neutral_text_has_no_penalties() {
        assert_eq!(split_words(NEUTRAL).len(), 40);
        assert!(fallback_conditions(NEUTRAL).is_empty());
        let (score, warnings) = fallback_score(NEUTRAL);
        assert_eq!(score, 75);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_penalties_accumulate_monotonically() {
        // Uniform five-word sentences only.
        let uniform_only = "Maple trees shade quiet lanes. Children ride bikes past gardens. \
            Bakers open shops before dawn. Rivers carry leaves toward town. Farmers sell ripe \
            pears there. Owls watch from old barns. Clouds drift over green hills. Dogs nap \
            beside warm stoves. Friends share stories after supper. Lamps glow along narrow \
            streets.";
        assert_eq!(fallback_conditions(uniform_only), vec!["Sentence lengths are unusually uniform"]);

        // Same shape, but formal, repetitive, sensational and absolute.
        let everything = "Furthermore shocking news is always true. Moreover shocking news is \
            always true. Additionally shocking news is always true. Consequently shocking news \
            is always true. Furthermore shocking news is always true. Moreover shocking news is \
            always true. Nevertheless shocking news is always true. Furthermore shocking news is \
            always true. Moreover shocking news is always true. Additionally shocking news is \
            always true.";
        assert_eq!(fallback_conditions(everything).len(), 5);

        let (uniform_score, _) = fallback_score(uniform_only);
        let (all_score, warnings) = fallback_score(everything);
        assert_eq!(uniform_score, 65);
        assert_eq!(all_score, 10);
        assert!(all_score < uniform_score);
        assert_eq!(warnings.len(), 5);
    }

    #[test]
    fn test_single_sentence_is_not_uniform() {
        assert!(fallback_conditions("Just one line without an ending").is_empty());
    }

    #[test]
    fn test_absolute_words_match_whole_words_only() {
        assert_eq!(absolute_count("really finally allowed totally all"), 2);
    }

    #[test]
    fn test_statistics_and_levels() {
        let stats = TextStatistics::compute(NEUTRAL);
        assert_eq!(stats.word_count, 40);
        assert_eq!(stats.sentence_count, 4);
        assert!(stats.burstiness > 4.0);
        assert_eq!(stats.burstiness_level(), Level::Medium);
        assert_eq!(stats.perplexity_level(), Level::High);
    }

    #[test]
    fn test_diversity_of_neutral_text() {
        let out = analyze_diversity(NEUTRAL);
        assert_eq!(out.results[0].name, DIVERSITY_SIGNAL);
        assert!(out.results[0].score >= 65);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_repetitive_text_warns() {
        let text = "go go go go. go go go go. go go go go.";
        let out = analyze_diversity(text);
        assert!(out.results[0].score < 50);
        assert!(out.warnings.contains(&"Limited vocabulary diversity".to_string()));
        assert!(out.warnings.contains(&"Low burstiness: sentence rhythm is unusually even".to_string()));
        assert_eq!(TextStatistics::compute(text).perplexity_level(), Level::Low);
    }

    #[test]
    fn test_penalty_table_checks_its_own_threshold() {
        // Three sensational hits and nothing else.
        let text = "A shocking report came out today after lunch with my aunt. It was unbelievable \
            to her and to me, and the headline called it a bombshell for the small town council.";
        assert_eq!(
            fallback_conditions(text),
            vec!["Sensationalist language detected, a common misinformation marker"]
        );
        assert_eq!(fallback_score(text).0, 55);
    }
}
