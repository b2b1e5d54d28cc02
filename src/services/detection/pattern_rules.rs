// Pattern Analysis
// Declarative weighted regex rules scored by one generic scorer:
// - AI self-reference / style rules adjust "Writing Naturalness"
// - Manipulation rhetoric rules adjust "Source Credibility"

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::models::SignalResult;
use super::SignalOutput;

pub const NATURALNESS_SIGNAL: &str = "Writing Naturalness";
pub const CREDIBILITY_SIGNAL: &str = "Source Credibility";

const BASE_SCORE: i32 = 70;
const SCORE_MIN: i32 = 5;
const SCORE_MAX: i32 = 95;
const UNSOURCED_MIN_CHARS: usize = 500;

/// One rule: when `pattern` matches anywhere, add `weight` and emit `message`.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    pub pattern: &'static str,
    pub weight: i32,
    pub message: Option<&'static str>,
}

const fn rule(pattern: &'static str, weight: i32, message: Option<&'static str>) -> PatternRule {
    PatternRule { pattern, weight, message }
}

pub const AI_STYLE_RULES: &[PatternRule] = &[
    rule(r"(?i)\bas an ai(?: language model)?\b", -20, Some("Contains AI self-reference")),
    rule(
        r"(?i)\bI (?:cannot|can't|am unable to) (?:provide|assist|help with)\b",
        -15,
        Some("Contains assistant-style refusal phrasing"),
    ),
    rule(r"(?i)\bI hope this helps\b", -12, Some("Contains chatbot sign-off phrasing")),
    rule(r"(?i)\bdelv(?:e|ing) into\b", -8, Some("Uses phrasing common in AI-generated text")),
    rule(
        r"(?i)\bit is (?:important|worth) (?:to note|noting)\b",
        -8,
        Some("Uses phrasing common in AI-generated text"),
    ),
    rule(
        r"(?i)\b(?:tapestry|multifaceted|ever-evolving|testament to)\b",
        -6,
        Some("Contains vocabulary overused by language models"),
    ),
    rule(r"(?i)\bin (?:conclusion|summary)\b", -5, None),
    rule(r"(?i)\b(?:firstly|secondly|thirdly)\b", -4, None),
    rule(r"(?i)\b(?:lol|tbh|imo|gonna|wanna|kinda)\b", 5, None),
    rule(r"(?i)\b\w+'(?:t|re|ve|ll|m)\b", 3, None),
];

pub const MANIPULATION_RULES: &[PatternRule] = &[
    rule(
        r"(?i)\b(?:they don't want you to know|what the media won't tell you)\b",
        -20,
        Some("Contains conspiracy-style framing"),
    ),
    rule(
        r"(?i)\b(?:share this|share before it's deleted|spread the word)\b",
        -15,
        Some("Urges readers to share, a common manipulation tactic"),
    ),
    rule(
        r"(?i)\b(?:doctors hate|miracle cure|one weird trick)\b",
        -15,
        Some("Contains clickbait or miracle claims"),
    ),
    rule(r"(?i)\b(?:wake up|sheeple|open your eyes)\b", -12, Some("Uses manipulative rhetoric")),
    rule(
        r"(?i)(?:100% (?:proven|true|guaranteed)|\bscientifically proven\b)",
        -10,
        Some("Overstated certainty claims"),
    ),
    rule(r"\b[A-Z]{4,}(?:\s+[A-Z]{4,}){2,}\b", -8, Some("Extended all-caps phrasing")),
    rule(r"!{2,}", -5, Some("Excessive exclamation marks")),
];

/// Source attribution cues that raise credibility.
pub const ATTRIBUTION_RULES: &[PatternRule] = &[
    rule(
        r"(?i)\b(?:according to|published in|reported by|researchers (?:found|showed)|a study (?:by|in|found)|cited by|source:)",
        10,
        None,
    ),
    rule(r"https?://\S+", 5, None),
    rule(r#""[^"]{10,}""#, 5, None),
];

pub struct CompiledRule {
    regex: Regex,
    weight: i32,
    message: Option<&'static str>,
}

/// Compile a table once; a rule that fails to compile is skipped and logged.
pub fn compile_rules(rules: &[PatternRule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .filter_map(|r| match Regex::new(r.pattern) {
            Ok(regex) => Some(CompiledRule {
                regex,
                weight: r.weight,
                message: r.message,
            }),
            Err(e) => {
                warn!("[PATTERNS] skipping invalid rule {:?}: {}", r.pattern, e);
                None
            }
        })
        .collect()
}

fn ai_style_rules() -> &'static [CompiledRule] {
    static RULES: OnceLock<Vec<CompiledRule>> = OnceLock::new();
    RULES.get_or_init(|| compile_rules(AI_STYLE_RULES))
}

fn manipulation_rules() -> &'static [CompiledRule] {
    static RULES: OnceLock<Vec<CompiledRule>> = OnceLock::new();
    RULES.get_or_init(|| compile_rules(MANIPULATION_RULES))
}

fn attribution_rules() -> &'static [CompiledRule] {
    static RULES: OnceLock<Vec<CompiledRule>> = OnceLock::new();
    RULES.get_or_init(|| compile_rules(ATTRIBUTION_RULES))
}

/// Sum the weights of every matching rule onto `base`, collecting messages.
/// Returns the unclamped score.
pub fn apply_rules(text: &str, rules: &[CompiledRule], base: i32, warnings: &mut Vec<String>) -> i32 {
    let mut score = base;
    for r in rules.iter().filter(|r| r.regex.is_match(text)) {
        score += r.weight;
        if let Some(msg) = r.message {
            warnings.push(msg.to_string());
        }
    }
    score
}

pub fn analyze_patterns(text: &str) -> SignalOutput {
    let mut warnings = Vec::new();

    let naturalness = apply_rules(text, ai_style_rules(), BASE_SCORE, &mut warnings);

    let mut credibility = apply_rules(text, manipulation_rules(), BASE_SCORE, &mut warnings);
    let attributed = apply_rules(text, attribution_rules(), 0, &mut warnings);
    credibility += attributed;
    if attributed == 0 && text.chars().count() > UNSOURCED_MIN_CHARS {
        credibility -= 10;
        warnings.push("No sources cited for a lengthy claim".to_string());
    }

    SignalOutput {
        results: vec![
            SignalResult::new(NATURALNESS_SIGNAL, naturalness.clamp(SCORE_MIN, SCORE_MAX)),
            SignalResult::new(CREDIBILITY_SIGNAL, credibility.clamp(SCORE_MIN, SCORE_MAX)),
        ],
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(text: &str) -> (i32, i32, Vec<String>) {
        let out = analyze_patterns(text);
        (out.results[0].score, out.results[1].score, out.warnings)
    }

    #[test]
    fn test_all_builtin_rules_compile() {
        assert_eq!(compile_rules(AI_STYLE_RULES).len(), AI_STYLE_RULES.len());
        assert_eq!(compile_rules(MANIPULATION_RULES).len(), MANIPULATION_RULES.len());
        assert_eq!(compile_rules(ATTRIBUTION_RULES).len(), ATTRIBUTION_RULES.len());
    }

    #[test]
    fn test_invalid_rule_is_skipped() {
        let compiled = compile_rules(&[rule(r"(unclosed", -5, None), rule(r"ok", 1, None)]);
        assert_eq!(compiled.len(), 1);
    }

    #[test]
    fn test_neutral_text_keeps_base_scores() {
        let (nat, cred, warnings) = scores("The bus was late this morning so we walked to the market");
        assert_eq!(nat, 70);
        assert_eq!(cred, 70);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_ai_style_rules_accumulate() {
        let (nat, _, warnings) =
            scores("As an AI language model, I cannot provide that. It is important to note this.");
        assert_eq!(nat, 70 - 20 - 15 - 8);
        assert!(warnings.contains(&"Contains AI self-reference".to_string()));
    }

    #[test]
    fn test_manipulation_rules_lower_credibility() {
        let (_, cred, warnings) =
            scores("Wake up!! They don't want you to know about this miracle cure. Share this now");
        assert_eq!(cred, (70 - 20 - 15 - 15 - 12 - 5).clamp(5, 95));
        assert!(warnings.iter().any(|w| w.contains("manipulation tactic")));
    }

    #[test]
    fn test_attribution_raises_credibility() {
        let (_, cred, _) = scores(
            "According to the city council, repairs begin in May. Details at https://example.org/roads",
        );
        assert_eq!(cred, 85);
    }

    #[test]
    fn test_long_unsourced_text_penalized() {
        let text = "The harbor was quiet and the boats rocked gently in the grey water. ".repeat(10);
        let (_, cred, warnings) = scores(&text);
        assert_eq!(cred, 60);
        assert!(warnings.contains(&"No sources cited for a lengthy claim".to_string()));
    }

    #[test]
    fn test_scores_stay_in_band() {
        let text = "As an AI language model I cannot assist. I hope this helps. Delve into the tapestry. \
                    In conclusion, firstly it is worth noting this.";
        let (nat, _, _) = scores(text);
        assert_eq!(nat, 5);
    }
}
