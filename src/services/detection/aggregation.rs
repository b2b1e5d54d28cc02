// Aggregation Logic
// Collapses breakdown entries into one score, deduplicates warnings, assigns a verdict

use std::collections::HashSet;

use crate::models::{SignalResult, Verdict};

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateScore {
    pub overall_score: i32,
    pub verdict: Verdict,
    pub breakdown: Vec<SignalResult>,
    pub warnings: Vec<String>,
}

/// Unweighted mean of the breakdown scores, rounded half away from zero.
/// An empty breakdown scores 0; the pipelines never produce one.
pub fn overall_score(breakdown: &[SignalResult]) -> i32 {
    if breakdown.is_empty() {
        return 0;
    }
    let sum: i32 = breakdown.iter().map(|s| s.score).sum();
    (sum as f64 / breakdown.len() as f64).round() as i32
}

/// Exact-string dedup keeping first-appearance order.
pub fn dedup_warnings(warnings: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    warnings
        .into_iter()
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

pub fn aggregate(breakdown: Vec<SignalResult>, warnings: Vec<String>) -> AggregateScore {
    let overall = overall_score(&breakdown);
    AggregateScore {
        overall_score: overall,
        verdict: Verdict::from_score(overall),
        breakdown,
        warnings: dedup_warnings(warnings),
    }
}

/// Score of the first breakdown entry named `name`.
pub fn find_score(breakdown: &[SignalResult], name: &str) -> Option<i32> {
    breakdown.iter().find(|s| s.name == name).map(|s| s.score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(scores: &[i32]) -> Vec<SignalResult> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| SignalResult::new(format!("s{}", i), *s))
            .collect()
    }

    #[test]
    fn test_mean_of_one_three_five() {
        assert_eq!(overall_score(&results(&[63])), 63);
        assert_eq!(overall_score(&results(&[70, 80, 91])), 80); // 80.33
        assert_eq!(overall_score(&results(&[10, 20, 30, 40, 51])), 30); // 30.2
    }

    #[test]
    fn test_mean_rounds_half_up() {
        assert_eq!(overall_score(&results(&[70, 71])), 71);
        assert_eq!(overall_score(&results(&[40, 41])), 41);
    }

    #[test]
    fn test_empty_breakdown_scores_zero() {
        assert_eq!(overall_score(&[]), 0);
    }

    #[test]
    fn test_dedup_preserves_first_order() {
        let w = vec!["b".to_string(), "a".to_string(), "b".to_string(), "c".to_string(), "a".to_string()];
        assert_eq!(dedup_warnings(w), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_aggregate_assigns_verdict() {
        let agg = aggregate(results(&[90, 60]), vec!["x".to_string(), "x".to_string()]);
        assert_eq!(agg.overall_score, 75);
        assert_eq!(agg.verdict, Verdict::Authentic);
        assert_eq!(agg.warnings, vec!["x"]);

        assert_eq!(aggregate(results(&[40]), vec![]).verdict, Verdict::LikelyFake);
        assert_eq!(aggregate(results(&[55]), vec![]).verdict, Verdict::Suspicious);
    }

    #[test]
    fn test_find_score() {
        let b = vec![SignalResult::new("AI Detection", 30), SignalResult::new("Fact Check", 80)];
        assert_eq!(find_score(&b, "Fact Check"), Some(80));
        assert_eq!(find_score(&b, "Missing"), None);
    }
}
