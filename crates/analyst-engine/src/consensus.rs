//! Opinion similarity and consensus scoring
//!
//! Agreement between opinions is measured as the Jaccard index over
//! case-normalized token sets. Round consensus is the unweighted mean over
//! all unordered pairs; the aggregator uses a confidence-weighted variant
//! so that agreement between confident participants counts for more.

use std::collections::HashSet;

use analyst_core::Opinion;

/// Case-normalized whitespace token set of an opinion's content
pub fn token_set(content: &str) -> HashSet<String> {
    content
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard similarity of two contents, in [0, 1]
///
/// Two empty contents are treated as identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let tokens_a = token_set(a);
    let tokens_b = token_set(b);

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Mean pairwise similarity over all unordered opinion pairs
///
/// 1.0 when there are fewer than two opinions: a lone voice trivially
/// agrees with itself.
pub fn mean_pairwise(opinions: &[Opinion]) -> f64 {
    pairwise(opinions, &|_, _| 1.0)
}

/// Confidence-weighted pairwise similarity
///
/// Each pair is weighted by the mean of the two confidences, so agreement
/// between confident opinions dominates agreement between hedged ones.
pub fn weighted_pairwise(opinions: &[Opinion]) -> f64 {
    pairwise(opinions, &|a, b| (a.confidence + b.confidence) / 2.0)
}

fn pairwise(opinions: &[Opinion], weight: &dyn Fn(&Opinion, &Opinion) -> f64) -> f64 {
    if opinions.len() < 2 {
        return 1.0;
    }

    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for i in 0..opinions.len() {
        for j in (i + 1)..opinions.len() {
            let w = weight(&opinions[i], &opinions[j]);
            weighted_sum += w * similarity(&opinions[i].content, &opinions[j].content);
            weight_sum += w;
        }
    }

    if weight_sum == 0.0 {
        // Every pair carried zero weight (all confidences zero); fall back
        // to the unweighted mean so the result stays in [0, 1]
        return pairwise(opinions, &|_, _| 1.0);
    }
    weighted_sum / weight_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::AgentType;
    use chrono::Utc;

    fn opinion(content: &str, confidence: f64) -> Opinion {
        Opinion::new(
            "a-1",
            AgentType::Technical,
            content,
            "",
            confidence,
            1,
            Utc::now(),
        )
    }

    #[test]
    fn test_identical_token_sets_are_fully_similar() {
        assert!((similarity("buy the dip", "BUY the DIP") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_disjoint_token_sets_have_zero_similarity() {
        assert!(similarity("buy now", "sell later").abs() < f64::EPSILON);
    }

    #[test]
    fn test_both_empty_counts_as_agreement() {
        assert!((similarity("", "  ") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_overlap() {
        // tokens: {hold, steady} vs {hold, cash} -> 1 shared of 3 total
        let sim = similarity("hold steady", "hold cash");
        assert!((sim - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_pairwise_bounds() {
        let opinions = vec![
            opinion("rates will rise", 0.9),
            opinion("rates will fall", 0.8),
            opinion("inflation is sticky", 0.7),
        ];
        let score = mean_pairwise(&opinions);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_fewer_than_two_opinions_is_full_consensus() {
        assert!((mean_pairwise(&[]) - 1.0).abs() < f64::EPSILON);
        assert!((mean_pairwise(&[opinion("alone", 0.5)]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_identical_opinions_reach_full_consensus() {
        let opinions = vec![opinion("buy on weakness", 0.9), opinion("buy on weakness", 0.6)];
        assert!((mean_pairwise(&opinions) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weighted_pairwise_prefers_confident_agreement() {
        // The confident pair agrees, the hedged one disagrees
        let agreeing = vec![
            opinion("buy growth names", 1.0),
            opinion("buy growth names", 1.0),
            opinion("sell everything immediately", 0.1),
        ];
        let weighted = weighted_pairwise(&agreeing);
        let unweighted = mean_pairwise(&agreeing);
        assert!(weighted > unweighted);
    }

    #[test]
    fn test_weighted_pairwise_zero_confidence_falls_back() {
        let opinions = vec![opinion("same text", 0.0), opinion("same text", 0.0)];
        assert!((weighted_pairwise(&opinions) - 1.0).abs() < f64::EPSILON);
    }
}
