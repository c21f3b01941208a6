//! Maps ranked titles back to full article bodies.

use std::collections::HashMap;

use crate::rerank::RankedCandidate;

/// Resolve each ranked title to its article content, preserving rank order.
///
/// Titles missing from the corpus (stale or renamed since ranking) are
/// skipped silently. An empty result is a valid outcome meaning "no relevant
/// context available" and must not be treated as an error.
pub fn assemble(ranked: &[RankedCandidate], corpus: &HashMap<String, String>) -> Vec<String> {
    ranked
        .iter()
        .filter_map(|candidate| corpus.get(&candidate.title).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, score: f64, rank: usize) -> RankedCandidate {
        RankedCandidate {
            index: rank - 1,
            title: title.to_string(),
            relevance_score: score,
            rank,
        }
    }

    fn corpus(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn preserves_ranked_order() {
        let corpus = corpus(&[("甲", "正文甲"), ("乙", "正文乙")]);
        let ranked = vec![candidate("乙", 0.9, 1), candidate("甲", 0.5, 2)];

        assert_eq!(assemble(&ranked, &corpus), vec!["正文乙", "正文甲"]);
    }

    #[test]
    fn skips_titles_absent_from_corpus() {
        let corpus = corpus(&[("甲", "正文甲")]);
        let ranked = vec![candidate("已删除", 0.9, 1), candidate("甲", 0.5, 2)];

        assert_eq!(assemble(&ranked, &corpus), vec!["正文甲"]);
    }

    #[test]
    fn empty_ranking_assembles_nothing() {
        let corpus = corpus(&[("甲", "正文甲")]);
        assert!(assemble(&[], &corpus).is_empty());
    }

    #[test]
    fn nothing_resolving_is_a_valid_empty_outcome() {
        let ranked = vec![candidate("甲", 0.9, 1)];
        assert!(assemble(&ranked, &HashMap::new()).is_empty());
    }
}
