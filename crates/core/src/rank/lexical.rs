use async_trait::async_trait;

use crate::{
    error::Result,
    rank::{Ranker, Strategy},
    types::{ScoredResult, Segment},
};

/// Term-frequency ranking: each query term scores one point per
/// non-overlapping, case-insensitive occurrence in the segment text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalRanker;

impl LexicalRanker {
    pub fn score(text: &str, terms: &[String]) -> usize {
        let text = text.to_lowercase();
        terms.iter().map(|term| text.matches(term.as_str()).count()).sum()
    }

    pub fn rank_sync(segments: &[Segment], query: &str, top_n: usize) -> Vec<ScoredResult> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<ScoredResult> = segments
            .iter()
            .enumerate()
            .filter_map(|(i, seg)| {
                let score = Self::score(&seg.text, &terms);
                (score > 0).then(|| ScoredResult::from_segment(i, seg, score as f64))
            })
            .collect();

        // stable: ties keep segment order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_n);
        results
    }
}

#[async_trait]
impl Ranker for LexicalRanker {
    fn strategy(&self) -> Strategy {
        Strategy::Lexical
    }

    async fn rank(
        &self,
        segments: &[Segment],
        query: &str,
        top_n: usize,
    ) -> Result<Vec<ScoredResult>> {
        Ok(Self::rank_sync(segments, query, top_n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: u64, text: &str) -> Segment {
        Segment {
            start,
            text: text.to_string(),
            source_fragments: Vec::new(),
        }
    }

    fn sample() -> Vec<Segment> {
        vec![seg(0, "hello world foo"), seg(30, "hello again")]
    }

    #[test]
    fn equal_scores_keep_segment_order() {
        let results = LexicalRanker::rank_sync(&sample(), "hello", 5);
        let got: Vec<(u64, f64)> = results.iter().map(|r| (r.start, r.score)).collect();
        assert_eq!(got, vec![(0, 1.0), (30, 1.0)]);
        assert_eq!(results[1].segment_index, 1);
        assert_eq!(results[1].text, "hello again");
        assert!(results.iter().all(|r| r.reason.is_none()));
    }

    #[test]
    fn no_match_is_an_empty_list() {
        assert!(LexicalRanker::rank_sync(&sample(), "zzz", 5).is_empty());
    }

    #[test]
    fn empty_query_matches_nothing() {
        assert!(LexicalRanker::rank_sync(&sample(), "", 5).is_empty());
        assert!(LexicalRanker::rank_sync(&sample(), "   \t", 5).is_empty());
    }

    #[test]
    fn higher_scores_come_first_and_top_n_is_respected() {
        let segments = vec![
            seg(0, "rust once"),
            seg(30, "Rust rust RUST"),
            seg(60, "nothing here"),
            seg(90, "rust and cargo, rust"),
        ];

        let results = LexicalRanker::rank_sync(&segments, "rust", 2);
        let got: Vec<(usize, f64)> = results.iter().map(|r| (r.segment_index, r.score)).collect();
        assert_eq!(got, vec![(1, 3.0), (3, 2.0)]);

        assert!(LexicalRanker::rank_sync(&segments, "rust", 0).is_empty());
    }

    #[test]
    fn terms_are_summed_and_counted_without_overlap() {
        let terms = vec!["aa".to_string()];
        assert_eq!(LexicalRanker::score("aaaa", &terms), 2);
        assert_eq!(LexicalRanker::score("aaa", &terms), 1);

        let terms = vec!["hello".to_string(), "foo".to_string()];
        assert_eq!(LexicalRanker::score("Hello world FOO foo", &terms), 3);
    }

    #[test]
    fn substrings_count_as_matches() {
        let results = LexicalRanker::rank_sync(&[seg(0, "unhelpful")], "help", 5);
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn ranking_is_deterministic() {
        let segments = vec![seg(0, "a b a"), seg(30, "b b"), seg(60, "a")];
        let first = LexicalRanker.rank(&segments, "a b", 5).await.unwrap();
        let second = LexicalRanker.rank(&segments, "a b", 5).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|r| r.segment_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }
}
