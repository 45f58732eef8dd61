use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    error::{Result, TubeseekError},
    format::format_manifest,
    llm::CompletionProvider,
    rank::{Ranker, Strategy, normalize::parse_ranked_entries},
    types::{ScoredResult, Segment},
};

/// Delegates relevance judgement to a language model.
pub struct SemanticRanker {
    provider: Arc<dyn CompletionProvider>,
}

impl SemanticRanker {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub fn build_prompt(segments: &[Segment], query: &str, top_n: usize) -> String {
        format!(
            "Here are numbered transcript segments from a video:\n\n\
             {manifest}\n\
             User query: \"{query}\"\n\n\
             Return the top {top_n} segments most semantically relevant to the query. \
             For each, give a relevance score from 1-10 and a short reason.\n\n\
             Reply ONLY with valid JSON, no markdown, no extra text:\n\
             {{\"results\": [{{\"index\": 0, \"score\": 8, \"reason\": \"...\"}}]}}",
            manifest = format_manifest(segments),
        )
    }

    /// Validate a raw reply against the segment list and order it by score.
    pub fn results_from_reply(
        segments: &[Segment],
        reply: &str,
        top_n: usize,
    ) -> Result<Vec<ScoredResult>> {
        let entries = parse_ranked_entries(reply).map_err(|e| TubeseekError::RankingFailed {
            reason: format!("unparsable ranking reply: {e}"),
        })?;

        let mut results: Vec<ScoredResult> = entries
            .into_iter()
            .take(top_n)
            .filter_map(|entry| {
                let index = usize::try_from(entry.index).ok()?;
                let Some(segment) = segments.get(index) else {
                    debug!(index, segments = segments.len(), "dropping out-of-range ranking entry");
                    return None;
                };
                Some(ScoredResult {
                    reason: entry.reason,
                    ..ScoredResult::from_segment(index, segment, entry.score)
                })
            })
            .collect();

        // stable: ties keep the model's order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(results)
    }
}

#[async_trait]
impl Ranker for SemanticRanker {
    fn strategy(&self) -> Strategy {
        Strategy::Semantic
    }

    async fn rank(
        &self,
        segments: &[Segment],
        query: &str,
        top_n: usize,
    ) -> Result<Vec<ScoredResult>> {
        if segments.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }

        let prompt = Self::build_prompt(segments, query, top_n);
        let reply = self
            .provider
            .complete(&prompt)
            .await
            .map_err(|e| match e {
                TubeseekError::RankingFailed { .. } => e,
                other => TubeseekError::RankingFailed {
                    reason: other.to_string(),
                },
            })?;

        let results = Self::results_from_reply(segments, &reply, top_n)?;
        info!(
            provider = self.provider.name(),
            results = results.len(),
            "semantic ranking complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct CannedProvider {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(reason.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|reason| TubeseekError::IoError(std::io::Error::other(reason)))
        }
    }

    fn seg(start: u64, text: &str) -> Segment {
        Segment {
            start,
            text: text.to_string(),
            source_fragments: Vec::new(),
        }
    }

    fn sample() -> Vec<Segment> {
        vec![
            seg(0, "hello world foo"),
            seg(30, "hello again"),
            seg(60, "cooking pasta"),
        ]
    }

    #[tokio::test]
    async fn prompt_carries_manifest_query_and_top_n() {
        let provider = CannedProvider::replying(r#"{"results": []}"#);
        let ranker = SemanticRanker::new(provider.clone());

        let results = ranker.rank(&sample(), "italian food", 3).await.unwrap();
        assert!(results.is_empty());

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[0] (0:00) hello world foo"));
        assert!(prompts[0].contains("[2] (1:00) cooking pasta"));
        assert!(prompts[0].contains("User query: \"italian food\""));
        assert!(prompts[0].contains("Return the top 3 segments"));
    }

    #[tokio::test]
    async fn results_are_sorted_by_score_with_stable_ties() {
        let reply = r#"{"results": [
            {"index": 0, "score": 5, "reason": "greeting"},
            {"index": 2, "score": 9, "reason": "food"},
            {"index": 1, "score": 5, "reason": "greeting again"}
        ]}"#;
        let ranker = SemanticRanker::new(CannedProvider::replying(reply));

        let results = ranker.rank(&sample(), "pasta", 5).await.unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.segment_index).collect();
        assert_eq!(order, vec![2, 0, 1]);
        assert_eq!(results[0].start, 60);
        assert_eq!(results[0].text, "cooking pasta");
        assert_eq!(results[0].reason.as_deref(), Some("food"));
    }

    #[tokio::test]
    async fn fenced_reply_matches_plain_reply() {
        let plain = r#"{"results": [{"index": 1, "score": 7, "reason": "r"}]}"#;
        let fenced = format!("```json\n{plain}\n```");

        let a = SemanticRanker::new(CannedProvider::replying(plain))
            .rank(&sample(), "q", 5)
            .await
            .unwrap();
        let b = SemanticRanker::new(CannedProvider::replying(&fenced))
            .rank(&sample(), "q", 5)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn out_of_range_entries_are_dropped() {
        let reply = r#"{"results": [
            {"index": 17, "score": 10, "reason": "hallucinated"},
            {"index": -1, "score": 9},
            {"index": 1, "score": 6, "reason": "ok"}
        ]}"#;
        let ranker = SemanticRanker::new(CannedProvider::replying(reply));

        let results = ranker.rank(&sample(), "q", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].segment_index, 1);
    }

    #[test]
    fn only_the_first_top_n_entries_are_considered() {
        let reply = r#"[{"index": 0, "score": 1}, {"index": 1, "score": 2}, {"index": 2, "score": 10}]"#;
        let results = SemanticRanker::results_from_reply(&sample(), reply, 2).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.segment_index).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[tokio::test]
    async fn malformed_reply_is_a_ranking_failure() {
        let ranker = SemanticRanker::new(CannedProvider::replying("I could not find anything."));
        let err = ranker.rank(&sample(), "q", 5).await.unwrap_err();
        assert!(matches!(err, TubeseekError::RankingFailed { .. }));
    }

    #[tokio::test]
    async fn provider_failure_is_a_ranking_failure() {
        let ranker = SemanticRanker::new(CannedProvider::failing("connection reset"));
        let err = ranker.rank(&sample(), "q", 5).await.unwrap_err();
        assert!(matches!(err, TubeseekError::RankingFailed { .. }));
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn nothing_to_rank_skips_the_request() {
        let provider = CannedProvider::replying("not json");
        let ranker = SemanticRanker::new(provider.clone());
        assert!(ranker.rank(&[], "q", 5).await.unwrap().is_empty());
        assert!(provider.prompts.lock().unwrap().is_empty());
    }
}
