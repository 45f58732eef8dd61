//! Relevance ranking of transcript segments.
//!
//! Every strategy implements [`Ranker`]: it takes the full segment list and a
//! query and returns at most `top_n` [`ScoredResult`]s, best first. Strategies
//! are looked up in a [`Rankers`] registry built from settings, so callers
//! never branch on the strategy themselves.

pub mod lexical;
pub mod normalize;
pub mod semantic;

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use lexical::LexicalRanker;
pub use normalize::{RankedEntry, parse_ranked_entries, strip_code_fences};
pub use semantic::SemanticRanker;

use crate::{
    error::{Result, TubeseekError},
    llm::{ChatClient, CompletionProvider},
    settings::RankingSettings,
    types::{ScoredResult, Segment},
};

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Lexical,
    Semantic,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Lexical => "lexical",
            Strategy::Semantic => "semantic",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" => Ok(Strategy::Lexical),
            "semantic" => Ok(Strategy::Semantic),
            other => Err(format!("unknown ranking strategy: {other}")),
        }
    }
}

#[async_trait]
pub trait Ranker: Send + Sync {
    fn strategy(&self) -> Strategy;

    async fn rank(&self, segments: &[Segment], query: &str, top_n: usize)
    -> Result<Vec<ScoredResult>>;
}

/// Strategy → ranker lookup.
#[derive(Clone, Default)]
pub struct Rankers {
    by_strategy: HashMap<Strategy, Arc<dyn Ranker>>,
}

impl Rankers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lexical ranking always, semantic ranking when a completion client can be built.
    pub fn from_settings(settings: &RankingSettings) -> Self {
        let rankers = Self::new().with(Arc::new(LexicalRanker));
        match ChatClient::from_settings(settings) {
            Ok(client) => rankers.with_completion(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "semantic ranking disabled");
                rankers
            }
        }
    }

    pub fn with(mut self, ranker: Arc<dyn Ranker>) -> Self {
        self.by_strategy.insert(ranker.strategy(), ranker);
        self
    }

    pub fn with_completion(self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.with(Arc::new(SemanticRanker::new(provider)))
    }

    pub fn get(&self, strategy: Strategy) -> Result<Arc<dyn Ranker>> {
        self.by_strategy
            .get(&strategy)
            .cloned()
            .ok_or(TubeseekError::StrategyUnavailable { strategy })
    }

    pub fn available(&self) -> Vec<Strategy> {
        let mut strategies: Vec<Strategy> = self.by_strategy.keys().copied().collect();
        strategies.sort_by_key(|s| s.name());
        strategies
    }
}
