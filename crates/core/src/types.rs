use serde::{Deserialize, Serialize};

/// A single timestamped caption as delivered by a transcript provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub start: f64,
    #[serde(default)]
    pub duration: f64,
    pub text: String,
}

impl TranscriptFragment {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }
}

/// All fragments that fall into one fixed-width time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Bucket floor in whole seconds, always a multiple of the bucket width.
    pub start: u64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_fragments: Vec<TranscriptFragment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub segment_index: usize,
    pub start: u64,
    pub text: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ScoredResult {
    pub fn from_segment(segment_index: usize, segment: &Segment, score: f64) -> Self {
        Self {
            segment_index,
            start: segment.start,
            text: segment.text.clone(),
            score,
            reason: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub thumbnail: String,
    pub segment_count: usize,
    /// True when the segments were already in the store.
    pub cached: bool,
}

/// A ranked result annotated for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub result: ScoredResult,
    pub time: String,
    pub video_id: String,
    pub thumbnail: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Matches(Vec<SearchHit>),
    NoMatches,
}

impl SearchOutcome {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Matches(hits) => hits,
            SearchOutcome::NoMatches => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SearchOutcome::NoMatches)
    }
}
