//! Tubeseek Core Library
//!
//! Turns a YouTube transcript into fixed-width time segments and ranks those
//! segments against free-text queries, lexically or with a language model.

pub mod error;
pub mod format;
pub mod library;
pub mod llm;
pub mod provider;
pub mod rank;
pub mod segmenter;
pub mod settings;
pub mod store;
pub mod transcript;
pub mod types;
pub mod video_ref;

// Re-export commonly used items at crate root
pub use error::{ErrorKind, Result, TubeseekError};
pub use format::{format_hits_readable, format_manifest, format_segments_with_timestamps, format_time};
pub use library::Library;
pub use llm::{ChatClient, CompletionProvider};
pub use provider::{Provider, ProviderConfig, ProviderError};
pub use rank::{LexicalRanker, Ranker, Rankers, SemanticRanker, Strategy};
pub use segmenter::{DEFAULT_BUCKET_WIDTH, segment};
pub use settings::{Settings, load_settings, settings_path};
pub use store::{CachedVideo, EvictionPolicy, MemoryBackend, SegmentBackend, VideoStore};
pub use transcript::{JsonFileTranscripts, TranscriptProvider, YtDlpTranscripts};
pub use types::{ScoredResult, SearchHit, SearchOutcome, Segment, TranscriptFragment, VideoSummary};
pub use video_ref::{extract_video_id, thumbnail_url, watch_url, watch_url_at};
