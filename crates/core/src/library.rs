//! Load-and-search façade over the segmenter, the store and the rankers.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    error::{Result, TubeseekError},
    format::format_time,
    rank::{Rankers, Strategy},
    segmenter::{DEFAULT_BUCKET_WIDTH, segment},
    settings::Settings,
    store::{CachedVideo, VideoStore},
    transcript::{TranscriptProvider, YtDlpTranscripts},
    types::{SearchHit, SearchOutcome, VideoSummary},
    video_ref::{extract_video_id, thumbnail_url, watch_url_at},
};

pub struct Library {
    transcripts: Arc<dyn TranscriptProvider>,
    store: Arc<VideoStore>,
    rankers: Rankers,
    bucket_width: u64,
}

impl Library {
    pub fn new(
        transcripts: Arc<dyn TranscriptProvider>,
        store: Arc<VideoStore>,
        rankers: Rankers,
    ) -> Self {
        Self {
            transcripts,
            store,
            rankers,
            bucket_width: DEFAULT_BUCKET_WIDTH,
        }
    }

    /// Wire up yt-dlp captions, an in-memory store and the configured rankers.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Arc::new(YtDlpTranscripts::new(&settings.transcripts)),
            Arc::new(VideoStore::in_memory(settings.cache.eviction_policy())),
            Rankers::from_settings(&settings.ranking),
        )
        .with_bucket_width(settings.segmenter.bucket_width_secs)
    }

    pub fn with_transcripts(mut self, transcripts: Arc<dyn TranscriptProvider>) -> Self {
        self.transcripts = transcripts;
        self
    }

    pub fn with_bucket_width(mut self, bucket_width: u64) -> Self {
        self.bucket_width = bucket_width.max(1);
        self
    }

    pub fn store(&self) -> &VideoStore {
        &self.store
    }

    pub fn rankers(&self) -> &Rankers {
        &self.rankers
    }

    /// Load a video from a URL or id, fetching its transcript unless cached.
    pub async fn load(&self, reference: &str) -> Result<VideoSummary> {
        let video_id =
            extract_video_id(reference).ok_or_else(|| TubeseekError::InvalidVideoReference {
                reference: reference.trim().to_string(),
            })?;
        self.load_id(&video_id).await
    }

    #[instrument(skip(self))]
    pub async fn load_id(&self, video_id: &str) -> Result<VideoSummary> {
        if let Some(entry) = self.store.get(video_id) {
            return Ok(summary(&entry, true));
        }

        let fragments = self.transcripts.fetch(video_id).await.map_err(|e| match e {
            TubeseekError::TranscriptUnavailable { .. } => e,
            other => TubeseekError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                reason: other.to_string(),
            },
        })?;

        let segments = segment(&fragments, self.bucket_width);
        let entry = self.store.insert(video_id, segments);
        info!(segments = entry.segments.len(), "video loaded");

        Ok(summary(&entry, false))
    }

    /// Segments of a loaded video.
    pub fn segments(&self, video_id: &str) -> Result<Arc<CachedVideo>> {
        self.store
            .get(video_id)
            .ok_or_else(|| TubeseekError::VideoNotLoaded {
                video_id: video_id.to_string(),
            })
    }

    #[instrument(skip(self))]
    pub async fn search(
        &self,
        video_id: &str,
        query: &str,
        strategy: Strategy,
        top_n: usize,
    ) -> Result<SearchOutcome> {
        let video_id = video_id.trim();
        let query = query.trim();
        if query.is_empty() {
            return Err(TubeseekError::EmptyQuery);
        }

        let entry = self.segments(video_id)?;
        let ranker = self.rankers.get(strategy)?;

        let results = ranker
            .rank(&entry.segments, query, top_n)
            .await
            .inspect_err(|e| warn!(error = %e, "search failed"))?;

        info!(results = results.len(), "search complete");
        if results.is_empty() {
            return Ok(SearchOutcome::NoMatches);
        }

        let thumbnail = thumbnail_url(video_id);
        Ok(SearchOutcome::Matches(
            results
                .into_iter()
                .map(|result| SearchHit {
                    time: format_time(result.start),
                    url: watch_url_at(video_id, result.start),
                    video_id: video_id.to_string(),
                    thumbnail: thumbnail.clone(),
                    result,
                })
                .collect(),
        ))
    }
}

fn summary(entry: &CachedVideo, cached: bool) -> VideoSummary {
    VideoSummary {
        video_id: entry.video_id.clone(),
        thumbnail: thumbnail_url(&entry.video_id),
        segment_count: entry.segments.len(),
        cached,
    }
}
