use std::{
    collections::HashMap,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use tracing::debug;

use crate::types::Segment;

/// A video's complete segment list as published to the store.
#[derive(Debug)]
pub struct CachedVideo {
    pub video_id: String,
    pub segments: Vec<Segment>,
    pub inserted_at: Instant,
    last_used: AtomicU64,
}

impl CachedVideo {
    fn new(video_id: String, segments: Vec<Segment>, tick: u64) -> Self {
        Self {
            video_id,
            segments,
            inserted_at: Instant::now(),
            last_used: AtomicU64::new(tick),
        }
    }

    pub fn last_used(&self) -> u64 {
        self.last_used.load(Ordering::Relaxed)
    }

    fn touch(&self, tick: u64) {
        self.last_used.fetch_max(tick, Ordering::Relaxed);
    }
}

/// Storage behind a [`VideoStore`]. Locking is done by the store.
pub trait SegmentBackend: Send + Sync {
    fn get(&self, video_id: &str) -> Option<Arc<CachedVideo>>;
    fn put(&mut self, entry: Arc<CachedVideo>) -> Option<Arc<CachedVideo>>;
    fn remove(&mut self, video_id: &str) -> Option<Arc<CachedVideo>>;
    fn entries(&self) -> Vec<Arc<CachedVideo>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    videos: HashMap<String, Arc<CachedVideo>>,
}

impl SegmentBackend for MemoryBackend {
    fn get(&self, video_id: &str) -> Option<Arc<CachedVideo>> {
        self.videos.get(video_id).cloned()
    }

    fn put(&mut self, entry: Arc<CachedVideo>) -> Option<Arc<CachedVideo>> {
        self.videos.insert(entry.video_id.clone(), entry)
    }

    fn remove(&mut self, video_id: &str) -> Option<Arc<CachedVideo>> {
        self.videos.remove(video_id)
    }

    fn entries(&self) -> Vec<Arc<CachedVideo>> {
        self.videos.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.videos.len()
    }
}

/// When entries leave the store. The default keeps everything for the life
/// of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Least recently used entries are dropped beyond this count
    pub max_entries: Option<usize>,
    pub time_to_live: Option<Duration>,
}

impl EvictionPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn max_entries(max: usize) -> Self {
        Self {
            max_entries: Some(max),
            ..Self::default()
        }
    }

    pub fn time_to_live(ttl: Duration) -> Self {
        Self {
            time_to_live: Some(ttl),
            ..Self::default()
        }
    }

    fn is_expired(&self, entry: &CachedVideo, now: Instant) -> bool {
        self.time_to_live
            .is_some_and(|ttl| now.saturating_duration_since(entry.inserted_at) >= ttl)
    }
}

/// Video id → segment list cache shared by all requests.
///
/// Readers share a read lock; inserts take the write lock and publish a
/// complete [`CachedVideo`], so a partially built list is never visible.
pub struct VideoStore {
    backend: RwLock<Box<dyn SegmentBackend>>,
    policy: EvictionPolicy,
    clock: AtomicU64,
}

impl Default for VideoStore {
    fn default() -> Self {
        Self::in_memory(EvictionPolicy::none())
    }
}

impl VideoStore {
    pub fn new(backend: Box<dyn SegmentBackend>, policy: EvictionPolicy) -> Self {
        Self {
            backend: RwLock::new(backend),
            policy,
            clock: AtomicU64::new(0),
        }
    }

    pub fn in_memory(policy: EvictionPolicy) -> Self {
        Self::new(Box::new(MemoryBackend::default()), policy)
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self, video_id: &str) -> Option<Arc<CachedVideo>> {
        let backend = self.backend.read().unwrap_or_else(PoisonError::into_inner);
        let entry = backend.get(video_id)?;
        if self.policy.is_expired(&entry, Instant::now()) {
            return None;
        }
        entry.touch(self.tick());
        Some(entry)
    }

    pub fn contains(&self, video_id: &str) -> bool {
        let backend = self.backend.read().unwrap_or_else(PoisonError::into_inner);
        backend
            .get(video_id)
            .is_some_and(|entry| !self.policy.is_expired(&entry, Instant::now()))
    }

    /// Publish a video's segments, replacing any previous list wholesale.
    pub fn insert(&self, video_id: impl Into<String>, segments: Vec<Segment>) -> Arc<CachedVideo> {
        let entry = Arc::new(CachedVideo::new(video_id.into(), segments, self.tick()));

        let mut backend = self.backend.write().unwrap_or_else(PoisonError::into_inner);
        self.purge_expired(&mut **backend);
        backend.put(Arc::clone(&entry));
        self.evict_over_capacity(&mut **backend, &entry.video_id);

        debug!(
            video_id = %entry.video_id,
            segments = entry.segments.len(),
            stored = backend.len(),
            "video stored"
        );
        entry
    }

    pub fn remove(&self, video_id: &str) -> Option<Arc<CachedVideo>> {
        let mut backend = self.backend.write().unwrap_or_else(PoisonError::into_inner);
        backend.remove(video_id)
    }

    pub fn len(&self) -> usize {
        let backend = self.backend.read().unwrap_or_else(PoisonError::into_inner);
        if self.policy.time_to_live.is_none() {
            return backend.len();
        }
        let now = Instant::now();
        backend
            .entries()
            .iter()
            .filter(|entry| !self.policy.is_expired(entry, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn video_ids(&self) -> Vec<String> {
        let backend = self.backend.read().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let mut ids: Vec<String> = backend
            .entries()
            .iter()
            .filter(|entry| !self.policy.is_expired(entry, now))
            .map(|entry| entry.video_id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn purge_expired(&self, backend: &mut dyn SegmentBackend) {
        if self.policy.time_to_live.is_none() {
            return;
        }
        let now = Instant::now();
        for entry in backend.entries() {
            if self.policy.is_expired(&entry, now) {
                debug!(video_id = %entry.video_id, "expired video evicted");
                backend.remove(&entry.video_id);
            }
        }
    }

    fn evict_over_capacity(&self, backend: &mut dyn SegmentBackend, keep: &str) {
        let Some(max) = self.policy.max_entries else {
            return;
        };

        let mut entries = backend.entries();
        if entries.len() <= max {
            return;
        }
        entries.retain(|entry| entry.video_id != keep);
        entries.sort_by_key(|entry| entry.last_used());

        let excess = backend.len() - max.max(1);
        for entry in entries.into_iter().take(excess) {
            debug!(video_id = %entry.video_id, "least recently used video evicted");
            backend.remove(&entry.video_id);
        }
    }
}
