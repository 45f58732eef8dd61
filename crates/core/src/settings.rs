//! Layered configuration.
//!
//! Compiled defaults, then `<config dir>/tubeseek/settings.json`, then
//! `TUBESEEK_*` environment variables. Command-line flags are applied by the
//! binary on top of the result.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::Result,
    provider::Provider,
    rank::{DEFAULT_TOP_N, Strategy},
    segmenter::DEFAULT_BUCKET_WIDTH,
    store::EvictionPolicy,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub segmenter: SegmenterSettings,
    pub search: SearchSettings,
    pub ranking: RankingSettings,
    pub transcripts: TranscriptSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterSettings {
    pub bucket_width_secs: u64,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            bucket_width_secs: DEFAULT_BUCKET_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub top_n: usize,
    pub strategy: Strategy,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            strategy: Strategy::Lexical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    pub provider: Provider,
    /// Overrides the provider's default model
    pub model: Option<String>,
    /// Overrides the provider's default endpoint
    pub api_url: Option<String>,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Anthropic,
            model: None,
            api_url: None,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    pub yt_dlp_bin: String,
    /// Passed to `yt-dlp --sub-langs`
    pub languages: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            yt_dlp_bin: "yt-dlp".to_string(),
            languages: "en.*,en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_videos: Option<usize>,
    pub ttl_secs: Option<u64>,
}

impl CacheSettings {
    pub fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy {
            max_entries: self.max_videos,
            time_to_live: self.ttl_secs.map(Duration::from_secs),
        }
    }
}

pub fn settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tubeseek")
        .join("settings.json")
}

/// Load from the default path with environment overrides applied.
pub fn load_settings() -> Result<Settings> {
    load_settings_from_path(&settings_path())
}

pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let mut settings = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded settings file");
        serde_json::from_str(&content)?
    } else {
        Settings::default()
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        warn!(key, value, "ignoring unparsable environment override");
    }
    parsed
}

/// Apply `TUBESEEK_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = var("TUBESEEK_TOP_N").and_then(|v| parse_var("TUBESEEK_TOP_N", &v)) {
        settings.search.top_n = v;
    }
    if let Some(v) = var("TUBESEEK_STRATEGY").and_then(|v| parse_var("TUBESEEK_STRATEGY", &v)) {
        settings.search.strategy = v;
    }
    if let Some(v) = var("TUBESEEK_PROVIDER").and_then(|v| parse_var("TUBESEEK_PROVIDER", &v)) {
        settings.ranking.provider = v;
    }
    if let Some(v) = var("TUBESEEK_MODEL") {
        settings.ranking.model = Some(v);
    }
    if let Some(v) = var("TUBESEEK_API_URL") {
        settings.ranking.api_url = Some(v);
    }
    if let Some(v) = var("TUBESEEK_BUCKET_WIDTH")
        .and_then(|v| parse_var::<u64>("TUBESEEK_BUCKET_WIDTH", &v))
        .filter(|w| *w > 0)
    {
        settings.segmenter.bucket_width_secs = v;
    }
    if let Some(v) =
        var("TUBESEEK_CACHE_MAX_VIDEOS").and_then(|v| parse_var("TUBESEEK_CACHE_MAX_VIDEOS", &v))
    {
        settings.cache.max_videos = Some(v);
    }
    if let Some(v) =
        var("TUBESEEK_CACHE_TTL_SECS").and_then(|v| parse_var("TUBESEEK_CACHE_TTL_SECS", &v))
    {
        settings.cache.ttl_secs = Some(v);
    }
    if let Some(v) = var("TUBESEEK_YT_DLP") {
        settings.transcripts.yt_dlp_bin = v;
    }
}
