use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:v=)([a-zA-Z0-9_-]{11})",
        r"(?:youtu\.be/)([a-zA-Z0-9_-]{11})",
        r"(?:embed/)([a-zA-Z0-9_-]{11})",
        r"(?:shorts/)([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static BARE_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").ok());

/// Pull an 11-character video id out of a YouTube URL or a bare id.
pub fn extract_video_id(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    for pattern in URL_PATTERNS.iter() {
        if let Some(id) = pattern.captures(reference).and_then(|c| c.get(1)) {
            return Some(id.as_str().to_string());
        }
    }

    (*BARE_ID)
        .as_ref()
        .filter(|re| re.is_match(reference))
        .map(|_| reference.to_string())
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Watch link that starts playback at `seconds`
pub fn watch_url_at(video_id: &str, seconds: u64) -> String {
    format!("{}&t={}s", watch_url(video_id), seconds)
}
