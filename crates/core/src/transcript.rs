use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{fs, process::Command};
use tracing::{debug, info};

use crate::{
    error::{Result, TubeseekError},
    settings::TranscriptSettings,
    types::TranscriptFragment,
    video_ref::watch_url,
};

/// Source of timestamped captions for a video.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptFragment>>;
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a YouTube `json3` caption track into fragments, in track order.
pub fn parse_json3(content: &str) -> Result<Vec<TranscriptFragment>> {
    let track: Json3 = serde_json::from_str(content)?;

    Ok(track
        .events
        .into_iter()
        .filter_map(|event| {
            let raw: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then(|| TranscriptFragment {
                start: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms as f64 / 1000.0,
                text,
            })
        })
        .collect())
}

/// Find a downloaded caption track in a directory
fn find_caption_file(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;

    entries
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().is_some_and(|ext| ext == "json3"))
}

/// Fetches captions (manual or automatic) with `yt-dlp`.
pub struct YtDlpTranscripts {
    bin: String,
    languages: String,
    scratch_root: PathBuf,
}

impl YtDlpTranscripts {
    pub fn new(settings: &TranscriptSettings) -> Self {
        Self {
            bin: settings.yt_dlp_bin.clone(),
            languages: settings.languages.clone(),
            scratch_root: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("tubeseek"),
        }
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    async fn download_captions(&self, video_id: &str, dir: &Path) -> Result<PathBuf> {
        let output_template = dir.join("captions.%(ext)s");
        let output = Command::new(&self.bin)
            .arg(watch_url(video_id))
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs")
            .arg(&self.languages)
            .arg("--sub-format")
            .arg("json3")
            .arg("--no-playlist")
            .arg("-o")
            .arg(&output_template)
            .output()
            .await
            .map_err(|e| TubeseekError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                reason: format!("could not run {}: {}", self.bin, e),
            })?;

        if !output.status.success() {
            return Err(TubeseekError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        find_caption_file(dir).ok_or_else(|| TubeseekError::TranscriptUnavailable {
            video_id: video_id.to_string(),
            reason: "no captions available".to_string(),
        })
    }
}

#[async_trait]
impl TranscriptProvider for YtDlpTranscripts {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptFragment>> {
        fs::create_dir_all(&self.scratch_root).await?;
        // per call: fetches of the same video may overlap
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{video_id}-"))
            .tempdir_in(&self.scratch_root)?;

        let result = match self.download_captions(video_id, scratch.path()).await {
            Ok(path) => {
                debug!(path = %path.display(), "caption track downloaded");
                match fs::read_to_string(&path).await {
                    Ok(content) => parse_json3(&content),
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e),
        };

        let dir = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            debug!(error = %e, dir = %dir.display(), "could not remove caption scratch dir");
        }

        let fragments = result?;
        info!(video_id, fragments = fragments.len(), "transcript fetched");
        Ok(fragments)
    }
}

/// Reads a JSON array of `{start, duration, text}` fragments from disk.
pub struct JsonFileTranscripts {
    path: PathBuf,
}

impl JsonFileTranscripts {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TranscriptProvider for JsonFileTranscripts {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptFragment>> {
        let json_content = fs::read_to_string(&self.path).await?;
        let fragments: Vec<TranscriptFragment> = serde_json::from_str(&json_content)?;
        info!(
            video_id,
            path = %self.path.display(),
            fragments = fragments.len(),
            "transcript loaded from file"
        );
        Ok(fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = r#"{
        "wireMagic": "pb3",
        "events": [
            {"tStartMs": 0, "dDurationMs": 120000, "id": 1, "wpWinPosId": 1},
            {"tStartMs": 1200, "dDurationMs": 3400, "segs": [{"utf8": "hello"}, {"utf8": " world", "tOffsetMs": 400}]},
            {"tStartMs": 4600, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
            {"tStartMs": 15000, "dDurationMs": 2000, "segs": [{"utf8": "foo\nbar"}]}
        ]
    }"#;

    #[test]
    fn parses_json3_events_into_fragments() {
        let fragments = parse_json3(TRACK).unwrap();
        assert_eq!(
            fragments,
            vec![
                TranscriptFragment::new(1.2, 3.4, "hello world"),
                TranscriptFragment::new(15.0, 2.0, "foo bar"),
            ]
        );
    }

    #[test]
    fn rejects_non_json_tracks() {
        assert!(parse_json3("WEBVTT\n\n00:00.000 --> 00:01.000\nhi").is_err());
    }

    #[test]
    fn finds_caption_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_caption_file(dir.path()).is_none());

        std::fs::write(dir.path().join("captions.en.json3"), TRACK).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let found = find_caption_file(dir.path()).unwrap();
        assert!(found.ends_with("captions.en.json3"));
    }

    #[tokio::test]
    async fn json_file_provider_reads_fragments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.json");
        std::fs::write(
            &path,
            r#"[{"start": 0.0, "duration": 2.5, "text": "hello world"}, {"start": 35.0, "text": "hello again"}]"#,
        )
        .unwrap();

        let fragments = JsonFileTranscripts::new(&path)
            .fetch("dQw4w9WgXcQ")
            .await
            .unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].duration, 0.0);
        assert_eq!(fragments[1].text, "hello again");
    }

    #[tokio::test]
    async fn missing_binary_is_a_fetch_failure_and_scratch_is_cleaned() {
        let scratch = tempfile::tempdir().unwrap();
        let settings = TranscriptSettings {
            yt_dlp_bin: "definitely-not-yt-dlp-binary".into(),
            ..TranscriptSettings::default()
        };
        let provider = YtDlpTranscripts::new(&settings).with_scratch_root(scratch.path());

        let err = provider.fetch("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, TubeseekError::TranscriptUnavailable { .. }));
        assert!(std::fs::read_dir(scratch.path()).unwrap().next().is_none());
    }

    /// Stand-in for yt-dlp that writes a caption track next to the `-o` template.
    #[cfg(unix)]
    fn fake_yt_dlp(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-yt-dlp");
        std::fs::write(
            &script,
            r#"#!/bin/sh
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
sleep 0.2
printf '%s' '{"events":[{"tStartMs":0,"dDurationMs":1000,"segs":[{"utf8":"hi"}]}]}' > "$(dirname "$out")/captions.en.json3"
"#,
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_fetches_of_one_video_do_not_collide() {
        let bin_dir = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let settings = TranscriptSettings {
            yt_dlp_bin: fake_yt_dlp(bin_dir.path()).display().to_string(),
            ..TranscriptSettings::default()
        };
        let provider = std::sync::Arc::new(
            YtDlpTranscripts::new(&settings).with_scratch_root(scratch.path()),
        );

        let mut fetches = tokio::task::JoinSet::new();
        for _ in 0..6 {
            let provider = provider.clone();
            fetches.spawn(async move { provider.fetch("dQw4w9WgXcQ").await });
        }

        while let Some(joined) = fetches.join_next().await {
            let fragments = joined.unwrap().unwrap();
            assert_eq!(fragments, vec![TranscriptFragment::new(0.0, 1.0, "hi")]);
        }
        assert!(std::fs::read_dir(scratch.path()).unwrap().next().is_none());
    }
}
