//! YouTube video search and transcripts via yt-dlp.

use super::{Transcript, VideoHit, VideoSource};
use crate::error::{AdapterError, AdapterResult};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// YouTube video source backed by the `yt-dlp` binary.
pub struct YoutubeSource {
    video_id_regex: Regex,
    markup_regex: Regex,
    max_results: usize,
    language: String,
    temp_dir: PathBuf,
}

impl YoutubeSource {
    pub fn new(max_results: usize, language: &str, temp_dir: PathBuf) -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("valid video id regex");

        // Inline cue timing and styling tags in auto-generated subtitles
        let markup_regex = Regex::new(r"<[^>]*>").expect("valid markup regex");

        Self {
            video_id_regex,
            markup_regex,
            max_results: max_results.max(1),
            language: language.to_string(),
            temp_dir,
        }
    }

    /// Extract video ID from a YouTube URL or bare ID.
    fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        // Try group 1 (URL format) then group 2 (bare ID)
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    async fn run_ytdlp(&self, args: &[&str]) -> AdapterResult<String> {
        let output = tokio::process::Command::new("yt-dlp")
            .args(args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AdapterError::ToolNotFound("yt-dlp".to_string())
                } else {
                    AdapterError::Unavailable(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdapterError::Network(format!("yt-dlp failed: {}", stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Parse one line of `--dump-json --flat-playlist` output.
    fn parse_search_line(&self, line: &str) -> Option<VideoHit> {
        let json: serde_json::Value = serde_json::from_str(line).ok()?;

        let id = json["id"]
            .as_str()
            .or_else(|| json["url"].as_str())
            .map(|s| self.extract_video_id(s).unwrap_or_else(|| s.to_string()))?;

        Some(VideoHit {
            url: format!("https://www.youtube.com/watch?v={}", id),
            title: json["title"].as_str().unwrap_or("Unknown Title").to_string(),
            channel: json["channel"]
                .as_str()
                .or_else(|| json["uploader"].as_str())
                .map(|s| s.to_string()),
            duration_seconds: json["duration"].as_f64().map(|d| d as u32),
            id,
        })
    }

    /// Resolve a transcript query to a single video.
    async fn resolve_video(&self, query: &str) -> AdapterResult<VideoHit> {
        if let Some(id) = self.extract_video_id(query) {
            return Ok(VideoHit {
                url: format!("https://www.youtube.com/watch?v={}", id),
                title: id.clone(),
                channel: None,
                duration_seconds: None,
                id,
            });
        }

        self.search_videos(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::NotFound(format!("No video matches '{}'", query)))
    }

    /// Flatten WebVTT subtitles into plain text.
    ///
    /// Auto-generated captions repeat each line across rolling cues, so
    /// consecutive duplicates are dropped.
    fn vtt_to_text(&self, vtt: &str) -> String {
        let mut lines: Vec<String> = Vec::new();

        for raw in vtt.lines() {
            let line = raw.trim();
            if line.is_empty()
                || line == "WEBVTT"
                || line.contains("-->")
                || line.starts_with("Kind:")
                || line.starts_with("Language:")
                || line.starts_with("NOTE")
                || line.chars().all(|c| c.is_ascii_digit())
            {
                continue;
            }

            let text = self.markup_regex.replace_all(line, "").trim().to_string();
            if text.is_empty() || lines.last() == Some(&text) {
                continue;
            }
            lines.push(text);
        }

        lines.join(" ")
    }
}

/// First file in `dir` with the given extension.
fn find_with_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.to_string_lossy().ends_with(extension))
}

#[async_trait]
impl VideoSource for YoutubeSource {
    #[instrument(skip(self))]
    async fn search_videos(&self, query: &str) -> AdapterResult<Vec<VideoHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdapterError::InvalidArguments("Empty video search query".to_string()));
        }

        let target = format!("ytsearch{}:{}", self.max_results, query);
        let stdout = self
            .run_ytdlp(&["--dump-json", "--flat-playlist", "--no-warnings", &target])
            .await?;

        let hits: Vec<VideoHit> = stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| self.parse_search_line(l))
            .collect();

        debug!("Video search returned {} hits", hits.len());
        Ok(hits)
    }

    #[instrument(skip(self))]
    async fn get_transcript(&self, query: &str) -> AdapterResult<Transcript> {
        if query.trim().is_empty() {
            return Err(AdapterError::InvalidArguments("Empty transcript query".to_string()));
        }

        let video = self.resolve_video(query).await?;
        info!("Fetching transcript for {}", video.id);

        std::fs::create_dir_all(&self.temp_dir)
            .map_err(|e| AdapterError::Unavailable(format!("Cannot create temp dir: {}", e)))?;
        let work_dir = tempfile::Builder::new()
            .prefix("subs-")
            .tempdir_in(&self.temp_dir)
            .map_err(|e| AdapterError::Unavailable(format!("Cannot create temp dir: {}", e)))?;

        let template = work_dir.path().join("%(id)s.%(ext)s");
        let languages = format!("{}.*,{}", self.language, self.language);
        self.run_ytdlp(&[
            "--skip-download",
            "--write-subs",
            "--write-auto-subs",
            "--write-info-json",
            "--sub-format",
            "vtt",
            "--sub-langs",
            &languages,
            "--no-warnings",
            "--quiet",
            "--output",
            template.to_str().unwrap_or_default(),
            &video.url,
        ])
        .await?;

        let title = find_with_extension(work_dir.path(), ".info.json")
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
            .and_then(|json| json["title"].as_str().map(|s| s.to_string()))
            .unwrap_or(video.title);

        let subtitles = find_with_extension(work_dir.path(), ".vtt").ok_or_else(|| {
            AdapterError::NotFound(format!("No transcript available for video {}", video.id))
        })?;
        let vtt = std::fs::read_to_string(&subtitles)
            .map_err(|e| AdapterError::Malformed(format!("Unreadable subtitles: {}", e)))?;

        let text = self.vtt_to_text(&vtt);
        if text.is_empty() {
            return Err(AdapterError::NotFound(format!(
                "Transcript for video {} is empty",
                video.id
            )));
        }

        Ok(Transcript {
            video_id: video.id,
            title,
            url: video.url,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> YoutubeSource {
        YoutubeSource::new(5, "en", std::env::temp_dir())
    }

    #[test]
    fn test_extract_video_id() {
        let source = source();

        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );

        // Topics are not IDs
        assert_eq!(source.extract_video_id("interest rate cuts"), None);
        assert_eq!(source.extract_video_id(""), None);
    }

    #[test]
    fn test_parse_search_line() {
        let line = r#"{"id": "dQw4w9WgXcQ", "title": "Fed explains rate cuts", "channel": "Econ", "duration": 612.0}"#;
        let hit = source().parse_search_line(line).unwrap();

        assert_eq!(hit.id, "dQw4w9WgXcQ");
        assert_eq!(hit.title, "Fed explains rate cuts");
        assert_eq!(hit.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(hit.channel.as_deref(), Some("Econ"));
        assert_eq!(hit.duration_seconds, Some(612));

        assert!(source().parse_search_line("not json").is_none());
    }

    #[test]
    fn test_vtt_to_text_strips_cues_and_rolling_duplicates() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n\
            1\n00:00:00.000 --> 00:00:02.000\nwelcome<00:00:01.000><c> back</c>\n\n\
            2\n00:00:02.000 --> 00:00:04.000\nwelcome back\ntoday we talk rates\n\n\
            3\n00:00:04.000 --> 00:00:06.000\ntoday we talk rates\n";

        assert_eq!(source().vtt_to_text(vtt), "welcome back today we talk rates");
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_without_running_ytdlp() {
        let err = source().search_videos("  ").await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidArguments(_)));
    }
}
