//! Resolves play queries into playable streams with yt-dlp.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use tracing::instrument;

use crate::error::ResolveError;

/// The media extractor binary. Must be on the PATH.
const YTDLP_BIN: &str = "yt-dlp";

/// A resolved, playable stream and its metadata.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Title of the source.
    pub title: String,
    /// Canonical page url.
    pub url: String,
    /// Direct audio stream url.
    pub stream_url: String,
    /// Length of the source, absent for live streams.
    pub duration: Option<Duration>,
    /// Uploader or channel name.
    pub uploader: Option<String>,
    /// Thumbnail url.
    pub thumbnail: Option<String>,
}

/// Turns a play query into a [StreamInfo].
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Resolve a direct link or a free-text search.
    async fn resolve(&self, query: &str) -> Result<StreamInfo, ResolveError>;
}

/// [StreamResolver] backed by the yt-dlp CLI.
#[derive(Debug, Default)]
pub struct YtDlpResolver;

impl YtDlpResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StreamResolver for YtDlpResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, query: &str) -> Result<StreamInfo, ResolveError> {
        let target = resolve_target(query);

        debug!("running {YTDLP_BIN} for `{target}`");
        let output = tokio::process::Command::new(YTDLP_BIN)
            .args([
                "--no-warnings",
                "--ignore-config",
                "--no-playlist",
                "-f",
                "bestaudio/best",
                "-J",
                target.as_str(),
            ])
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::Backend(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8(output.stdout)?;
        parse_dump(&stdout, query)
    }
}

/// Links pass through untouched, anything else becomes a search.
fn resolve_target(query: &str) -> String {
    match url::Url::parse(query) {
        Ok(url) => url.to_string(),
        Err(_) => format!("ytsearch1:{query}"),
    }
}

/// The subset of a `yt-dlp -J` dump we care about.
#[derive(Debug, Deserialize)]
struct Dump {
    title: Option<String>,
    webpage_url: Option<String>,
    /// Stream url of the selected format.
    url: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    thumbnail: Option<String>,
    /// Searches dump a playlist wrapping the results.
    entries: Option<Vec<Dump>>,
}

/// Pick the playable entry out of a dump.
fn parse_dump(json: &str, query: &str) -> Result<StreamInfo, ResolveError> {
    let dump: Dump = serde_json::from_str(json)?;

    let entry = match dump.entries {
        Some(mut entries) => {
            if entries.is_empty() {
                return Err(ResolveError::NotFound(query.to_string()));
            }
            entries.remove(0)
        }
        None => dump,
    };

    let stream_url = entry
        .url
        .ok_or_else(|| ResolveError::Backend("dump is missing a stream url".to_string()))?;
    let title = entry.title.unwrap_or_else(|| "<unknown title>".to_string());
    let url = entry.webpage_url.unwrap_or_else(|| stream_url.clone());
    let duration = entry
        .duration
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64);

    Ok(StreamInfo {
        title,
        url,
        stream_url,
        duration,
        uploader: entry.uploader,
        thumbnail: entry.thumbnail,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn links_pass_through() {
        assert_eq!(
            resolve_target("https://youtu.be/dQw4w9WgXcQ"),
            "https://youtu.be/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn plain_text_becomes_a_search() {
        assert_eq!(
            resolve_target("never gonna give you up"),
            "ytsearch1:never gonna give you up"
        );
    }

    #[test]
    fn parses_a_single_video_dump() {
        let json = r#"{
            "title": "test video",
            "webpage_url": "https://example.com/watch?v=1",
            "url": "https://cdn.example.com/1.webm",
            "duration": 212.5,
            "uploader": "tester",
            "thumbnail": "https://example.com/1.jpg"
        }"#;

        let info = parse_dump(json, "test").unwrap();
        assert_eq!(info.title, "test video");
        assert_eq!(info.url, "https://example.com/watch?v=1");
        assert_eq!(info.stream_url, "https://cdn.example.com/1.webm");
        assert_eq!(info.duration, Some(Duration::from_secs_f64(212.5)));
        assert_eq!(info.uploader.as_deref(), Some("tester"));
    }

    #[test]
    fn takes_the_first_search_result() {
        let json = r#"{
            "title": "search results",
            "entries": [
                {
                    "title": "first hit",
                    "webpage_url": "https://example.com/watch?v=1",
                    "url": "https://cdn.example.com/1.webm"
                },
                {
                    "title": "second hit",
                    "webpage_url": "https://example.com/watch?v=2",
                    "url": "https://cdn.example.com/2.webm"
                }
            ]
        }"#;

        let info = parse_dump(json, "hit").unwrap();
        assert_eq!(info.title, "first hit");
        assert_eq!(info.duration, None);
    }

    #[test]
    fn an_empty_search_is_not_found() {
        let json = r#"{"title": "results", "entries": []}"#;
        let err = parse_dump(json, "no such song").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(q) if q == "no such song"));
    }

    #[test]
    fn a_dump_without_a_stream_url_is_rejected() {
        let json = r#"{"title": "broken", "webpage_url": "https://example.com"}"#;
        assert!(matches!(
            parse_dump(json, "broken").unwrap_err(),
            ResolveError::Backend(_)
        ));
    }

    #[test]
    fn garbage_output_is_rejected() {
        assert!(matches!(
            parse_dump("not json at all", "q").unwrap_err(),
            ResolveError::BadOutput(_)
        ));
    }

    #[test]
    fn nonsense_durations_are_dropped() {
        let json = r#"{"url": "https://cdn.example.com/1.webm", "duration": -3.0}"#;
        let info = parse_dump(json, "q").unwrap();
        assert_eq!(info.duration, None);
        // The page url falls back to the stream url.
        assert_eq!(info.url, "https://cdn.example.com/1.webm");
    }
}
