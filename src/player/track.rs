//! Track values and their display.

use std::fmt::Display;
use std::time::Duration;

use crate::resolver::StreamInfo;
use crate::serenity;

/// A resolved, playable track plus who asked for it.
///
/// Immutable once built. The queue owns it until the playback loop
/// moves it into the session's current slot.
#[derive(Debug, Clone)]
pub struct Track {
    /// Title of the track.
    pub title: String,
    /// Canonical page url.
    pub url: String,
    /// Direct audio stream url. May expire; replays reuse it as-is.
    pub stream_url: String,
    /// Length of the track, absent for live streams.
    pub duration: Option<Duration>,
    /// Name of the uploading channel.
    pub uploader: Option<String>,
    /// Thumbnail url.
    pub thumbnail: Option<String>,
    /// Who requested the track.
    pub requester: serenity::UserId,
    /// Text channel the request came from.
    pub channel: serenity::ChannelId,
}

impl Track {
    /// Build a [Track] from a resolved stream and its request context.
    pub fn new(
        info: StreamInfo,
        requester: serenity::UserId,
        channel: serenity::ChannelId,
    ) -> Self {
        Self {
            title: info.title,
            url: info.url,
            stream_url: info.stream_url,
            duration: info.duration,
            uploader: info.uploader,
            thumbnail: info.thumbnail,
            requester,
            channel,
        }
    }
}

impl Display for Track {
    /// Markdown format: `[{title} {duration} {uploader}]({url})`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let title = &self.title;
        let duration = match &self.duration {
            None => String::new(),
            Some(dur) => format_duration(dur),
        };
        let uploader = self.uploader.as_deref().unwrap_or_default();
        let url = &self.url;

        write!(f, "[{title} {duration} {uploader}]({url})")
    }
}

/// Helper function to format a duration.
pub fn format_duration(dur: &Duration) -> String {
    let total_secs = dur.as_secs();

    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours != 0 {
        format!("[{hours:02}h:{mins:02}m:{secs:02}s]")
    } else {
        format!("[{mins:02}m:{secs:02}s]")
    }
}
