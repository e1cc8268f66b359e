//! Announcements the player makes outside any command context.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::CreateEmbed;
use serenity::CreateMessage;
use tracing::instrument;

use crate::error::CocoError;
use crate::player::format_duration;
use crate::player::Track;
use crate::serenity;

/// Sink for player announcements. The playback loop hands over
/// structured track data; implementations pick the presentation.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A track just started playing.
    async fn now_playing(&self, track: &Track) -> Result<(), CocoError>;
    /// The queue ran dry and the session is closing.
    async fn queue_drained(&self, channel: serenity::ChannelId) -> Result<(), CocoError>;
}

/// [Notifier] that posts to the relevant text channels over the
/// discord http api.
pub struct ChannelNotifier {
    /// Standalone http handle, works without a command context.
    http: Arc<serenity::Http>,
}

impl ChannelNotifier {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    #[instrument(skip_all, fields(title = %track.title, channel = %track.channel))]
    async fn now_playing(&self, track: &Track) -> Result<(), CocoError> {
        let embed = track_embed(track).title("Now playing");
        let message = CreateMessage::new().embed(embed);

        // Announce in the channel the track was requested from.
        track.channel.send_message(&self.http, message).await?;
        Ok(())
    }

    async fn queue_drained(&self, channel: serenity::ChannelId) -> Result<(), CocoError> {
        let message =
            CreateMessage::new().content("Queue finished. Leaving the voice channel.");
        channel.send_message(&self.http, message).await?;
        Ok(())
    }
}

/// Embed with a track's metadata, shared by the announcements and the
/// `/now` command.
pub fn track_embed(track: &Track) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .description(format!("[{}]({})", track.title, track.url))
        .field("Requested by", format!("<@{}>", track.requester), true);

    if let Some(duration) = track.duration {
        embed = embed.field("Duration", format_duration(&duration), true);
    }
    if let Some(uploader) = track.uploader.as_deref() {
        embed = embed.field("Uploader", uploader, true);
    }
    if let Some(thumbnail) = track.thumbnail.as_deref() {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}
